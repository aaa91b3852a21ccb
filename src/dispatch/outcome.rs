//! Per-operation dispatch outcomes

use std::collections::BTreeMap;

use serde::Serialize;

use super::request::Channel;
use super::transport::Reply;

/// Status reported for a denied device
pub const DENIED_STATUS: u16 = 400;
/// Payload reported for a denied device
pub const DENIED_PAYLOAD: &str = "cant perform action";
/// Status reported when the device could not be reached
pub const TRANSPORT_FAILURE_STATUS: u16 = 502;
/// Status reported when the device did not answer in time
pub const TIMEOUT_STATUS: u16 = 504;

/// How an operation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    /// The device answered; `status` is its HTTP status
    Completed,
    /// The printer's state does not allow the action; nothing was sent
    Denied,
    Failed,
    TimedOut,
}

/// Result of one scheduled operation or denial
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    /// Owning device; absent only for the farm-wide finish outcome
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<Channel>,
    pub status: u16,
    pub payload: String,
    pub kind: OutcomeKind,
}

impl Outcome {
    #[must_use]
    pub fn denied(device: &str) -> Self {
        Self {
            device: Some(device.to_string()),
            channel: None,
            status: DENIED_STATUS,
            payload: DENIED_PAYLOAD.to_string(),
            kind: OutcomeKind::Denied,
        }
    }

    #[must_use]
    pub fn completed(device: &str, channel: Option<Channel>, reply: Reply) -> Self {
        Self {
            device: Some(device.to_string()),
            channel,
            status: reply.status,
            payload: reply.body,
            kind: OutcomeKind::Completed,
        }
    }

    #[must_use]
    pub fn failed(device: &str, channel: Option<Channel>, diagnostic: impl Into<String>) -> Self {
        Self {
            device: Some(device.to_string()),
            channel,
            status: TRANSPORT_FAILURE_STATUS,
            payload: diagnostic.into(),
            kind: OutcomeKind::Failed,
        }
    }

    #[must_use]
    pub fn timed_out(device: &str, channel: Option<Channel>, diagnostic: impl Into<String>) -> Self {
        Self {
            device: Some(device.to_string()),
            channel,
            status: TIMEOUT_STATUS,
            payload: diagnostic.into(),
            kind: OutcomeKind::TimedOut,
        }
    }

    /// The single outcome returned by the finish action
    #[must_use]
    pub const fn finished() -> Self {
        Self {
            device: None,
            channel: None,
            status: 200,
            payload: String::new(),
            kind: OutcomeKind::Completed,
        }
    }

    /// Whether the device accepted the request
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.kind == OutcomeKind::Completed && (200..300).contains(&self.status)
    }
}

/// Key identifying an outcome by device and heater channel
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OutcomeKey {
    pub device: Option<String>,
    pub channel: Option<Channel>,
}

/// Index outcomes by owning device and channel
#[must_use]
pub fn keyed(outcomes: &[Outcome]) -> BTreeMap<OutcomeKey, &Outcome> {
    outcomes
        .iter()
        .map(|outcome| {
            let key = OutcomeKey {
                device: outcome.device.clone(),
                channel: outcome.channel,
            };
            (key, outcome)
        })
        .collect()
}

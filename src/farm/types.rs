//! Farm device types

use std::fmt;

use serde::{Deserialize, Serialize};

/// Connection record for one printer
///
/// Supplied by configuration and never mutated during a dispatch.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub id: String,
    pub address: String,
    pub port: u16,
    pub api_key: String,
}

impl DeviceRecord {
    /// Build the absolute URL of a control route on this device
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}:{}{path}", self.address, self.port)
    }
}

// Credentials stay out of logs
impl fmt::Debug for DeviceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceRecord")
            .field("id", &self.id)
            .field("address", &self.address)
            .field("port", &self.port)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Last-known operating state of a printer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceState {
    Idle,
    Printing,
    Paused,
    Pausing,
    Cancelling,
    Connecting,
    Offline,
    Error,
    Unknown,
}

impl DeviceState {
    /// Every state, including `Unknown`
    pub const ALL: [Self; 9] = [
        Self::Idle,
        Self::Printing,
        Self::Paused,
        Self::Pausing,
        Self::Cancelling,
        Self::Connecting,
        Self::Offline,
        Self::Error,
        Self::Unknown,
    ];

    /// Parse the state text a printer reports
    ///
    /// Unrecognised text maps to `Unknown`.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        let lower = text.trim().to_lowercase();
        match lower.as_str() {
            "operational" | "ready" | "idle" => Self::Idle,
            "printing" | "printing from sd" | "sending file to sd" => Self::Printing,
            "paused" => Self::Paused,
            "pausing" => Self::Pausing,
            "cancelling" => Self::Cancelling,
            "connecting" | "opening serial connection" | "detecting serial connection" => {
                Self::Connecting
            }
            "offline" | "closed" => Self::Offline,
            _ if lower.contains("error") => Self::Error,
            _ => Self::Unknown,
        }
    }

    /// Lowercase name used in logs and JSON
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Printing => "printing",
            Self::Paused => "paused",
            Self::Pausing => "pausing",
            Self::Cancelling => "cancelling",
            Self::Connecting => "connecting",
            Self::Offline => "offline",
            Self::Error => "error",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

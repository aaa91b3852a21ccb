//! Fan-out coordinator
//!
//! Gates each target printer on its last-known state, runs every allowed
//! exchange concurrently under a per-operation timeout, and joins the
//! results with the denials into one list in target order.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::stream;
use futures::{FutureExt, StreamExt};

use super::action::Action;
use super::executor;
use super::outcome::Outcome;
use super::request::{self, Channel, Request, RequestPlan};
use super::transport::Transport;
use crate::Result;
use crate::farm::{self, DeviceRecord};
use crate::state::{StateSnapshot, StateStore};

/// Default per-operation timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default number of operations in flight at once
pub const DEFAULT_MAX_CONCURRENCY: usize = 16;

/// Dispatcher tuning
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Upper bound on a single operation, including both steps of an upload
    pub request_timeout: Duration,
    /// Operations in flight at once (at least 1)
    pub max_concurrency: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

/// What one scheduled operation does
enum Step<'a> {
    Exchange(&'a Request),
    Upload { file_name: &'a str, content: &'a [u8] },
}

/// One scheduled operation against one device
struct Operation<'a> {
    device: &'a DeviceRecord,
    channel: Option<Channel>,
    step: Step<'a>,
}

/// Long-lived command dispatcher shared by all farm requests
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    store: Arc<StateStore>,
    config: DispatchConfig,
}

impl Dispatcher {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, store: Arc<StateStore>, config: DispatchConfig) -> Self {
        Self {
            transport,
            store,
            config,
        }
    }

    #[must_use]
    pub const fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    /// Dispatch an action to the target printers
    ///
    /// Finish never touches the network: it clears the active flag of each
    /// target and returns a single success outcome. Every other action
    /// reads the state snapshot and fans out.
    ///
    /// # Errors
    ///
    /// Returns error if the state snapshot or active-flag store cannot be
    /// read or written. Device failures are reported as outcomes.
    pub async fn dispatch(&self, action: &Action, devices: &[DeviceRecord]) -> Result<Vec<Outcome>> {
        let kind = action.kind();
        tracing::info!(action = %kind, targets = devices.len(), "dispatching farm command");

        if let Action::Finish = action {
            let ids: Vec<&str> = devices.iter().map(|d| d.id.as_str()).collect();
            let cleared = self.store.clear_active(&ids).await?;
            tracing::info!(cleared, "finish cleared active flags");
            return Ok(vec![Outcome::finished()]);
        }

        let snapshot = self.store.snapshot().await?;
        Ok(self.fan_out(action, devices, &snapshot).await)
    }

    /// Fan an action out against a given state snapshot
    ///
    /// Outcomes come back in target order; a preheat yields the tool
    /// outcome before the bed outcome for each printer.
    pub async fn fan_out(
        &self,
        action: &Action,
        devices: &[DeviceRecord],
        snapshot: &StateSnapshot,
    ) -> Vec<Outcome> {
        let kind = action.kind();
        let plan = request::build(action);

        let mut slots: Vec<Option<Outcome>> = Vec::with_capacity(devices.len());
        let mut scheduled = Vec::new();

        for device in devices {
            let state = snapshot.state_of(&device.id);
            if !farm::allowed(kind, state) {
                tracing::info!(device = %device.id, %state, action = %kind, "action denied");
                slots.push(Some(Outcome::denied(&device.id)));
                continue;
            }

            for operation in operations(&plan, device) {
                scheduled.push((slots.len(), operation));
                slots.push(None);
            }
        }

        tracing::debug!(scheduled = scheduled.len(), "running device operations");

        let pending: Vec<BoxFuture<'_, (usize, Outcome)>> = scheduled
            .into_iter()
            .map(|(slot, operation)| async move { (slot, self.run(operation).await) }.boxed())
            .collect();

        let finished: Vec<(usize, Outcome)> = stream::iter(pending)
            .buffer_unordered(self.config.max_concurrency.max(1))
            .collect()
            .await;

        for (slot, outcome) in finished {
            slots[slot] = Some(outcome);
        }

        slots.into_iter().flatten().collect()
    }

    /// Run one operation to an outcome; never fails
    async fn run(&self, operation: Operation<'_>) -> Outcome {
        let Operation {
            device,
            channel,
            step,
        } = operation;
        let transport = self.transport.as_ref();

        let exchange = async {
            match step {
                Step::Exchange(request) => executor::exchange(transport, device, request).await,
                Step::Upload { file_name, content } => {
                    executor::upload_then_select(transport, device, file_name, content).await
                }
            }
        };

        match tokio::time::timeout(self.config.request_timeout, exchange).await {
            Ok(Ok(reply)) => {
                tracing::debug!(device = %device.id, status = reply.status, "device answered");
                Outcome::completed(&device.id, channel, reply)
            }
            Ok(Err(e)) => {
                tracing::warn!(device = %device.id, error = %e, "device exchange failed");
                Outcome::failed(&device.id, channel, e.to_string())
            }
            Err(_) => {
                tracing::warn!(
                    device = %device.id,
                    timeout = ?self.config.request_timeout,
                    "device exchange timed out"
                );
                Outcome::timed_out(
                    &device.id,
                    channel,
                    format!("no response within {:?}", self.config.request_timeout),
                )
            }
        }
    }
}

/// Operations a plan needs on one device
fn operations<'a>(plan: &'a RequestPlan, device: &'a DeviceRecord) -> Vec<Operation<'a>> {
    match plan {
        RequestPlan::Local => Vec::new(),
        RequestPlan::Single(request) => vec![Operation {
            device,
            channel: None,
            step: Step::Exchange(request),
        }],
        RequestPlan::UploadThenSelect { file_name, content } => vec![Operation {
            device,
            channel: None,
            step: Step::Upload { file_name, content },
        }],
        RequestPlan::Dual { tool, bed } => vec![
            Operation {
                device,
                channel: Some(Channel::Tool),
                step: Step::Exchange(tool),
            },
            Operation {
                device,
                channel: Some(Channel::Bed),
                step: Step::Exchange(bed),
            },
        ],
    }
}

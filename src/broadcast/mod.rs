//! Periodic printer-state broadcaster
//!
//! A single task owns the refresh throttle and is the only writer of the
//! published message. Websocket clients subscribe to the watch channel.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::state::StateStore;

/// Message published before the first successful read
pub const INITIAL_MESSAGE: &str = "...";

/// Default interval between publications
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Gate that admits at most one refresh per interval
#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Duration,
    next_due: Instant,
}

impl Throttle {
    /// A throttle whose first refresh is due at `now`
    #[must_use]
    pub const fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            next_due: now,
        }
    }

    /// Whether a refresh is due; if so the next one is pushed out by one interval
    pub fn should_refresh(&mut self, now: Instant) -> bool {
        if self.next_due <= now {
            self.next_due = now + self.interval;
            true
        } else {
            false
        }
    }
}

/// Publishes the raw state snapshot to subscribers
pub struct StateBroadcaster {
    store: Arc<StateStore>,
    interval: Duration,
    throttle: Throttle,
    tx: watch::Sender<Arc<str>>,
}

impl StateBroadcaster {
    #[must_use]
    pub fn new(store: Arc<StateStore>, interval: Duration) -> Self {
        let (tx, _rx) = watch::channel::<Arc<str>>(Arc::from(INITIAL_MESSAGE));
        Self {
            store,
            interval,
            throttle: Throttle::new(interval, Instant::now()),
            tx,
        }
    }

    /// Receiver for the published message
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<str>> {
        self.tx.subscribe()
    }

    /// Reload the snapshot if the throttle allows, then publish
    ///
    /// Every call notifies subscribers, with the previous message when no
    /// reload happened or the reload failed. Returns whether a reload
    /// succeeded.
    pub async fn tick(&mut self) -> bool {
        let mut reloaded = false;
        let mut message = Arc::clone(&self.tx.borrow());

        if self.throttle.should_refresh(Instant::now()) {
            match self.store.raw_snapshot().await {
                Ok(text) => {
                    message = Arc::from(text);
                    reloaded = true;
                }
                Err(e) => tracing::warn!(error = %e, "keeping previous state message"),
            }
        }

        self.tx.send_replace(message);
        reloaded
    }

    /// Publish every interval until the task is aborted
    pub async fn run(mut self) {
        tracing::info!(interval = ?self.interval, "state broadcaster running");
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            self.tick().await;
        }
    }

    /// Run the broadcaster in a background task
    #[must_use]
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}

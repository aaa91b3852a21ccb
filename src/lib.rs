//! Printfarm Gateway - control plane for a farm of networked 3D printers
//!
//! One farm-level command (pause, resume, print, load, cancel, preheat,
//! shutdown, finish) is translated into per-printer HTTP calls, gated by
//! each printer's last-known state, executed concurrently, and reduced to
//! one outcome list for the caller.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                  HTTP API (axum)                     │
//! │   /api/pause  │  /api/load  │  ...  │  /ws/state    │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                   Dispatcher                         │
//! │   policy gate │ request builder │ transport │ join   │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │            Printers (OctoPrint-style API)            │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod broadcast;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod farm;
pub mod state;
pub mod system;

pub use broadcast::StateBroadcaster;
pub use config::Config;
pub use dispatch::{Action, ActionKind, Dispatcher, Outcome, OutcomeKind};
pub use error::{Error, Result};
pub use farm::{DeviceRecord, DeviceState, Farm};
pub use state::{StateSnapshot, StateStore};

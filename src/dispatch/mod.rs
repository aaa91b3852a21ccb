//! Command dispatch and fan-out
//!
//! One farm-level [`Action`] becomes zero or more device requests. Each
//! target printer is gated on its last-known state, allowed requests run
//! concurrently, and every scheduled request or denial is reported as an
//! [`Outcome`].
//!
//! ```text
//! Action ──► policy gate ──► request builder ──► transport ──► Outcome
//!               │ denied                                          ▲
//!               └─────────────────────────────────────────────────┘
//! ```

pub mod action;
pub mod coordinator;
pub mod executor;
pub mod outcome;
pub mod request;
pub mod transport;

pub use action::{Action, ActionKind, Upload};
pub use coordinator::{DispatchConfig, Dispatcher};
pub use outcome::{Outcome, OutcomeKey, OutcomeKind, keyed};
pub use request::{Channel, Request, RequestPlan, Route};
pub use transport::{API_KEY_HEADER, HttpTransport, Reply, Transport};

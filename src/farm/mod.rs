//! Farm registry for multi-printer dispatch
//!
//! The farm is the set of configured printers. Each printer exposes its own
//! control API and reports an operating state that gates which commands it
//! may receive.

pub mod policy;
pub mod registry;
pub mod types;

pub use policy::{allowed, allowed_states};
pub use registry::Farm;
pub use types::{DeviceRecord, DeviceState};

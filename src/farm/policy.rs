//! Which farm commands a printer accepts in each operating state

use crate::dispatch::ActionKind;

use super::types::DeviceState;

/// States in which a printer accepts the given action
///
/// `Unknown` never appears here, so unrecognised printers are always denied.
#[must_use]
pub const fn allowed_states(action: ActionKind) -> &'static [DeviceState] {
    use DeviceState::{Cancelling, Connecting, Error, Idle, Offline, Paused, Pausing, Printing};

    match action {
        ActionKind::Print | ActionKind::Load | ActionKind::LoadFile => &[Idle],
        ActionKind::Pause => &[Printing],
        ActionKind::Resume => &[Paused],
        ActionKind::Cancel => &[Printing, Paused, Pausing],
        ActionKind::Preheat => &[Idle, Paused],
        ActionKind::Shutdown => &[Idle, Offline, Error],
        // Informational: the dispatcher clears finish flags without consulting state
        ActionKind::Finish => &[
            Idle, Printing, Paused, Pausing, Cancelling, Connecting, Offline, Error,
        ],
    }
}

/// Check if a printer in `state` may receive `action`
#[must_use]
pub fn allowed(action: ActionKind, state: DeviceState) -> bool {
    allowed_states(action).contains(&state)
}

//! Permission gating for the command surface.
//!
//! A denied action never reaches the transport: the check runs before an
//! envelope is even constructed, and the caller surfaces exactly one
//! user-facing notice instead.

#[cfg(test)]
#[path = "actions_test.rs"]
mod actions_test;

use crate::net::types::Permissions;

/// Commands a consumer can issue against the room, mapped to the permission
/// that authorizes each.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerAction {
    Start,
    Pause,
    Stop,
    Select,
    RequestList,
    RequestRoster,
}

impl TimerAction {
    fn verb(self) -> &'static str {
        match self {
            Self::Start => "start timers",
            Self::Pause => "pause timers",
            Self::Stop => "stop timers",
            Self::Select => "change the selected timer",
            Self::RequestList => "view this room's timers",
            Self::RequestRoster => "view this room's connections",
        }
    }

    fn is_allowed(self, permissions: &Permissions) -> bool {
        match self {
            Self::Start | Self::Pause | Self::Stop | Self::Select => permissions.can_control,
            Self::RequestList => permissions.can_view,
            Self::RequestRoster => permissions.can_view_connections,
        }
    }
}

/// Check an action against the current permission set. `Err` carries the
/// user-facing denial message.
pub fn check(permissions: &Permissions, action: TimerAction) -> Result<(), String> {
    if action.is_allowed(permissions) {
        Ok(())
    } else {
        Err(format!("You don't have permission to {}.", action.verb()))
    }
}

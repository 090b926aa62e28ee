//! Joystick metadata snapshot.
//!
//! [`JoystickInfo`] is captured once at open time and never refreshed. It is
//! cheap to clone and suitable for UI display, logging, and persistence.
//!
//! # Conventions
//! - `name` is whatever the driver reports; empty names are replaced with
//!   `"Joystick {id}"`.
//! - `path` is an OS resource name (opaque string) useful for diagnostics, e.g.
//!   `/dev/input/js0` or `winmm:0`.
//!
//! # Example
//! ```no_run
//! use stickpoll::Joystick;
//!
//! let js = stickpoll::open(0).expect("open joystick 0");
//! let info = js.info();
//! println!("{info}: {} axes, {} buttons", info.axis_count, info.button_count);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoystickInfo {
    /// Numeric id passed to `open`.
    pub id: u32,

    /// Human-readable device name.
    pub name: String,

    /// Number of axes reported by the device at open time.
    pub axis_count: usize,

    /// Number of buttons reported by the device at open time.
    ///
    /// Only the first 32 are tracked in [`State::buttons`](crate::State::buttons).
    pub button_count: usize,

    /// Platform resource the id resolved to.
    pub path: String,
}

impl JoystickInfo {
    pub(crate) fn display_name(id: u32, raw: &str) -> String {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            format!("Joystick {id}")
        } else {
            trimmed.to_string()
        }
    }
}

impl fmt::Display for JoystickInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_names_fall_back_to_id() {
        assert_eq!(JoystickInfo::display_name(3, "  "), "Joystick 3");
        assert_eq!(JoystickInfo::display_name(0, "Pad\n"), "Pad");
    }
}

//! Accumulated joystick state.
//!
//! [`State`] is the only externally observable data shape: axis positions in
//! device order plus a 32-bit button mask. It is an **owned** value; every
//! [`Joystick::read`](crate::Joystick::read) hands out a fresh copy.
//!
//! # Ranges
//! Axis values are the device's native signed 16-bit range, `[-32768, 32767]`.
//! Older documentation of this API describes the range as "-32767 to 32768";
//! that wording is a misstatement of the same 16-bit range and is not honored.
//!
//! # Example
//! ```
//! use stickpoll::{Event, State};
//!
//! let mut state = State::new(4);
//! state.apply_event(&Event::axis(0, 2, -1000));
//! state.apply_event(&Event::button(0, 5, true));
//! assert_eq!(state.axis_data, vec![0, 0, -1000, 0]);
//! assert_eq!(state.buttons, 0b0010_0000);
//! ```

use crate::event::{Event, InputKind};
use serde::{Deserialize, Serialize};

/// Number of buttons representable in [`State::buttons`].
pub const MAX_BUTTONS: usize = 32;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    /// Value of each axis, index-stable with the device's axis numbering.
    pub axis_data: Vec<i32>,
    /// One bit per button; bit `i` set means button `i` is pressed.
    pub buttons: u32,
}

impl State {
    /// Zeroed state for a device with `axis_count` axes.
    pub fn new(axis_count: usize) -> Self {
        Self {
            axis_data: vec![0; axis_count],
            buttons: 0,
        }
    }

    /// Apply one decoded update.
    ///
    /// Axis indices past the known axis count and button indices `>= 32` are
    /// dropped.
    pub fn apply(&mut self, input: &InputKind) {
        match *input {
            InputKind::AxisMoved { axis, value } => {
                if let Some(slot) = self.axis_data.get_mut(axis as usize) {
                    *slot = value as i32;
                }
            }
            InputKind::Button { button, pressed } => {
                if (button as usize) < MAX_BUTTONS {
                    let mask = 1u32 << button;
                    if pressed {
                        self.buttons |= mask;
                    } else {
                        self.buttons &= !mask;
                    }
                }
            }
        }
    }

    /// Decode and apply a raw event. Returns the decoded update, if any.
    pub fn apply_event(&mut self, event: &Event) -> Option<InputKind> {
        let input = event.decode()?;
        self.apply(&input);
        Some(input)
    }

    /// Axis value, or `None` if `axis` is out of range.
    #[inline]
    pub fn axis(&self, axis: usize) -> Option<i32> {
        self.axis_data.get(axis).copied()
    }

    #[inline]
    pub fn is_pressed(&self, button: usize) -> bool {
        button < MAX_BUTTONS && self.buttons & (1 << button) != 0
    }

    /// Indices of all pressed buttons, ascending.
    pub fn pressed_buttons(&self) -> impl Iterator<Item = usize> + '_ {
        (0..MAX_BUTTONS).filter(move |&b| self.is_pressed(b))
    }
}

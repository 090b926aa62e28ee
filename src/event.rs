//! Raw events and the decoder.
//!
//! stickpoll works on one raw record shape for every platform: the 8-byte
//! Linux joystick event (`struct js_event`). The Linux backend reads it straight
//! from the device; other backends synthesize it from polled state so the
//! decoder and the [`State`](crate::State) accumulator are shared.
//!
//! ## Record layout (native endian)
//! | offset | size | field    |
//! |--------|------|----------|
//! | 0      | 4    | `time`   (ms, u32)     |
//! | 4      | 2    | `value`  (i16)        |
//! | 6      | 1    | `kind`   (type tag)   |
//! | 7      | 1    | `number` (axis/button index) |
//!
//! ## Type tags
//! - [`JS_EVENT_BUTTON`]: `value != 0` means pressed.
//! - [`JS_EVENT_AXIS`]: `value` is the axis position in `[-32768, 32767]`.
//! - [`JS_EVENT_INIT`]: OR-ed onto either of the above for the synthetic
//!   "current state" events a device replays right after open.
//!
//! Any other tag decodes to `None` and is skipped.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Button pressed/released.
pub const JS_EVENT_BUTTON: u8 = 0x01;
/// Axis moved.
pub const JS_EVENT_AXIS: u8 = 0x02;
/// Initial-state replay flag.
pub const JS_EVENT_INIT: u8 = 0x80;

/// Size of one raw record on the wire.
pub const EVENT_SIZE: usize = std::mem::size_of::<Event>();

/// One raw joystick event, bit-compatible with `struct js_event`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Event {
    /// Event timestamp in milliseconds.
    pub time: u32,
    /// Axis position or button state.
    pub value: i16,
    /// Type tag (`JS_EVENT_*`).
    pub kind: u8,
    /// Axis or button number.
    pub number: u8,
}

impl Event {
    pub fn axis(time: u32, number: u8, value: i16) -> Self {
        Self {
            time,
            value,
            kind: JS_EVENT_AXIS,
            number,
        }
    }

    pub fn button(time: u32, number: u8, pressed: bool) -> Self {
        Self {
            time,
            value: pressed as i16,
            kind: JS_EVENT_BUTTON,
            number,
        }
    }

    /// Mark this event as part of the initial-state replay.
    pub fn into_initial(mut self) -> Self {
        self.kind |= JS_EVENT_INIT;
        self
    }

    #[inline]
    pub fn is_initial(&self) -> bool {
        self.kind & JS_EVENT_INIT != 0
    }

    /// Reinterpret one record worth of native-endian bytes.
    #[inline]
    pub fn from_bytes(bytes: &[u8; EVENT_SIZE]) -> Self {
        bytemuck::pod_read_unaligned(bytes)
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    /// Decode into an axis or button update. See [`decode`].
    #[inline]
    pub fn decode(&self) -> Option<InputKind> {
        decode(self)
    }
}

/// A decoded update, ready to be applied to a [`State`](crate::State).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputKind {
    AxisMoved { axis: u8, value: i16 },
    Button { button: u8, pressed: bool },
}

/// Classify a raw event. Unknown type tags yield `None`.
pub fn decode(event: &Event) -> Option<InputKind> {
    match event.kind & !JS_EVENT_INIT {
        JS_EVENT_AXIS => Some(InputKind::AxisMoved {
            axis: event.number,
            value: event.value,
        }),
        JS_EVENT_BUTTON => Some(InputKind::Button {
            button: event.number,
            pressed: event.value != 0,
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_is_eight_bytes() {
        assert_eq!(EVENT_SIZE, 8);
    }

    #[test]
    fn decodes_native_layout() {
        let time = 1234u32.to_ne_bytes();
        let value = (-1000i16).to_ne_bytes();
        let raw = [
            time[0], time[1], time[2], time[3], value[0], value[1], JS_EVENT_AXIS, 2,
        ];
        let ev = Event::from_bytes(&raw);
        assert_eq!(ev, Event::axis(1234, 2, -1000));
        assert_eq!(ev.as_bytes(), &raw[..]);
    }

    #[test]
    fn init_flag_is_masked_off() {
        let ev = Event::button(0, 3, true).into_initial();
        assert!(ev.is_initial());
        assert_eq!(
            decode(&ev),
            Some(InputKind::Button {
                button: 3,
                pressed: true
            })
        );
        let ev = Event::axis(0, 1, 500).into_initial();
        assert_eq!(
            decode(&ev),
            Some(InputKind::AxisMoved { axis: 1, value: 500 })
        );
    }

    #[test]
    fn any_nonzero_value_is_a_press() {
        let mut ev = Event::button(0, 0, false);
        assert_eq!(
            decode(&ev),
            Some(InputKind::Button {
                button: 0,
                pressed: false
            })
        );
        ev.value = -7;
        assert_eq!(
            decode(&ev),
            Some(InputKind::Button {
                button: 0,
                pressed: true
            })
        );
    }

    #[test]
    fn unknown_tags_are_ignored() {
        for kind in [0x00, 0x04, 0x40, JS_EVENT_INIT, 0x83] {
            let ev = Event {
                time: 0,
                value: 1,
                kind,
                number: 0,
            };
            assert_eq!(decode(&ev), None, "tag {kind:#04x}");
        }
    }
}

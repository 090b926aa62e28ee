//! Joystick capability traits and the polled handle.
//!
//! - [`Joystick`] is what callers program against: cached metadata plus
//!   `read`/`close`.
//! - [`JoystickChannelled`] adds a single-slot event channel (see
//!   [`ChannelledDevice`](crate::ChannelledDevice)).
//! - [`EventSource`] is the platform seam. Each backend provides exactly one
//!   implementation, chosen at build time; [`Device`] turns any source into a
//!   polled [`Joystick`].

use crate::error::JoystickError;
use crate::event::Event;
use crate::metadata::JoystickInfo;
use crate::state::State;
use log::debug;
use std::io;
use std::sync::mpsc::Receiver;
use std::time::Duration;

/// A platform stream of raw events for one open device.
///
/// Dropping the source releases the native resource.
pub trait EventSource: Send {
    /// Append every event currently pending to `out` without blocking.
    ///
    /// Events read before an error must still be appended.
    fn drain(&mut self, out: &mut Vec<Event>) -> io::Result<()>;

    /// Block for at most `timeout` until events may be pending.
    ///
    /// Returns `Ok(false)` on timeout. A `true` result is only a hint; the
    /// following [`drain`](Self::drain) may still come back empty.
    fn wait(&mut self, timeout: Duration) -> io::Result<bool>;
}

impl<S: EventSource + ?Sized> EventSource for Box<S> {
    fn drain(&mut self, out: &mut Vec<Event>) -> io::Result<()> {
        (**self).drain(out)
    }

    fn wait(&mut self, timeout: Duration) -> io::Result<bool> {
        (**self).wait(timeout)
    }
}

/// An open joystick.
pub trait Joystick {
    /// Metadata captured at open time.
    fn info(&self) -> &JoystickInfo;

    fn axis_count(&self) -> usize {
        self.info().axis_count
    }

    fn button_count(&self) -> usize {
        self.info().button_count
    }

    fn name(&self) -> &str {
        &self.info().name
    }

    /// Returns the current state of the joystick.
    ///
    /// "Nothing new" is not an error: the previous state comes back unchanged.
    /// A [`JoystickError::ReadFailed`] usually means the device was unplugged;
    /// the handle stays open until [`close`](Self::close) is called.
    fn read(&mut self) -> Result<State, JoystickError>;

    /// Release the device. Safe to call more than once.
    fn close(&mut self);

    fn is_closed(&self) -> bool;
}

/// A [`Joystick`] that also publishes raw events as they arrive.
pub trait JoystickChannelled: Joystick {
    /// Events read from the device.
    ///
    /// If an event is not consumed before the next one is ready, the new event
    /// is dropped. Use this to wait for changes, then call [`Joystick::read`]
    /// for the full state. The channel disconnects once the handle is closed
    /// or the device fails.
    fn events(&self) -> &Receiver<Event>;
}

/// Polled joystick handle over an [`EventSource`].
///
/// Each [`read`](Joystick::read) drains the source, applies every event in
/// the order reported, and returns a copy of the accumulated [`State`].
pub struct Device<S> {
    source: Option<S>,
    info: JoystickInfo,
    state: State,
    scratch: Vec<Event>,
}

impl<S: EventSource> Device<S> {
    /// Wrap an already-open source. The state starts zeroed.
    pub fn new(source: S, info: JoystickInfo) -> Self {
        Self {
            source: Some(source),
            state: State::new(info.axis_count),
            info,
            scratch: Vec::new(),
        }
    }

    /// Last state returned by `read`, without touching the device.
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Drain and apply pending events, returning the raw events themselves.
    ///
    /// On failure, events drained before the error are still applied.
    pub fn read_events(&mut self) -> Result<Vec<Event>, JoystickError> {
        let source = self.source.as_mut().ok_or(JoystickError::Closed)?;

        self.scratch.clear();
        let res = source.drain(&mut self.scratch);
        for ev in &self.scratch {
            self.state.apply_event(ev);
        }
        res.map_err(JoystickError::ReadFailed)?;

        Ok(std::mem::take(&mut self.scratch))
    }

    pub fn source_mut(&mut self) -> Option<&mut S> {
        self.source.as_mut()
    }
}

impl<S: EventSource> Joystick for Device<S> {
    fn info(&self) -> &JoystickInfo {
        &self.info
    }

    fn read(&mut self) -> Result<State, JoystickError> {
        self.read_events()?;
        Ok(self.state.clone())
    }

    fn close(&mut self) {
        if self.source.take().is_some() {
            debug!("closed joystick {}", self.info);
        }
    }

    fn is_closed(&self) -> bool {
        self.source.is_none()
    }
}

//! Channelled joystick: a background reader feeding a single-slot mailbox.
//!
//! [`ChannelledDevice`] moves the [`EventSource`] onto its own thread. That
//! thread waits for input, drains it, applies every event to a shared
//! [`State`], and then offers each decodable event to a
//! `sync_channel(1)`:
//!
//! - slot empty → the event is delivered;
//! - slot full → the **new** event is dropped (the earlier one is kept).
//!
//! A slow consumer therefore never sees a backlog, only the oldest unconsumed
//! event. [`Joystick::read`] is a lock-and-copy of the shared state, so it never
//! touches the device.
//!
//! ## Shutdown
//! [`close`](Joystick::close) raises a stop flag and joins the thread. The
//! reader re-checks the flag at least every `wait` interval, so close returns
//! promptly; the source (and its descriptor) is dropped on the reader thread
//! and the channel disconnects. Dropping the handle does the same.
//!
//! ## Failures
//! A read error stops the reader, disconnects the channel and is latched: every
//! later `read` returns [`JoystickError::ReadFailed`] with the same OS error
//! code (or kind and message, for errors without one) until the handle is
//! closed.

use crate::device::{EventSource, Joystick, JoystickChannelled};
use crate::error::JoystickError;
use crate::event::Event;
use crate::metadata::JoystickInfo;
use crate::state::State;
use log::{debug, trace, warn};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Event channel capacity.
const CHANNEL_SLOTS: usize = 1;

/// Reader error kept for later `read` calls (`io::Error` is not `Clone`).
#[derive(Debug)]
struct Failure {
    raw_os_error: Option<i32>,
    kind: io::ErrorKind,
    message: String,
}

impl Failure {
    fn new(err: &io::Error) -> Self {
        Self {
            raw_os_error: err.raw_os_error(),
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    fn to_io(&self) -> io::Error {
        match self.raw_os_error {
            Some(code) => io::Error::from_raw_os_error(code),
            None => io::Error::new(self.kind, self.message.clone()),
        }
    }
}

#[derive(Debug)]
struct Shared {
    state: State,
    failure: Option<Failure>,
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct ChannelledDevice {
    info: JoystickInfo,
    shared: Arc<Mutex<Shared>>,
    stop: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
    events: Receiver<Event>,
    closed: bool,
}

impl ChannelledDevice {
    /// Start a background reader over `source`.
    ///
    /// `wait` bounds how long the reader blocks in [`EventSource::wait`]
    /// before re-checking for shutdown.
    pub fn spawn<S>(source: S, info: JoystickInfo, wait: Duration) -> Result<Self, JoystickError>
    where
        S: EventSource + 'static,
    {
        let (tx, events) = mpsc::sync_channel(CHANNEL_SLOTS);
        let shared = Arc::new(Mutex::new(Shared {
            state: State::new(info.axis_count),
            failure: None,
        }));
        let stop = Arc::new(AtomicBool::new(false));

        let pump = Pump {
            id: info.id,
            source,
            tx,
            shared: Arc::clone(&shared),
            stop: Arc::clone(&stop),
            wait,
        };
        let reader = thread::Builder::new()
            .name(format!("stickpoll-js{}", info.id))
            .spawn(move || pump.run())
            .map_err(JoystickError::Spawn)?;

        debug!("started event reader for joystick {info}");
        Ok(Self {
            info,
            shared,
            stop,
            reader: Some(reader),
            events,
            closed: false,
        })
    }
}

impl Joystick for ChannelledDevice {
    fn info(&self) -> &JoystickInfo {
        &self.info
    }

    fn read(&mut self) -> Result<State, JoystickError> {
        if self.closed {
            return Err(JoystickError::Closed);
        }
        let shared = lock(&self.shared);
        if let Some(failure) = &shared.failure {
            return Err(JoystickError::ReadFailed(failure.to_io()));
        }
        Ok(shared.state.clone())
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.stop.store(true, Ordering::Release);
        if let Some(reader) = self.reader.take() {
            if reader.join().is_err() {
                warn!("event reader for joystick {} panicked", self.info.id);
            }
        }
        debug!("closed joystick {}", self.info);
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

impl JoystickChannelled for ChannelledDevice {
    fn events(&self) -> &Receiver<Event> {
        &self.events
    }
}

impl Drop for ChannelledDevice {
    fn drop(&mut self) {
        self.close();
    }
}

/// Background half: owns the source and the sending end of the channel.
struct Pump<S> {
    id: u32,
    source: S,
    tx: SyncSender<Event>,
    shared: Arc<Mutex<Shared>>,
    stop: Arc<AtomicBool>,
    wait: Duration,
}

impl<S: EventSource> Pump<S> {
    fn run(mut self) {
        let mut batch = Vec::new();

        while !self.stop.load(Ordering::Acquire) {
            let res = match self.source.wait(self.wait) {
                Ok(true) => self.source.drain(&mut batch),
                Ok(false) => Ok(()),
                Err(e) => Err(e),
            };

            if !batch.is_empty() {
                self.publish(&mut batch);
            }

            if let Err(e) = res {
                warn!("joystick {} read failed, stopping event reader: {e}", self.id);
                lock(&self.shared).failure = Some(Failure::new(&e));
                break;
            }
        }
        // `self.tx` and `self.source` drop here: channel disconnects, device is released.
    }

    fn publish(&mut self, batch: &mut Vec<Event>) {
        {
            let mut shared = lock(&self.shared);
            for ev in batch.iter() {
                shared.state.apply_event(ev);
            }
        }

        for ev in batch.drain(..) {
            if ev.decode().is_none() {
                continue;
            }
            match self.tx.try_send(ev) {
                Ok(()) => {}
                Err(TrySendError::Full(ev)) => {
                    trace!("joystick {}: event slot full, dropped {ev:?}", self.id)
                }
                // Nobody listening; state is still kept up to date for `read`.
                Err(TrySendError::Disconnected(_)) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::RecvTimeoutError;
    use std::time::Instant;

    enum Step {
        Events(Vec<Event>),
        Fail,
        Os(i32),
    }

    /// Source fed from the test thread through a plain channel.
    struct Fed {
        steps: mpsc::Receiver<Step>,
        next: Option<Step>,
        dropped: Arc<AtomicBool>,
    }

    impl EventSource for Fed {
        fn drain(&mut self, out: &mut Vec<Event>) -> io::Result<()> {
            match self.next.take() {
                Some(Step::Events(evs)) => {
                    out.extend(evs);
                    Ok(())
                }
                Some(Step::Fail) => Err(io::Error::new(io::ErrorKind::Other, "unplugged")),
                Some(Step::Os(code)) => Err(io::Error::from_raw_os_error(code)),
                None => Ok(()),
            }
        }

        fn wait(&mut self, timeout: Duration) -> io::Result<bool> {
            match self.steps.recv_timeout(timeout) {
                Ok(step) => {
                    self.next = Some(step);
                    Ok(true)
                }
                Err(_) => Ok(false),
            }
        }
    }

    impl Drop for Fed {
        fn drop(&mut self) {
            self.dropped.store(true, Ordering::SeqCst);
        }
    }

    fn spawn(axes: usize) -> (ChannelledDevice, mpsc::Sender<Step>, Arc<AtomicBool>) {
        let (feed, steps) = mpsc::channel();
        let dropped = Arc::new(AtomicBool::new(false));
        let source = Fed {
            steps,
            next: None,
            dropped: Arc::clone(&dropped),
        };
        let info = JoystickInfo {
            id: 7,
            name: "Fed".into(),
            axis_count: axes,
            button_count: 8,
            path: "test:7".into(),
        };
        let dev = ChannelledDevice::spawn(source, info, Duration::from_millis(10)).unwrap();
        (dev, feed, dropped)
    }

    /// Poll `read` until `pred` holds or a generous deadline passes.
    fn read_until(dev: &mut ChannelledDevice, pred: impl Fn(&State) -> bool) -> State {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let s = dev.read().unwrap();
            if pred(&s) || Instant::now() > deadline {
                return s;
            }
            thread::sleep(Duration::from_millis(2));
        }
    }

    fn wait_for_failure(dev: &mut ChannelledDevice) -> JoystickError {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            match dev.read() {
                Err(e) => return e,
                Ok(_) if Instant::now() > deadline => panic!("reader never failed"),
                Ok(_) => thread::sleep(Duration::from_millis(2)),
            }
        }
    }

    #[test]
    fn keeps_first_event_and_drops_the_rest() {
        let (mut dev, feed, _) = spawn(4);
        feed.send(Step::Events(vec![
            Event::axis(1, 2, -1000),
            Event::button(2, 5, true),
            Event::axis(3, 0, 9),
        ]))
        .unwrap();

        let s = read_until(&mut dev, |s| s.axis_data[0] == 9);
        assert_eq!(s.axis_data, vec![9, 0, -1000, 0]);
        assert_eq!(s.buttons, 0b0010_0000);

        // The failure is handled after the whole batch was offered.
        feed.send(Step::Fail).unwrap();
        wait_for_failure(&mut dev);

        assert_eq!(dev.events().try_recv().unwrap(), Event::axis(1, 2, -1000));
        assert!(matches!(
            dev.events().recv_timeout(Duration::from_secs(5)),
            Err(RecvTimeoutError::Disconnected)
        ));
        dev.close();
    }

    #[test]
    fn undecodable_events_are_not_forwarded() {
        let (mut dev, feed, _) = spawn(1);
        let junk = Event {
            time: 0,
            value: 1,
            kind: 0x40,
            number: 0,
        };
        feed.send(Step::Events(vec![junk, Event::button(1, 0, true)]))
            .unwrap();
        let ev = dev
            .events()
            .recv_timeout(Duration::from_secs(5))
            .unwrap();
        assert_eq!(ev, Event::button(1, 0, true));
        dev.close();
    }

    #[test]
    fn close_stops_reader_and_disconnects_channel() {
        let (mut dev, _feed, dropped) = spawn(2);
        dev.close();
        assert!(dropped.load(Ordering::SeqCst), "source released on close");
        assert!(dev.is_closed());
        assert!(matches!(
            dev.events().recv_timeout(Duration::from_millis(50)),
            Err(RecvTimeoutError::Disconnected)
        ));
        assert!(matches!(dev.read(), Err(JoystickError::Closed)));
        dev.close();
    }

    #[test]
    fn failure_is_latched_and_close_still_works() {
        let (mut dev, feed, dropped) = spawn(2);
        feed.send(Step::Events(vec![Event::axis(0, 1, 5)])).unwrap();
        feed.send(Step::Fail).unwrap();

        let err = wait_for_failure(&mut dev);
        assert!(err.is_read_failure());
        assert!(err.to_string().contains("unplugged"));
        assert!(dev.read().unwrap_err().is_read_failure());

        assert_eq!(dev.events().try_recv().unwrap(), Event::axis(0, 1, 5));
        assert!(matches!(
            dev.events().recv_timeout(Duration::from_secs(5)),
            Err(RecvTimeoutError::Disconnected)
        ));

        dev.close();
        assert!(dropped.load(Ordering::SeqCst));
    }

    #[test]
    fn latched_failure_keeps_os_error_code() {
        let (mut dev, feed, _) = spawn(1);
        feed.send(Step::Os(19)).unwrap();

        let first = wait_for_failure(&mut dev);
        let again = dev.read().unwrap_err();
        for err in [first, again] {
            match err {
                JoystickError::ReadFailed(io) => assert_eq!(io.raw_os_error(), Some(19)),
                other => panic!("unexpected error: {other}"),
            }
        }
        dev.close();
    }
}

//! Fixed-size record reader.
//!
//! [`EventReader`] turns any non-blocking byte stream into a sequence of raw
//! [`Event`]s. It is the draining half of the Linux backend and is usable on its
//! own with pipes, sockets or in-memory readers.
//!
//! ## Draining rules
//! - Reads until the inner reader reports `WouldBlock`; everything buffered by
//!   the OS at that point has been returned.
//! - Records split across reads are reassembled; a trailing partial record is
//!   kept for the next call.
//! - `Ok(0)` (end of stream) is an error: a joystick device never signals EOF
//!   while attached, so this means the other end is gone.
//! - `Interrupted` is retried; every other error is returned as-is.
//!
//! The inner reader **must** be non-blocking, otherwise draining stalls until
//! the next input arrives.

use crate::event::{Event, EVENT_SIZE};
use std::io::{self, Read};

/// Records pulled per `read(2)` call.
const RECORDS_PER_READ: usize = 64;

pub struct EventReader<R> {
    inner: R,
    pending: [u8; EVENT_SIZE],
    filled: usize,
}

impl<R: Read> EventReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            pending: [0; EVENT_SIZE],
            filled: 0,
        }
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Append every complete record currently available to `out`.
    ///
    /// Returns the number of records appended. Records decoded before an error
    /// are still appended, so callers can apply them before reporting it.
    pub fn drain(&mut self, out: &mut Vec<Event>) -> io::Result<usize> {
        let mut chunk = [0u8; EVENT_SIZE * RECORDS_PER_READ];
        let mut count = 0;

        loop {
            match self.inner.read(&mut chunk) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "joystick event stream ended",
                    ))
                }
                Ok(n) => count += self.feed(&chunk[..n], out),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(count),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    fn feed(&mut self, mut data: &[u8], out: &mut Vec<Event>) -> usize {
        let mut count = 0;
        while !data.is_empty() {
            let take = (EVENT_SIZE - self.filled).min(data.len());
            self.pending[self.filled..self.filled + take].copy_from_slice(&data[..take]);
            self.filled += take;
            data = &data[take..];

            if self.filled == EVENT_SIZE {
                out.push(Event::from_bytes(&self.pending));
                self.filled = 0;
                count += 1;
            }
        }
        count
    }
}

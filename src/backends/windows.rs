#![cfg(target_os = "windows")]

//! Windows joystick backend (winmm `joyGetPosEx`).
//!
//! winmm has no event stream, only "current position" polling. This backend
//! polls, diffs against the previous poll, and synthesizes raw [`Event`]s for
//! every axis or button that changed, so the shared decoder and accumulator
//! do the rest.
//!
//! # Mapping
//! - `id` is the winmm joystick id (`JOYSTICKID1 == 0`).
//! - Axes `0..n` are X, Y, Z, R, U, V (only the first `wNumAxes` are used),
//!   rescaled from the driver's `[min, max]` to `[-32768, 32767]`.
//! - Devices with a POV hat get two extra axes (hat X, hat Y) at
//!   `-32768 | 0 | 32767`.
//! - Buttons are `dwButtons` bits, one per button.
//! - The first successful poll emits every value flagged `JS_EVENT_INIT`,
//!   mirroring the Linux driver.
//! - Timestamps are milliseconds since open.

use crate::config::JoystickConfig;
use crate::device::EventSource;
use crate::error::JoystickError;
use crate::event::Event;
use crate::metadata::JoystickInfo;
use crate::state::MAX_BUTTONS;
use log::debug;
use std::io;
use std::time::{Duration, Instant};
use windows_sys::Win32::Media::Multimedia::{joyGetDevCapsW, joyGetPosEx, JOYCAPSW, JOYINFOEX};

// Local constants (avoid relying on module exports that vary by windows-sys version)
const JOYERR_NOERROR: u32 = 0;
const MMSYSERR_BADDEVICEID: u32 = 2;
const MMSYSERR_NODRIVER: u32 = 6;
const JOYERR_PARMS: u32 = 165;
const JOYERR_UNPLUGGED: u32 = 167;
const JOY_RETURNALL: u32 = 0x0000_00FF;
const JOYCAPS_HASPOV: u32 = 0x0010;
const JOY_POVCENTERED: u32 = 0xFFFF;

/// winmm reports at most six linear axes.
const MAX_LINEAR_AXES: usize = 6;

/// winmm-backed polled source.
pub struct WinmmSource {
    id: u32,
    /// `(min, max)` per linear axis.
    ranges: Vec<(u32, u32)>,
    has_pov: bool,
    button_count: usize,
    last_axes: Vec<i16>,
    last_buttons: u32,
    opened: Instant,
    primed: bool,
}

impl WinmmSource {
    fn poll(&self) -> io::Result<JOYINFOEX> {
        // FFI struct: must be manually zeroed
        let mut info: JOYINFOEX = unsafe { std::mem::zeroed() };
        info.dwSize = std::mem::size_of::<JOYINFOEX>() as u32;
        info.dwFlags = JOY_RETURNALL;

        let rc = unsafe { joyGetPosEx(self.id, &mut info) };
        if rc != JOYERR_NOERROR {
            return Err(mm_error("joyGetPosEx", rc));
        }
        Ok(info)
    }

    /// Map a raw position in `[min, max]` onto the signed 16-bit range.
    fn scale(pos: u32, (min, max): (u32, u32)) -> i16 {
        if max <= min {
            return 0;
        }
        let span = (max - min) as i64;
        let rel = (pos.clamp(min, max) - min) as i64;
        (rel * 65535 / span - 32768) as i16
    }

    /// Hat angle (hundredths of a degree) to `(x, y)` axis values.
    fn pov_axes(pov: u32) -> (i16, i16) {
        if pov == JOY_POVCENTERED || pov > 35999 {
            return (0, 0);
        }
        let sector = ((pov + 2250) / 4500) % 8; // 0 = up, clockwise
        let x = match sector {
            1..=3 => i16::MAX,
            5..=7 => i16::MIN,
            _ => 0,
        };
        let y = match sector {
            0 | 1 | 7 => i16::MIN,
            3..=5 => i16::MAX,
            _ => 0,
        };
        (x, y)
    }

    fn from_parts(id: u32, ranges: Vec<(u32, u32)>, has_pov: bool, button_count: usize) -> Self {
        let axis_count = ranges.len() + if has_pov { 2 } else { 0 };
        Self {
            id,
            ranges,
            has_pov,
            button_count,
            last_axes: vec![0; axis_count],
            last_buttons: 0,
            opened: Instant::now(),
            primed: false,
        }
    }

    /// Scaled axis values for one poll, POV axes last.
    fn axes_from(&self, info: &JOYINFOEX) -> Vec<i16> {
        let positions = [
            info.dwXpos,
            info.dwYpos,
            info.dwZpos,
            info.dwRpos,
            info.dwUpos,
            info.dwVpos,
        ];
        let mut axes: Vec<i16> = self
            .ranges
            .iter()
            .zip(positions)
            .map(|(&range, pos)| Self::scale(pos, range))
            .collect();
        if self.has_pov {
            let (x, y) = Self::pov_axes(info.dwPOV);
            axes.push(x);
            axes.push(y);
        }
        axes
    }

    /// Emit events for everything that changed since the previous poll.
    ///
    /// The first call emits every axis and button flagged `JS_EVENT_INIT`.
    fn diff(&mut self, time: u32, axes: Vec<i16>, buttons: u32, out: &mut Vec<Event>) {
        let primed = self.primed;
        let flag = |ev: Event| if primed { ev } else { ev.into_initial() };

        for (i, &v) in axes.iter().enumerate() {
            if !primed || self.last_axes.get(i) != Some(&v) {
                out.push(flag(Event::axis(time, i as u8, v)));
            }
        }

        let changed = buttons ^ self.last_buttons;
        for b in 0..self.button_count.min(MAX_BUTTONS) {
            let mask = 1u32 << b;
            if !primed || changed & mask != 0 {
                out.push(flag(Event::button(time, b as u8, buttons & mask != 0)));
            }
        }

        self.last_axes = axes;
        self.last_buttons = buttons;
        self.primed = true;
    }
}

impl EventSource for WinmmSource {
    fn drain(&mut self, out: &mut Vec<Event>) -> io::Result<()> {
        let info = self.poll()?;
        let time = self.opened.elapsed().as_millis() as u32;
        let axes = self.axes_from(&info);
        self.diff(time, axes, info.dwButtons, out);
        Ok(())
    }

    fn wait(&mut self, timeout: Duration) -> io::Result<bool> {
        std::thread::sleep(timeout);
        Ok(true)
    }
}

fn mm_error(call: &str, rc: u32) -> io::Error {
    let kind = match rc {
        JOYERR_UNPLUGGED => io::ErrorKind::NotConnected,
        MMSYSERR_BADDEVICEID | JOYERR_PARMS => io::ErrorKind::NotFound,
        _ => io::ErrorKind::Other,
    };
    io::Error::new(kind, format!("{call} failed with code {rc}"))
}

/// Open winmm joystick `id` and read its capabilities.
pub fn open_source(
    id: u32,
    _config: &JoystickConfig,
) -> Result<(WinmmSource, JoystickInfo), JoystickError> {
    let path = format!("winmm:{id}");

    let mut caps: JOYCAPSW = unsafe { std::mem::zeroed() };
    let rc = unsafe {
        joyGetDevCapsW(
            id as usize,
            &mut caps,
            std::mem::size_of::<JOYCAPSW>() as u32,
        )
    };
    match rc {
        JOYERR_NOERROR => {}
        MMSYSERR_BADDEVICEID | JOYERR_PARMS | JOYERR_UNPLUGGED => {
            return Err(JoystickError::DeviceNotFound { id, path })
        }
        MMSYSERR_NODRIVER => {
            return Err(JoystickError::OpenFailed {
                id,
                path,
                source: mm_error("joyGetDevCapsW", rc),
            })
        }
        _ => {
            return Err(JoystickError::MetadataQueryFailed {
                id,
                query: "device caps",
                source: mm_error("joyGetDevCapsW", rc),
            })
        }
    }

    let all_ranges = [
        (caps.wXmin, caps.wXmax),
        (caps.wYmin, caps.wYmax),
        (caps.wZmin, caps.wZmax),
        (caps.wRmin, caps.wRmax),
        (caps.wUmin, caps.wUmax),
        (caps.wVmin, caps.wVmax),
    ];
    let linear = (caps.wNumAxes as usize).min(MAX_LINEAR_AXES);
    let ranges = all_ranges[..linear].to_vec();
    let has_pov = caps.wCaps & JOYCAPS_HASPOV != 0;

    let name_end = caps
        .szPname
        .iter()
        .position(|&c| c == 0)
        .unwrap_or(caps.szPname.len());
    let name = String::from_utf16_lossy(&caps.szPname[..name_end]);

    let source = WinmmSource::from_parts(id, ranges, has_pov, caps.wNumButtons as usize);
    let axis_count = source.last_axes.len();

    // A configured but unplugged joystick still has caps; poll once.
    if let Err(e) = source.poll() {
        return Err(match e.kind() {
            io::ErrorKind::NotConnected | io::ErrorKind::NotFound => {
                JoystickError::DeviceNotFound { id, path }
            }
            _ => JoystickError::OpenFailed {
                id,
                path,
                source: e,
            },
        });
    }

    let info = JoystickInfo {
        id,
        name: JoystickInfo::display_name(id, &name),
        axis_count,
        button_count: caps.wNumButtons as usize,
        path,
    };
    debug!(
        "opened joystick {info}: {} axes, {} buttons",
        info.axis_count, info.button_count
    );

    Ok((source, info))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_covers_signed_range() {
        assert_eq!(WinmmSource::scale(0, (0, 65535)), -32768);
        assert_eq!(WinmmSource::scale(65535, (0, 65535)), 32767);
        assert_eq!(WinmmSource::scale(70000, (0, 65535)), 32767);
        assert_eq!(WinmmSource::scale(5, (10, 10)), 0);
    }

    #[test]
    fn pov_maps_to_eight_directions() {
        assert_eq!(WinmmSource::pov_axes(JOY_POVCENTERED), (0, 0));
        assert_eq!(WinmmSource::pov_axes(0), (0, i16::MIN));
        assert_eq!(WinmmSource::pov_axes(9000), (i16::MAX, 0));
        assert_eq!(WinmmSource::pov_axes(13500), (i16::MAX, i16::MAX));
        assert_eq!(WinmmSource::pov_axes(27000), (i16::MIN, 0));
    }

    fn source(axes: usize, buttons: usize) -> WinmmSource {
        WinmmSource::from_parts(0, vec![(0, 65535); axes], false, buttons)
    }

    #[test]
    fn first_poll_replays_everything_as_initial() {
        let mut src = source(3, 40);
        let mut out = Vec::new();
        src.diff(0, vec![0, 100, -5], 0b101, &mut out);

        // 3 axes + buttons capped at 32.
        assert_eq!(out.len(), 3 + 32);
        assert!(out.iter().all(Event::is_initial));
        assert_eq!(out[1], Event::axis(0, 1, 100).into_initial());
        assert_eq!(out[3], Event::button(0, 0, true).into_initial());
        assert_eq!(out[4], Event::button(0, 1, false).into_initial());
    }

    #[test]
    fn unchanged_poll_emits_nothing() {
        let mut src = source(2, 4);
        let mut out = Vec::new();
        src.diff(0, vec![7, -7], 0b10, &mut out);
        out.clear();

        src.diff(16, vec![7, -7], 0b10, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn single_change_emits_one_plain_event() {
        let mut src = source(2, 4);
        let mut out = Vec::new();
        src.diff(0, vec![0, 0], 0, &mut out);

        out.clear();
        src.diff(16, vec![0, -1000], 0, &mut out);
        assert_eq!(out, vec![Event::axis(16, 1, -1000)]);

        out.clear();
        src.diff(32, vec![0, -1000], 0b1000, &mut out);
        assert_eq!(out, vec![Event::button(32, 3, true)]);
        assert!(!out[0].is_initial());
    }

    #[test]
    fn pov_adds_two_axes() {
        let src = WinmmSource::from_parts(0, vec![(0, 65535); 2], true, 0);
        assert_eq!(src.last_axes.len(), 4);
    }
}

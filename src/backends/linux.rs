//! Linux joystick backend (`/dev/input/js*`).
//!
//! The kernel joystick interface already speaks stickpoll's raw record format,
//! so this backend is mostly plumbing:
//! - open the device node read-only with `O_NONBLOCK`,
//! - query axis count, button count and name with `JSIOCGAXES`,
//!   `JSIOCGBUTTONS` and `JSIOCGNAME(len)`,
//! - drain records with [`EventReader`] and wait for input with `poll(2)`.
//!
//! Right after open the driver replays the current position of every axis and
//! button as `JS_EVENT_INIT` events; they land in the state on the first read.
//! An unplugged device fails reads with `ENODEV`.
//!
//! [`FdSource`] works with any non-blocking readable descriptor, which is how
//! the backend is exercised without a physical joystick.

use crate::config::JoystickConfig;
use crate::device::EventSource;
use crate::error::JoystickError;
use crate::event::Event;
use crate::metadata::JoystickInfo;
use crate::stream::EventReader;
use log::debug;
use std::fs::{File, OpenOptions};
use std::io::{self, Read};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::{AsRawFd, RawFd};
use std::time::Duration;

// <asm-generic/ioctl.h>: 14 size bits, direction at bit 30 (x86, arm, riscv, ...).
#[cfg(not(any(
    target_arch = "powerpc",
    target_arch = "powerpc64",
    target_arch = "mips",
    target_arch = "mips64",
    target_arch = "sparc",
    target_arch = "sparc64"
)))]
mod ioc {
    pub const SIZE_BITS: u32 = 14;
    pub const READ: libc::c_ulong = 2;
}

// powerpc/mips/sparc: 13 size bits, direction at bit 29.
#[cfg(any(
    target_arch = "powerpc",
    target_arch = "powerpc64",
    target_arch = "mips",
    target_arch = "mips64",
    target_arch = "sparc",
    target_arch = "sparc64"
))]
mod ioc {
    pub const SIZE_BITS: u32 = 13;
    pub const READ: libc::c_ulong = 2;
}

const IOC_SIZE_SHIFT: u32 = 16;
const IOC_DIR_SHIFT: u32 = IOC_SIZE_SHIFT + ioc::SIZE_BITS;
const IOC_SIZE_MASK: libc::c_ulong = (1 << ioc::SIZE_BITS) - 1;
/// Largest payload an ioctl request number can describe.
const IOC_SIZE_MAX: usize = IOC_SIZE_MASK as usize;

// <linux/joystick.h>
const JS_IOCTL_TYPE: libc::c_ulong = b'j' as libc::c_ulong;

const fn ioc_read(nr: libc::c_ulong, size: usize) -> libc::c_ulong {
    (ioc::READ << IOC_DIR_SHIFT)
        | ((size as libc::c_ulong & IOC_SIZE_MASK) << IOC_SIZE_SHIFT)
        | (JS_IOCTL_TYPE << 8)
        | nr
}

/// Get number of axes (`u8`).
const JSIOCGAXES: libc::c_ulong = ioc_read(0x11, 1);
/// Get number of buttons (`u8`).
const JSIOCGBUTTONS: libc::c_ulong = ioc_read(0x12, 1);

/// Get identifier string, at most `len` bytes.
const fn jsiocgname(len: usize) -> libc::c_ulong {
    ioc_read(0x13, len)
}

/// Non-blocking descriptor producing raw joystick records.
pub struct FdSource<R> {
    reader: EventReader<R>,
}

impl<R: Read + AsRawFd + Send> FdSource<R> {
    /// `inner` must already be in non-blocking mode.
    pub fn new(inner: R) -> Self {
        Self {
            reader: EventReader::new(inner),
        }
    }

    pub fn get_ref(&self) -> &R {
        self.reader.get_ref()
    }
}

impl<R: Read + AsRawFd + Send> EventSource for FdSource<R> {
    fn drain(&mut self, out: &mut Vec<Event>) -> io::Result<()> {
        self.reader.drain(out).map(|_| ())
    }

    fn wait(&mut self, timeout: Duration) -> io::Result<bool> {
        poll_readable(self.reader.get_ref().as_raw_fd(), timeout)
    }
}

/// Backend source for a real device node.
pub type LinuxSource = FdSource<File>;

/// Open joystick `id` and read its metadata.
pub fn open_source(
    id: u32,
    config: &JoystickConfig,
) -> Result<(LinuxSource, JoystickInfo), JoystickError> {
    let path = config.device_path(id);

    let file = OpenOptions::new()
        .read(true)
        .custom_flags(libc::O_NONBLOCK)
        .open(&path)
        .map_err(|source| {
            if is_missing_device(&source) {
                JoystickError::DeviceNotFound {
                    id,
                    path: path.clone(),
                }
            } else {
                JoystickError::OpenFailed {
                    id,
                    path: path.clone(),
                    source,
                }
            }
        })?;

    let fd = file.as_raw_fd();
    let axis_count = query_count(fd, JSIOCGAXES).map_err(|source| {
        JoystickError::MetadataQueryFailed {
            id,
            query: "axis count",
            source,
        }
    })?;
    let button_count = query_count(fd, JSIOCGBUTTONS).map_err(|source| {
        JoystickError::MetadataQueryFailed {
            id,
            query: "button count",
            source,
        }
    })?;
    let name = query_name(fd, config.name_len).map_err(|source| {
        JoystickError::MetadataQueryFailed {
            id,
            query: "name",
            source,
        }
    })?;

    let info = JoystickInfo {
        id,
        name: JoystickInfo::display_name(id, &name),
        axis_count: axis_count as usize,
        button_count: button_count as usize,
        path,
    };
    debug!(
        "opened joystick {info}: {} axes, {} buttons",
        info.axis_count, info.button_count
    );

    Ok((FdSource::new(file), info))
}

fn is_missing_device(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::NotFound
        || matches!(err.raw_os_error(), Some(libc::ENODEV) | Some(libc::ENXIO))
}

fn query_count(fd: RawFd, request: libc::c_ulong) -> io::Result<u8> {
    let mut count: u8 = 0;
    // SAFETY: the request writes exactly one byte into `count`.
    let rc = unsafe { libc::ioctl(fd, request as _, &mut count as *mut u8) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(count)
}

fn query_name(fd: RawFd, len: usize) -> io::Result<String> {
    let len = len.clamp(16, IOC_SIZE_MAX);
    let mut buf = vec![0u8; len];
    // SAFETY: the request writes at most `len` bytes into `buf`.
    let rc = unsafe { libc::ioctl(fd, jsiocgname(len) as _, buf.as_mut_ptr()) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }
    let written = (rc as usize).min(len);
    let end = buf[..written].iter().position(|&b| b == 0).unwrap_or(written);
    Ok(String::from_utf8_lossy(&buf[..end]).into_owned())
}

/// Wait until `fd` is readable, has hung up, or `timeout` passes.
///
/// Error and hang-up conditions count as readable so the following read
/// reports them.
fn poll_readable(fd: RawFd, timeout: Duration) -> io::Result<bool> {
    let mut pfd = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    let ms = timeout.as_millis().min(libc::c_int::MAX as u128) as libc::c_int;

    // SAFETY: `pfd` is a single valid pollfd for the duration of the call.
    let rc = unsafe { libc::poll(&mut pfd, 1, ms) };
    if rc < 0 {
        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::Interrupted {
            return Ok(false);
        }
        return Err(err);
    }
    let ready = libc::POLLIN | libc::POLLERR | libc::POLLHUP | libc::POLLNVAL;
    Ok(rc > 0 && pfd.revents & ready != 0)
}

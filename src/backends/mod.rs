//! Platform backends for `stickpoll`.
//!
//! Each backend provides one [`EventSource`](crate::device::EventSource)
//! implementation and an `open_source(id, config)` function. Exactly one is
//! compiled in, selected by target OS:
//! - **Linux**: `/dev/input/js{id}` via the kernel joystick API ([`linux`]).
//! - **Windows**: winmm joystick ids via `joyGetPosEx` ([`windows`]).
//!
//! Other targets build the platform-independent core only; [`crate::open`]
//! is not available there.

#[cfg(target_os = "linux")]
#[cfg_attr(docsrs, doc(cfg(target_os = "linux")))]
pub mod linux;

#[cfg(target_os = "windows")]
#[cfg_attr(docsrs, doc(cfg(target_os = "windows")))]
pub mod windows;

#[cfg(target_os = "linux")]
pub use linux::{open_source, LinuxSource as NativeSource};

#[cfg(target_os = "windows")]
pub use windows::{open_source, WinmmSource as NativeSource};

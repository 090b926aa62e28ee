//! stickpoll — polled joystick access for Rust.
//!
//! Open a joystick by numeric id, then either poll its accumulated state
//! ([`Joystick::read`]) or subscribe to raw events from a background reader
//! ([`JoystickChannelled::events`]).
//!
//! Linux (`/dev/input/js*`) and Windows (winmm) are supported.
//!
//! ```no_run
//! use stickpoll::Joystick;
//!
//! let mut js = stickpoll::open(0)?;
//! println!("Joystick Name: {}", js.name());
//! println!("   Axis Count: {}", js.axis_count());
//! println!(" Button Count: {}", js.button_count());
//!
//! let state = js.read()?;
//! println!("Axis Data: {:?}", state.axis_data);
//! js.close();
//! # Ok::<(), stickpoll::JoystickError>(())
//! ```

pub mod backends;
pub mod channel;
pub mod config;
pub mod device;
pub mod error;
pub mod event;
pub mod metadata;
pub mod state;
pub mod stream;

pub use channel::ChannelledDevice;
pub use config::JoystickConfig;
pub use device::{Device, EventSource, Joystick, JoystickChannelled};
pub use error::JoystickError;
pub use event::{decode, Event, InputKind};
pub use metadata::JoystickInfo;
pub use state::State;

#[cfg(any(target_os = "linux", target_os = "windows"))]
pub use backends::NativeSource;

/// Polled handle for the current platform.
#[cfg(any(target_os = "linux", target_os = "windows"))]
pub type NativeJoystick = Device<NativeSource>;

/// Open joystick `id` with the default configuration.
#[cfg(any(target_os = "linux", target_os = "windows"))]
pub fn open(id: u32) -> Result<NativeJoystick, JoystickError> {
    open_with(id, &JoystickConfig::default())
}

#[cfg(any(target_os = "linux", target_os = "windows"))]
pub fn open_with(id: u32, config: &JoystickConfig) -> Result<NativeJoystick, JoystickError> {
    let (source, info) = backends::open_source(id, config)?;
    Ok(Device::new(source, info))
}

/// Open joystick `id` and start a background event reader.
#[cfg(any(target_os = "linux", target_os = "windows"))]
pub fn open_channelled(id: u32) -> Result<ChannelledDevice, JoystickError> {
    open_channelled_with(id, &JoystickConfig::default())
}

#[cfg(any(target_os = "linux", target_os = "windows"))]
pub fn open_channelled_with(
    id: u32,
    config: &JoystickConfig,
) -> Result<ChannelledDevice, JoystickError> {
    let (source, info) = backends::open_source(id, config)?;
    ChannelledDevice::spawn(source, info, config.wait_timeout())
}

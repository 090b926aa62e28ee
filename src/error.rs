//! Error type shared by every backend.
//!
//! Open-time failures are split by stage (path resolution, open, metadata query)
//! so callers can tell "no such joystick" apart from "joystick exists but we
//! can't use it". Runtime failures are always [`JoystickError::ReadFailed`];
//! on every supported platform that is how an unplugged device shows up.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JoystickError {
    /// No device exists for this id.
    #[error("joystick {id} not found ({path})")]
    DeviceNotFound { id: u32, path: String },

    /// The device exists but could not be opened (permissions, exclusive holder, ...).
    #[error("failed to open joystick {id} ({path}): {source}")]
    OpenFailed {
        id: u32,
        path: String,
        #[source]
        source: io::Error,
    },

    /// Opened, but one of the open-time metadata queries failed.
    #[error("failed to query {query} for joystick {id}: {source}")]
    MetadataQueryFailed {
        id: u32,
        query: &'static str,
        #[source]
        source: io::Error,
    },

    /// I/O failure while reading events. Usually means the device was disconnected.
    #[error("joystick read failed: {0}")]
    ReadFailed(#[source] io::Error),

    /// The handle was closed with [`Joystick::close`](crate::Joystick::close).
    #[error("joystick handle is closed")]
    Closed,

    /// The background event reader thread could not be started.
    #[error("failed to spawn event reader: {0}")]
    Spawn(#[source] io::Error),

    #[error("invalid joystick config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("failed to read joystick config {path:?}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl JoystickError {
    /// `true` for runtime read failures (typically a disconnect).
    pub fn is_read_failure(&self) -> bool {
        matches!(self, JoystickError::ReadFailed(_))
    }
}

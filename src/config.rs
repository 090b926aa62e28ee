//! Open-time configuration.
//!
//! Everything has a default, so most callers never build a config themselves:
//! [`open`](crate::open) uses [`JoystickConfig::default`]. A TOML file only needs
//! the keys it changes:
//!
//! ```toml
//! device_path = "/dev/input/by-id/js{id}"
//! wait_timeout_ms = 20
//! ```

use crate::error::JoystickError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Placeholder replaced by the numeric id in [`JoystickConfig::device_path`].
pub const ID_PLACEHOLDER: &str = "{id}";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JoystickConfig {
    /// Device node pattern for the Linux backend. Ignored on Windows, where
    /// ids map directly to winmm joystick ids.
    pub device_path: String,

    /// Longest time the background reader blocks before re-checking for
    /// shutdown, in milliseconds. Also the polling period on Windows.
    pub wait_timeout_ms: u64,

    /// Buffer size for the device name query.
    pub name_len: usize,
}

impl Default for JoystickConfig {
    fn default() -> Self {
        Self {
            device_path: "/dev/input/js{id}".to_string(),
            wait_timeout_ms: 50,
            name_len: 128,
        }
    }
}

impl JoystickConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, JoystickError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, JoystickError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| JoystickError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Resolve `id` to a device path.
    pub fn device_path(&self, id: u32) -> String {
        self.device_path.replace(ID_PLACEHOLDER, &id.to_string())
    }

    /// Reader wait interval, never shorter than 1 ms.
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_resolve_indexed_paths() {
        let cfg = JoystickConfig::default();
        assert_eq!(cfg.device_path(0), "/dev/input/js0");
        assert_eq!(cfg.device_path(12), "/dev/input/js12");
        assert_eq!(cfg.wait_timeout(), Duration::from_millis(50));
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let cfg = JoystickConfig::from_toml_str("wait_timeout_ms = 0\n").unwrap();
        assert_eq!(cfg.wait_timeout(), Duration::from_millis(1));
        assert_eq!(cfg.device_path, JoystickConfig::default().device_path);
        assert_eq!(cfg.name_len, 128);
    }

    #[test]
    fn bad_toml_is_a_config_error() {
        let err = JoystickConfig::from_toml_str("wait_timeout_ms = \"soon\"").unwrap_err();
        assert!(matches!(err, JoystickError::Config(_)));
    }

    #[test]
    fn missing_file_is_reported_with_its_path() {
        let err = JoystickConfig::load("/nonexistent/stickpoll.toml").unwrap_err();
        match err {
            JoystickError::ConfigIo { path, .. } => {
                assert_eq!(path, Path::new("/nonexistent/stickpoll.toml"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

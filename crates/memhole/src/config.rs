//! Connection configuration.
//!
//! The device node path is fixed by the kernel module, so the defaults are
//! what almost every caller wants. Overriding the path is useful for device
//! nodes created in non-standard locations (containers, chroots).

use std::path::PathBuf;

use serde::Deserialize;

/// Well-known path of the memhole device node
pub const DEVICE_PATH: &str = "/dev/memhole";

/// Configuration for a [`Connection`](crate::Connection)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Path of the device node
    pub device_path: PathBuf,
    /// Open the device read-write instead of read-only
    pub write_access: bool,
    /// Keep the handle from leaking into `exec`ed children
    pub close_on_exec: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            device_path: PathBuf::from(DEVICE_PATH),
            write_access: false,
            close_on_exec: true,
        }
    }
}

impl ConnectionConfig {
    /// Create a new configuration builder
    pub fn builder() -> ConnectionConfigBuilder {
        ConnectionConfigBuilder::default()
    }
}

/// Builder for ConnectionConfig
#[derive(Debug, Clone, Default)]
pub struct ConnectionConfigBuilder {
    device_path: Option<PathBuf>,
    write_access: Option<bool>,
    close_on_exec: Option<bool>,
}

impl ConnectionConfigBuilder {
    /// Set the device node path
    pub fn device_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.device_path = Some(path.into());
        self
    }

    /// Request read-write access
    pub fn write_access(mut self, enabled: bool) -> Self {
        self.write_access = Some(enabled);
        self
    }

    /// Set `O_CLOEXEC` on the opened handle
    pub fn close_on_exec(mut self, enabled: bool) -> Self {
        self.close_on_exec = Some(enabled);
        self
    }

    /// Build the configuration
    pub fn build(self) -> ConnectionConfig {
        let default = ConnectionConfig::default();
        ConnectionConfig {
            device_path: self.device_path.unwrap_or(default.device_path),
            write_access: self.write_access.unwrap_or(default.write_access),
            close_on_exec: self.close_on_exec.unwrap_or(default.close_on_exec),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConnectionConfig::default();
        assert_eq!(config.device_path, PathBuf::from("/dev/memhole"));
        assert!(!config.write_access);
        assert!(config.close_on_exec);
    }

    #[test]
    fn test_builder_overrides() {
        let config = ConnectionConfig::builder()
            .device_path("/tmp/memhole")
            .write_access(true)
            .build();
        assert_eq!(config.device_path, PathBuf::from("/tmp/memhole"));
        assert!(config.write_access);
        assert!(config.close_on_exec);
    }

    #[test]
    fn test_empty_builder_matches_default() {
        assert_eq!(ConnectionConfig::builder().build(), ConnectionConfig::default());
    }
}

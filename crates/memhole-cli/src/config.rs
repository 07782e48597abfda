//! CLI configuration file.
//!
//! ```toml
//! device_path = "/dev/memhole"
//! write_access = false
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use memhole::ConnectionConfig;
use tracing::debug;

/// Default config file location (`$XDG_CONFIG_HOME/memhole/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("memhole").join("config.toml"))
}

/// Load a connection config from `path`, falling back to defaults when the
/// file does not exist.
pub fn load(path: &Path) -> Result<ConnectionConfig> {
    if !path.exists() {
        debug!("No config file at {}, using defaults", path.display());
        return Ok(ConnectionConfig::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: ConnectionConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// Resolve the effective config: file (explicit or default path), then flags
pub fn resolve(
    explicit: Option<&Path>,
    device: Option<&Path>,
    write_access: bool,
) -> Result<ConnectionConfig> {
    let base = match explicit.map(Path::to_path_buf).or_else(default_config_path) {
        Some(path) => load(&path)?,
        None => ConnectionConfig::default(),
    };

    Ok(ConnectionConfig::builder()
        .device_path(device.map(Path::to_path_buf).unwrap_or(base.device_path))
        .write_access(write_access || base.write_access)
        .close_on_exec(base.close_on_exec)
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, ConnectionConfig::default());
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "write_access = true\n").unwrap();

        let config = load(&path).unwrap();
        assert!(config.write_access);
        assert_eq!(config.device_path, PathBuf::from("/dev/memhole"));
    }

    #[test]
    fn test_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "write_access = \"maybe\"\n").unwrap();
        assert!(load(&path).is_err());
    }

    #[test]
    fn test_flags_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "device_path = \"/srv/memhole\"\n").unwrap();

        let config = resolve(Some(path.as_path()), Some(Path::new("/tmp/memhole")), true).unwrap();
        assert_eq!(config.device_path, PathBuf::from("/tmp/memhole"));
        assert!(config.write_access);

        let config = resolve(Some(path.as_path()), None, false).unwrap();
        assert_eq!(config.device_path, PathBuf::from("/srv/memhole"));
        assert!(!config.write_access);
    }
}

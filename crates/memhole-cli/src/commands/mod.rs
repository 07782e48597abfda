//! CLI command implementations.

pub mod dump;
pub mod hex_utils;
pub mod hexdump;
pub mod pointer;
pub mod status;
pub mod write;

use anyhow::{Context, Result};
use memhole::{Connection, ConnectionConfig, SystemConnection};
use tracing::{info, warn};

/// Connect to the device and attach to `pid`
pub fn open_session(config: &ConnectionConfig, pid: i32) -> Result<SystemConnection> {
    let mut conn = Connection::with_config(config.clone());
    conn.connect()
        .with_context(|| format!("Failed to connect to {}", config.device_path.display()))?;

    let token = match conn.attach(pid) {
        Ok(token) => token,
        Err(e) => {
            close_session(&mut conn);
            return Err(e).with_context(|| format!("Failed to attach to pid {}", pid));
        }
    };
    info!("Attached to pid {} (token {})", pid, token);
    Ok(conn)
}

/// Disconnect, logging rather than failing on a close error
pub fn close_session(conn: &mut SystemConnection) {
    if let Err(e) = conn.disconnect() {
        warn!("Failed to disconnect cleanly: {}", e);
    }
}

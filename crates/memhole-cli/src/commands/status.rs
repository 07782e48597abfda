//! Status command implementation.
//!
//! Connects, attaches and reports what the device says about the target.

use anyhow::{Context, Result};
use memhole::{AccessMode, Connection, ConnectionConfig};

use super::close_session;

/// Run the status command
pub fn run(config: &ConnectionConfig, pid: i32) -> Result<()> {
    println!("Device:  {}", config.device_path.display());
    println!(
        "Access:  {}",
        AccessMode::from_write_access(config.write_access)
    );

    let mut conn = Connection::with_config(config.clone());
    conn.connect().context("Failed to connect")?;

    let result = (|| -> Result<()> {
        let token = conn
            .attach(pid)
            .with_context(|| format!("Failed to attach to pid {}", pid))?;
        println!("Pid:     {}", pid);
        println!("Token:   {}", token);

        let cursor = conn.get_position().context("Failed to query cursor")?;
        println!("Cursor:  0x{:X}", cursor);
        Ok(())
    })();

    close_session(&mut conn);
    result
}

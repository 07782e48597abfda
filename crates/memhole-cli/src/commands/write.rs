//! Write command implementation.

use anyhow::{Result, bail};
use memhole::ConnectionConfig;
use tracing::info;

use super::{close_session, open_session};

/// Run the write command
pub fn run(config: &ConnectionConfig, pid: i32, address: u64, data: &[u8]) -> Result<()> {
    if !config.write_access {
        bail!("Writing requires --write (or write_access = true in the config file)");
    }

    let mut conn = open_session(config, pid)?;
    let result = conn.write_bytes(address, data);
    close_session(&mut conn);
    result?;

    info!("Wrote {} bytes to 0x{:X} in pid {}", data.len(), address, pid);
    println!("Wrote {} bytes to 0x{:X}", data.len(), address);
    Ok(())
}

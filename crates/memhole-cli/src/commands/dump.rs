//! Dump command implementation.
//!
//! Copies a range of the target's memory into a file.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use memhole::{ConnectionConfig, ReadMemory};
use tracing::warn;

use super::{close_session, open_session};

/// Run the dump command
pub fn run(config: &ConnectionConfig, pid: i32, address: u64, len: usize, output: &Path) -> Result<()> {
    let mut conn = open_session(config, pid)?;
    let bytes = conn.read_bytes(address, len);
    close_session(&mut conn);
    let bytes = bytes?;

    if bytes.len() < len {
        warn!("Short read: got {} of {} bytes", bytes.len(), len);
    }

    fs::write(output, &bytes)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!(
        "Dumped {} bytes from 0x{:X} to {}",
        bytes.len(),
        address,
        output.display()
    );
    Ok(())
}

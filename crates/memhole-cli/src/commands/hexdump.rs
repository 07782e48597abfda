//! Hexdump command implementation.

use anyhow::{Result, bail};
use memhole::{ConnectionConfig, ReadMemory};

use super::hex_utils::format_hexdump;
use super::{close_session, open_session};

/// Run the hexdump command
pub fn run(config: &ConnectionConfig, pid: i32, address: u64, size: usize, ascii: bool) -> Result<()> {
    let mut conn = open_session(config, pid)?;
    let bytes = conn.read_bytes(address, size);
    close_session(&mut conn);
    let bytes = bytes?;

    if bytes.is_empty() {
        bail!("No bytes read at 0x{:X}", address);
    }

    println!("Hexdump at 0x{:X} ({} of {} bytes):", address, bytes.len(), size);
    println!();
    print!("{}", format_hexdump(address, &bytes, ascii));
    Ok(())
}

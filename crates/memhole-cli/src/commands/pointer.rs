//! Pointer command implementation.
//!
//! Reads the 8-byte pointer stored at `base`, adds `offset`, and dumps the
//! memory it points at.

use anyhow::Result;
use memhole::{ConnectionConfig, ReadMemory};

use super::hex_utils::format_hexdump;
use super::{close_session, open_session};

/// Run the pointer command
pub fn run(config: &ConnectionConfig, pid: i32, base: u64, offset: u64, size: usize) -> Result<()> {
    let mut conn = open_session(config, pid)?;
    let result = (|| -> Result<(u64, Vec<u8>)> {
        let target = conn.follow_pointer(base, offset)?;
        let bytes = conn.read_bytes(target, size)?;
        Ok((target, bytes))
    })();
    close_session(&mut conn);
    let (target, bytes) = result?;

    println!("[0x{:X}] + 0x{:X} = 0x{:X}", base, offset, target);
    println!();
    print!("{}", format_hexdump(target, &bytes, true));
    Ok(())
}

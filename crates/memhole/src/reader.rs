use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::process::ProcessProvider;
use crate::transport::Device;

/// Address-based reads on top of the cursor protocol
pub trait ReadMemory {
    /// Read up to `len` bytes at `address`. Short reads are trimmed.
    fn read_bytes(&mut self, address: u64, len: usize) -> Result<Vec<u8>>;

    /// Read exactly `N` bytes; a short read is an `InvalidDevice` error.
    fn read_array<const N: usize>(&mut self, address: u64) -> Result<[u8; N]> {
        let bytes = self.read_bytes(address, N)?;
        bytes.try_into().map_err(|_| Error::InvalidDevice)
    }

    fn read_u32(&mut self, address: u64) -> Result<u32> {
        self.read_array(address).map(u32::from_le_bytes)
    }

    fn read_i32(&mut self, address: u64) -> Result<i32> {
        self.read_array(address).map(i32::from_le_bytes)
    }

    fn read_u64(&mut self, address: u64) -> Result<u64> {
        self.read_array(address).map(u64::from_le_bytes)
    }

    /// Read a pointer at `base` and add `offset` to it
    fn follow_pointer(&mut self, base: u64, offset: u64) -> Result<u64> {
        Ok(self.read_u64(base)?.wrapping_add(offset))
    }
}

impl<D: Device, P: ProcessProvider> ReadMemory for Connection<D, P> {
    fn read_bytes(&mut self, address: u64, len: usize) -> Result<Vec<u8>> {
        self.set_position(address as i64)?;
        self.set_buffer_size(len as i64)?;
        self.read_at_cursor(len)
    }
}

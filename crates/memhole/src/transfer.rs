//! Memory transfers at the current cursor.
//!
//! The device advances its cursor by the number of bytes moved; nothing here
//! tracks it.

use tracing::{debug, warn};

use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::process::ProcessProvider;
use crate::transport::{Device, Transport};

impl<D: Device, P: ProcessProvider> Connection<D, P> {
    /// Ensure the device can take a transfer of `len` bytes.
    ///
    /// See [`BufferSizeCache`](crate::BufferSizeCache) for when this
    /// actually reaches the device.
    pub fn set_buffer_size(&mut self, len: i64) -> Result<()> {
        let buffer = self.buffer;
        let handle = self.handle_mut()?;
        buffer.ensure_capacity(handle, len)
    }

    /// Read up to `len` bytes at the cursor.
    ///
    /// Returns `None` on any failure, including not being connected. A short
    /// read from the device yields a correspondingly shorter buffer.
    pub fn read_memory(&mut self, len: usize) -> Option<Vec<u8>> {
        if !self.is_connected() {
            return None;
        }
        if let Err(e) = self.set_buffer_size(len as i64) {
            debug!("Read of {} bytes abandoned: {}", len, e);
            return None;
        }
        self.read_at_cursor(len).ok()
    }

    /// Write all of `data` at the cursor.
    ///
    /// Partial writes are not detected; only a transport fault is reported.
    pub fn write_memory(&mut self, data: &[u8]) -> Result<()> {
        if !self.is_connected() {
            return Err(Error::InvalidDevice);
        }
        self.set_buffer_size(data.len() as i64)
            .map_err(|_| Error::AllocationFailure)?;

        let handle = self.handle_mut()?;
        match handle.write(data) {
            Ok(written) => {
                debug!("Wrote {} of {} bytes", written, data.len());
                Ok(())
            }
            Err(e) => {
                warn!("Write of {} bytes failed: {}", data.len(), e);
                Err(Error::InvalidDevice)
            }
        }
    }

    /// Position the cursor at `address` and write `data` there
    pub fn write_bytes(&mut self, address: u64, data: &[u8]) -> Result<()> {
        self.set_position(address as i64)?;
        self.write_memory(data)
    }

    /// Raw read of `len` bytes, trimmed to what the device returned
    pub(crate) fn read_at_cursor(&mut self, len: usize) -> Result<Vec<u8>> {
        let handle = self.handle_mut()?;
        let mut buf = vec![0u8; len];
        match handle.read(&mut buf) {
            Ok(read) => {
                if read < len {
                    debug!("Short read: {} of {} bytes", read, len);
                }
                buf.truncate(read);
                Ok(buf)
            }
            Err(e) => {
                warn!("Read of {} bytes failed: {}", len, e);
                Err(Error::InvalidDevice)
            }
        }
    }
}

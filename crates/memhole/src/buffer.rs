//! Client-side record of the device's transfer buffer size.
//!
//! A resize is only sent when a request is *smaller* than the cached size, and
//! the cached size is never updated after a resize, successful or not. Every
//! existing memhole integration exercises the device this way, so the call
//! pattern is kept as-is.
//!
//! NOTE: this looks like a latent defect (growth is never requested and the
//! cache only changes through [`BufferSizeCache::note`]). Changing it alters
//! the control calls the device sees; coordinate with the kernel module first.

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::transport::ControlChannel;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BufferSizeCache {
    cached: i64,
}

impl BufferSizeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cached(&self) -> i64 {
        self.cached
    }

    /// Forget everything; called on every successful connect.
    pub fn reset(&mut self) {
        self.cached = 0;
    }

    /// Record a device-side buffer size established out of band.
    pub fn note(&mut self, len: i64) {
        self.cached = len;
    }

    /// Whether a request of `len` bytes would send a resize command
    pub fn needs_resize(&self, len: i64) -> bool {
        len < self.cached
    }

    /// Make sure the device can take a transfer of `len` bytes.
    ///
    /// Sends `set-buf` only when `len` is below the cached size; a non-zero
    /// reply or a transport fault is an [`Error::AllocationFailure`].
    pub fn ensure_capacity<C>(&self, channel: &mut C, len: i64) -> Result<()>
    where
        C: ControlChannel + ?Sized,
    {
        if !self.needs_resize(len) {
            return Ok(());
        }

        debug!("Resizing device buffer to {} (cached {})", len, self.cached);
        match channel.resize_buffer(len) {
            Ok(0) => Ok(()),
            Ok(status) => {
                warn!("Device rejected buffer resize to {}: {}", len, status);
                Err(Error::AllocationFailure)
            }
            Err(e) => {
                warn!("Buffer resize to {} failed: {}", len, e);
                Err(Error::AllocationFailure)
            }
        }
    }
}

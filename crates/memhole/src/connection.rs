//! Connection lifecycle.
//!
//! A [`Connection`] is either disconnected or holds exactly one open handle
//! to the device. `connect` and `disconnect` are the only transitions; every
//! other operation requires a handle and fails with
//! [`Error::InvalidDevice`] without one.
//!
//! The device admits one open handle system-wide. A second client sees its
//! open fail, which surfaces here as [`Error::DeviceBusy`].

use tracing::{debug, info, warn};

use crate::buffer::BufferSizeCache;
use crate::config::ConnectionConfig;
use crate::device::DeviceNode;
use crate::error::{Error, Result};
use crate::process::{ProcessProvider, SystemProcesses};
use crate::transport::{AccessMode, Device, Transport};

/// Client connection to the memhole device.
///
/// Not internally synchronized: callers sharing one across threads must
/// serialize access themselves.
pub struct Connection<D: Device, P: ProcessProvider> {
    pub(crate) device: D,
    pub(crate) processes: P,
    write_access: bool,
    pub(crate) handle: Option<D::Handle>,
    pub(crate) buffer: BufferSizeCache,
    pub(crate) attached_pid: Option<i32>,
}

/// Connection to the real device node, validating pids against the host
pub type SystemConnection = Connection<DeviceNode, SystemProcesses>;

impl Connection<DeviceNode, SystemProcesses> {
    /// Connection to `/dev/memhole` with the given access mode
    pub fn new(write_access: bool) -> Self {
        Self::with_config(
            ConnectionConfig::builder()
                .write_access(write_access)
                .build(),
        )
    }

    pub fn with_config(config: ConnectionConfig) -> Self {
        Self::with_parts(
            DeviceNode::from_config(&config),
            SystemProcesses,
            config.write_access,
        )
    }
}

impl<D: Device, P: ProcessProvider> Connection<D, P> {
    /// Build a connection from explicit collaborators
    pub fn with_parts(device: D, processes: P, write_access: bool) -> Self {
        Self {
            device,
            processes,
            write_access,
            handle: None,
            buffer: BufferSizeCache::new(),
            attached_pid: None,
        }
    }

    /// Open the device.
    ///
    /// Fails with `InvalidDevice` when already connected, `DeviceNotFound`
    /// when the node is missing, and `DeviceBusy` when the open fails.
    pub fn connect(&mut self) -> Result<()> {
        if self.handle.is_some() {
            return Err(Error::InvalidDevice);
        }
        if !self.device.exists() {
            return Err(Error::DeviceNotFound);
        }

        let access = AccessMode::from_write_access(self.write_access);
        let handle = self.device.open(access).map_err(|e| {
            debug!("Failed to open device ({}): {}", access, e);
            Error::DeviceBusy
        })?;

        self.handle = Some(handle);
        self.buffer.reset();
        self.attached_pid = None;
        info!("Connected to memhole device ({})", access);
        Ok(())
    }

    /// Close the device.
    ///
    /// If closing fails the connection stays open so the caller can retry.
    pub fn disconnect(&mut self) -> Result<()> {
        let handle = self.handle.as_mut().ok_or(Error::InvalidDevice)?;
        if let Err(e) = handle.close() {
            warn!("Failed to close memhole device: {}", e);
            return Err(Error::InvalidDevice);
        }

        self.handle = None;
        self.attached_pid = None;
        info!("Disconnected from memhole device");
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.handle.is_some()
    }

    pub fn write_access(&self) -> bool {
        self.write_access
    }

    /// Target of the last successful attach on this connection
    pub fn attached_pid(&self) -> Option<i32> {
        self.attached_pid
    }

    pub fn cached_buffer_size(&self) -> i64 {
        self.buffer.cached()
    }

    /// Record a device buffer size configured outside this connection.
    ///
    /// Later transfers shorter than `len` will ask the device to shrink.
    pub fn note_buffer_size(&mut self, len: i64) {
        self.buffer.note(len);
    }

    pub(crate) fn handle_mut(&mut self) -> Result<&mut D::Handle> {
        self.handle.as_mut().ok_or(Error::InvalidDevice)
    }
}

impl<D: Device, P: ProcessProvider> Drop for Connection<D, P> {
    fn drop(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            if let Err(e) = handle.close() {
                debug!("Failed to close memhole device on drop: {}", e);
            }
        }
    }
}

impl<D: Device, P: ProcessProvider> std::fmt::Debug for Connection<D, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("connected", &self.is_connected())
            .field("write_access", &self.write_access)
            .field("attached_pid", &self.attached_pid)
            .field("cached_buffer_size", &self.buffer.cached())
            .finish()
    }
}

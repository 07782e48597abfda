//! Attach and cursor control commands.

use std::fmt;

use tracing::{debug, info, warn};

use crate::connection::Connection;
use crate::error::{Error, Result, check_status};
use crate::process::ProcessProvider;
use crate::transport::{ControlChannel, Device};

/// Opaque value returned by the device for a successful attach.
///
/// The device guarantees only that it is non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttachToken(i64);

impl AttachToken {
    pub fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for AttachToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl<D: Device, P: ProcessProvider> Connection<D, P> {
    /// Bind the connection to a target process.
    ///
    /// The pid is checked against the process provider before the device is
    /// contacted. A zero reply from the device is treated as a rejection.
    pub fn attach(&mut self, pid: i32) -> Result<AttachToken> {
        if !self.is_connected() {
            return Err(Error::InvalidDevice);
        }
        if !self.processes.exists(pid) {
            debug!("Refusing to attach to missing pid {}", pid);
            return Err(Error::InvalidPid);
        }

        let handle = self.handle_mut()?;
        let raw = handle.set_pid(pid).map_err(|e| {
            warn!("set-pid {} failed: {}", pid, e);
            Error::InvalidPid
        })?;

        // TODO: a legitimate attach that yields 0 is indistinguishable from a
        // rejection until the kernel module documents its reply values.
        if raw == 0 {
            return Err(Error::InvalidPid);
        }
        if let Some(err) = Error::from_status(raw) {
            return Err(err);
        }

        self.attached_pid = Some(pid);
        info!("Attached to pid {}", pid);
        Ok(AttachToken(raw))
    }

    /// Move the cursor to `position` in the attached process.
    ///
    /// Returns the device's raw reply, which is only meaningful as "success".
    pub fn set_position(&mut self, position: i64) -> Result<i64> {
        let handle = self.handle_mut()?;
        let raw = handle.set_position(position).map_err(|e| {
            warn!("set-pos {:#x} failed: {}", position, e);
            Error::InvalidDevice
        })?;
        debug!("set-pos {:#x} -> {}", position, raw);
        check_status(raw, Error::InvalidDevice)
    }

    /// Current cursor in the attached process
    pub fn get_position(&mut self) -> Result<i64> {
        let handle = self.handle_mut()?;
        let raw = handle.get_position().map_err(|e| {
            warn!("get-pos failed: {}", e);
            Error::InvalidDevice
        })?;
        check_status(raw, Error::InvalidDevice)
    }
}

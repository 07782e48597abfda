//! Byte-stream transport to the memhole device.
//!
//! The device overloads `lseek(2)`: the `whence` argument selects a control
//! command and the offset carries its operand. [`ControlChannel`] is the only
//! place those modes are chosen; everything above it speaks in commands.
//!
//! | mode | command | offset | result |
//! |------|---------|--------|--------|
//! | 0 | `SetPid` | target pid | non-zero on success |
//! | 1 | `SetPos` | absolute address | implementation defined |
//! | 2 | `GetPos` | ignored (0) | current cursor |
//! | 3 | `SetBuf` | buffer length | 0 on success |

use std::io;

use strum::{Display, FromRepr, IntoStaticStr};

/// Control commands multiplexed over the seek `whence` argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr, IntoStaticStr, Display)]
#[repr(i32)]
pub enum ControlCommand {
    #[strum(serialize = "set-pid")]
    SetPid = 0,
    #[strum(serialize = "set-pos")]
    SetPos = 1,
    #[strum(serialize = "get-pos")]
    GetPos = 2,
    #[strum(serialize = "set-buf")]
    SetBuf = 3,
}

impl ControlCommand {
    /// Raw `whence` value passed to the device
    pub fn mode(self) -> i32 {
        self as i32
    }

    pub fn from_mode(mode: i32) -> Option<Self> {
        Self::from_repr(mode)
    }
}

/// How the device handle is opened. Fixed for the life of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum AccessMode {
    #[strum(serialize = "read-only")]
    ReadOnly,
    #[strum(serialize = "read-write")]
    ReadWrite,
}

impl AccessMode {
    pub fn from_write_access(write_access: bool) -> Self {
        if write_access {
            AccessMode::ReadWrite
        } else {
            AccessMode::ReadOnly
        }
    }
}

/// An open handle to the device.
///
/// `seek` returns the device's raw status: a non-negative value, or a negated
/// error discriminant. `Err` is reserved for faults of the handle itself.
pub trait Transport {
    fn seek(&mut self, command: ControlCommand, offset: i64) -> io::Result<i64>;

    /// Read at the current cursor. May return fewer bytes than requested.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write at the current cursor.
    fn write(&mut self, data: &[u8]) -> io::Result<usize>;

    /// Release the handle. On failure the handle must be treated as still held.
    fn close(&mut self) -> io::Result<()>;
}

/// Typed control commands over a [`Transport`]
pub trait ControlChannel: Transport {
    /// Bind the handle to a target process
    fn set_pid(&mut self, pid: i32) -> io::Result<i64> {
        self.seek(ControlCommand::SetPid, i64::from(pid))
    }

    /// Move the cursor to an absolute address
    fn set_position(&mut self, position: i64) -> io::Result<i64> {
        self.seek(ControlCommand::SetPos, position)
    }

    fn get_position(&mut self) -> io::Result<i64> {
        self.seek(ControlCommand::GetPos, 0)
    }

    /// Ask the device to resize its transfer buffer
    fn resize_buffer(&mut self, len: i64) -> io::Result<i64> {
        self.seek(ControlCommand::SetBuf, len)
    }
}

impl<T: Transport + ?Sized> ControlChannel for T {}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn seek(&mut self, command: ControlCommand, offset: i64) -> io::Result<i64> {
        (**self).seek(command, offset)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read(buf)
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        (**self).write(data)
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

/// A device node that can be opened into a [`Transport`]
pub trait Device {
    type Handle: Transport;

    /// Whether the device node is present at all
    fn exists(&self) -> bool;

    /// Open a handle. Fails when the device is held by another client.
    fn open(&self, access: AccessMode) -> io::Result<Self::Handle>;
}

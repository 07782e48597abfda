//! # memhole
//!
//! Client library for the memhole kernel module, which exposes another
//! process's memory through the `/dev/memhole` device node.
//!
//! The device multiplexes two protocols over one handle:
//! - **Control**: attach to a pid, move or query the cursor, and resize the
//!   device's transfer buffer, all encoded as `lseek` calls whose `whence`
//!   selects the command
//! - **Data**: plain `read`/`write` at the current cursor
//!
//! Only one handle to the device may be open system-wide. Linux only.
//!
//! ## Example
//!
//! ```ignore
//! use memhole::{Connection, ReadMemory};
//!
//! let mut conn = Connection::new(false);
//! conn.connect()?;
//! conn.attach(pid)?;
//! conn.set_position(0x1000)?;
//! let bytes = conn.read_memory(16);
//! let health = conn.read_i32(0x7f00_0000_1138)?;
//! conn.disconnect()?;
//! ```

mod buffer;
pub mod config;
mod connection;
mod control;
mod device;
pub mod error;
mod process;
mod reader;
mod transfer;
pub mod transport;

// Test doubles for the device and process table (used by unit and integration tests)
#[doc(hidden)]
pub mod mock;

pub use buffer::BufferSizeCache;
pub use config::{ConnectionConfig, ConnectionConfigBuilder, DEVICE_PATH};
pub use connection::{Connection, SystemConnection};
pub use control::AttachToken;
pub use device::{DeviceFile, DeviceNode};
pub use error::{Error, Result, check_status};
pub use process::{ProcessProvider, SystemProcesses};
pub use reader::ReadMemory;
pub use transport::{AccessMode, ControlChannel, ControlCommand, Device, Transport};

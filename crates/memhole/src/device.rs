//! The real `/dev/memhole` device node.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::fd::{AsRawFd, IntoRawFd};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::ConnectionConfig;
use crate::error::Error;
use crate::transport::{AccessMode, ControlCommand, Device, Transport};

/// Device node at a filesystem path
#[derive(Debug, Clone)]
pub struct DeviceNode {
    path: PathBuf,
    close_on_exec: bool,
}

impl DeviceNode {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            close_on_exec: true,
        }
    }

    pub fn from_config(config: &ConnectionConfig) -> Self {
        Self {
            path: config.device_path.clone(),
            close_on_exec: config.close_on_exec,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for DeviceNode {
    fn default() -> Self {
        Self::from_config(&ConnectionConfig::default())
    }
}

impl Device for DeviceNode {
    type Handle = DeviceFile;

    fn exists(&self) -> bool {
        self.path.exists()
    }

    fn open(&self, access: AccessMode) -> io::Result<DeviceFile> {
        let mut options = OpenOptions::new();
        options.read(true);
        if access == AccessMode::ReadWrite {
            options.write(true);
        }

        // std always opens with O_CLOEXEC; clear it when the handle should
        // survive exec.
        let file = options.open(&self.path)?;
        if !self.close_on_exec {
            // SAFETY: the fd is valid and owned by `file`.
            if unsafe { libc::fcntl(file.as_raw_fd(), libc::F_SETFD, 0) } == -1 {
                return Err(io::Error::last_os_error());
            }
        }
        debug!("Opened {} ({})", self.path.display(), access);
        Ok(DeviceFile::new(file))
    }
}

/// Open handle to the device node
#[derive(Debug)]
pub struct DeviceFile {
    file: Option<File>,
    // close(2) failed; the kernel has already released the fd.
    close_failed: bool,
}

impl DeviceFile {
    fn new(file: File) -> Self {
        Self {
            file: Some(file),
            close_failed: false,
        }
    }

    fn file(&mut self) -> io::Result<&mut File> {
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::from_raw_os_error(libc::EBADF))
    }
}

/// Turn an `lseek` return into a raw device status.
///
/// Only -1 sets errno. Other negative values (a high-half address echoed by
/// set-pos) are the device's reply as-is. For -1, errno values that match a
/// protocol discriminant come back as negated statuses, anything else is a
/// fault of the handle.
fn seek_reply(ret: i64, last_error: impl FnOnce() -> io::Error) -> io::Result<i64> {
    if ret != -1 {
        return Ok(ret);
    }

    let err = last_error();
    match err.raw_os_error().map(i64::from) {
        Some(code) if Error::from_code(code).is_some() => Ok(-code),
        _ => Err(err),
    }
}

impl Transport for DeviceFile {
    fn seek(&mut self, command: ControlCommand, offset: i64) -> io::Result<i64> {
        let fd = self.file()?.as_raw_fd();
        // SAFETY: fd is owned by self.file and stays open for the duration of the call.
        let ret = unsafe { libc::lseek64(fd, offset as libc::off64_t, command.mode()) };
        seek_reply(ret, io::Error::last_os_error)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file()?.read(buf)
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.file()?.write(data)
    }

    fn close(&mut self) -> io::Result<()> {
        // Linux frees the fd even when close(2) fails, and it may already be
        // reused. Treat the retry as done rather than closing it again.
        if self.close_failed {
            self.close_failed = false;
            return Ok(());
        }

        let file = self
            .file
            .take()
            .ok_or_else(|| io::Error::from_raw_os_error(libc::EBADF))?;
        let fd = file.into_raw_fd();
        // SAFETY: fd came from into_raw_fd, so nothing else will close it.
        if unsafe { libc::close(fd) } != 0 {
            self.close_failed = true;
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::os::fd::FromRawFd;

    use super::*;
    use crate::connection::Connection;
    use crate::mock::MockProcesses;
    use crate::transport::ControlChannel;

    /// Move the handle's fd to a number nothing else will reuse, then close
    /// it underneath the handle so the next close(2) fails with EBADF.
    fn make_stale(handle: &mut DeviceFile) {
        let file = handle.file.take().unwrap();
        let high = unsafe { libc::fcntl(file.as_raw_fd(), libc::F_DUPFD_CLOEXEC, 1000) };
        assert!(high >= 1000);
        drop(file);
        assert_eq!(unsafe { libc::close(high) }, 0);
        handle.file = Some(unsafe { File::from_raw_fd(high) });
    }

    /// Device node whose handles are already closed underneath
    struct StaleNode(DeviceNode);

    impl Device for StaleNode {
        type Handle = DeviceFile;

        fn exists(&self) -> bool {
            self.0.exists()
        }

        fn open(&self, access: AccessMode) -> io::Result<DeviceFile> {
            let mut handle = self.0.open(access)?;
            make_stale(&mut handle);
            Ok(handle)
        }
    }

    #[test]
    fn test_missing_node_does_not_exist() {
        let dir = tempfile::tempdir().unwrap();
        let node = DeviceNode::new(dir.path().join("memhole"));
        assert!(!node.exists());
        assert!(node.open(AccessMode::ReadOnly).is_err());
    }

    #[test]
    fn test_default_path() {
        assert_eq!(DeviceNode::default().path(), Path::new("/dev/memhole"));
    }

    #[test]
    fn test_regular_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memhole");
        std::fs::write(&path, b"\x01\x02\x03\x04").unwrap();

        let node = DeviceNode::new(&path);
        assert!(node.exists());
        let mut handle = node.open(AccessMode::ReadOnly).unwrap();

        // On a regular file SEEK_CUR (mode 1) from 0 lands at the offset.
        assert_eq!(handle.set_position(2).unwrap(), 2);
        let mut buf = [0u8; 4];
        assert_eq!(Transport::read(&mut handle, &mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], &[0x03, 0x04]);

        handle.close().unwrap();
        assert!(handle.close().is_err());
        assert!(handle.get_position().is_err());
    }

    #[test]
    fn test_close_on_exec_flag() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memhole");
        std::fs::write(&path, b"").unwrap();

        for close_on_exec in [true, false] {
            let config = ConnectionConfig::builder()
                .device_path(&path)
                .close_on_exec(close_on_exec)
                .build();
            let mut handle = DeviceNode::from_config(&config)
                .open(AccessMode::ReadOnly)
                .unwrap();
            let fd = handle.file().unwrap().as_raw_fd();
            let flags = unsafe { libc::fcntl(fd, libc::F_GETFD) };
            assert_eq!(flags & libc::FD_CLOEXEC != 0, close_on_exec);
        }
    }

    #[test]
    fn test_read_only_handle_rejects_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memhole");
        std::fs::write(&path, b"").unwrap();

        let mut handle = DeviceNode::new(&path).open(AccessMode::ReadOnly).unwrap();
        assert!(Transport::write(&mut handle, &[0xAA]).is_err());
    }

    #[test]
    fn test_failed_close_is_not_retried_on_the_fd() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memhole");
        std::fs::write(&path, b"").unwrap();

        let mut handle = DeviceNode::new(&path).open(AccessMode::ReadOnly).unwrap();
        make_stale(&mut handle);

        let err = handle.close().unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::EBADF));
        assert!(handle.close().is_ok());
        assert!(handle.close().is_err());
    }

    #[test]
    fn test_connection_recovers_from_failed_close() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memhole");
        std::fs::write(&path, b"").unwrap();

        let node = StaleNode(DeviceNode::new(&path));
        let mut conn = Connection::with_parts(node, MockProcesses::default(), false);
        conn.connect().unwrap();

        assert_eq!(conn.disconnect(), Err(Error::InvalidDevice));
        assert!(conn.is_connected());

        assert_eq!(conn.disconnect(), Ok(()));
        assert!(!conn.is_connected());

        conn.connect().unwrap();
        assert!(conn.is_connected());
        conn.disconnect().unwrap_err();
        conn.disconnect().unwrap();
    }

    #[test]
    fn test_seek_reply_passes_non_errno_values() {
        let no_errno = || -> io::Error { panic!("errno must not be read") };
        assert_eq!(seek_reply(0x1000, no_errno).unwrap(), 0x1000);
        assert_eq!(seek_reply(0, no_errno).unwrap(), 0);

        let high_half = 0xffff_8000_0000_1000u64 as i64;
        let stale = || io::Error::from_raw_os_error(libc::EBUSY);
        assert_eq!(seek_reply(high_half, stale).unwrap(), high_half);
        assert_eq!(seek_reply(-32, stale).unwrap(), -32);
    }

    #[test]
    fn test_seek_reply_decodes_errno() {
        // EINTR (4), EBUSY (16) and EPIPE (32) share numbers with the discriminants.
        let reply = seek_reply(-1, || io::Error::from_raw_os_error(32)).unwrap();
        assert_eq!(Error::from_status(reply), Some(Error::InvalidPid));
        let reply = seek_reply(-1, || io::Error::from_raw_os_error(16)).unwrap();
        assert_eq!(Error::from_status(reply), Some(Error::DeviceBusy));

        let err = seek_reply(-1, || io::Error::from_raw_os_error(libc::EINVAL)).unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::EINVAL));
    }
}

//! Process existence lookup used to validate attach targets.

use std::io;

/// Answers "does process X exist" for attach validation
pub trait ProcessProvider {
    fn exists(&self, pid: i32) -> bool;
}

impl<P: ProcessProvider + ?Sized> ProcessProvider for &P {
    fn exists(&self, pid: i32) -> bool {
        (**self).exists(pid)
    }
}

/// Host processes, checked with `kill(pid, 0)`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcesses;

impl ProcessProvider for SystemProcesses {
    fn exists(&self, pid: i32) -> bool {
        // 0 and negative pids address process groups, not a single process.
        if pid <= 0 {
            return false;
        }
        // SAFETY: signal 0 performs only the existence and permission checks.
        if unsafe { libc::kill(pid, 0) } == 0 {
            return true;
        }
        // EPERM means the process exists but belongs to someone else.
        io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
    }
}

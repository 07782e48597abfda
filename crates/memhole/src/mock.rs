//! In-memory stand-ins for the device and the host process table.
//!
//! `MockDevice` hands out `MockTransport` handles that share one state, so a
//! test can keep a clone of the device and inspect every call a
//! [`Connection`](crate::Connection) made. Memory is stored per address and
//! reads of untouched addresses return zero.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::io;
use std::rc::Rc;

use crate::process::ProcessProvider;
use crate::transport::{AccessMode, ControlCommand, Device, Transport};

/// Value returned for `set-pid` unless overridden
pub const MOCK_ATTACH_TOKEN: i64 = 0x40_0000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Seek(ControlCommand, i64),
    Read(usize),
    Write(Vec<u8>),
    Close,
}

#[derive(Debug, Default)]
struct MockState {
    memory: BTreeMap<i64, u8>,
    cursor: i64,
    pid: Option<i32>,
    calls: Vec<MockCall>,
    replies: HashMap<ControlCommand, i64>,
    fail_seeks: bool,
    fail_data: bool,
    close_failures: u32,
    read_limit: Option<usize>,
    write_limit: Option<usize>,
    present: bool,
    busy: bool,
    opens: Vec<AccessMode>,
}

fn fault() -> io::Error {
    io::Error::other("mock transport fault")
}

/// Transport double backed by address-indexed storage
#[derive(Debug, Clone)]
pub struct MockTransport {
    state: Rc<RefCell<MockState>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(MockState {
                present: true,
                ..MockState::default()
            })),
        }
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<MockCall> {
        self.state.borrow().calls.clone()
    }

    /// Only the control calls
    pub fn seeks(&self) -> Vec<(ControlCommand, i64)> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter_map(|call| match call {
                MockCall::Seek(cmd, offset) => Some((*cmd, *offset)),
                _ => None,
            })
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    /// Answer every `command` with `value` instead of the default behavior
    pub fn reply_to(&self, command: ControlCommand, value: i64) {
        self.state.borrow_mut().replies.insert(command, value);
    }

    /// Fail every control call with an I/O error
    pub fn fail_seeks(&self) {
        self.state.borrow_mut().fail_seeks = true;
    }

    /// Fail every read and write with an I/O error
    pub fn fail_data(&self) {
        self.state.borrow_mut().fail_data = true;
    }

    pub fn fail_next_close(&self) {
        self.state.borrow_mut().close_failures += 1;
    }

    /// Cap the number of bytes a single read returns
    pub fn limit_reads(&self, limit: usize) {
        self.state.borrow_mut().read_limit = Some(limit);
    }

    /// Cap the number of bytes a single write stores
    pub fn limit_writes(&self, limit: usize) {
        self.state.borrow_mut().write_limit = Some(limit);
    }

    pub fn poke(&self, address: i64, data: &[u8]) {
        let mut state = self.state.borrow_mut();
        for (i, byte) in data.iter().enumerate() {
            state.memory.insert(address + i as i64, *byte);
        }
    }

    pub fn peek(&self, address: i64, len: usize) -> Vec<u8> {
        let state = self.state.borrow();
        (0..len as i64)
            .map(|i| state.memory.get(&(address + i)).copied().unwrap_or(0))
            .collect()
    }

    pub fn attached_pid(&self) -> Option<i32> {
        self.state.borrow().pid
    }
}

impl Transport for MockTransport {
    fn seek(&mut self, command: ControlCommand, offset: i64) -> io::Result<i64> {
        let mut state = self.state.borrow_mut();
        state.calls.push(MockCall::Seek(command, offset));
        if state.fail_seeks {
            return Err(fault());
        }
        if let Some(reply) = state.replies.get(&command) {
            return Ok(*reply);
        }

        Ok(match command {
            ControlCommand::SetPid => {
                state.pid = Some(offset as i32);
                MOCK_ATTACH_TOKEN
            }
            ControlCommand::SetPos => {
                state.cursor = offset;
                offset
            }
            ControlCommand::GetPos => state.cursor,
            ControlCommand::SetBuf => 0,
        })
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.state.borrow_mut();
        state.calls.push(MockCall::Read(buf.len()));
        if state.fail_data {
            return Err(fault());
        }

        let len = state.read_limit.map_or(buf.len(), |limit| limit.min(buf.len()));
        let cursor = state.cursor;
        for (i, slot) in buf.iter_mut().take(len).enumerate() {
            *slot = state.memory.get(&(cursor + i as i64)).copied().unwrap_or(0);
        }
        state.cursor += len as i64;
        Ok(len)
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut state = self.state.borrow_mut();
        state.calls.push(MockCall::Write(data.to_vec()));
        if state.fail_data {
            return Err(fault());
        }

        let len = state.write_limit.map_or(data.len(), |limit| limit.min(data.len()));
        let cursor = state.cursor;
        for (i, byte) in data.iter().take(len).enumerate() {
            state.memory.insert(cursor + i as i64, *byte);
        }
        state.cursor += len as i64;
        Ok(len)
    }

    fn close(&mut self) -> io::Result<()> {
        let mut state = self.state.borrow_mut();
        state.calls.push(MockCall::Close);
        if state.close_failures > 0 {
            state.close_failures -= 1;
            return Err(fault());
        }
        Ok(())
    }
}

/// Device double; clones share state with each other and with every handle
#[derive(Debug, Clone, Default)]
pub struct MockDevice {
    transport: MockTransport,
}

impl MockDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// A device whose node is absent
    pub fn missing() -> Self {
        let device = Self::new();
        device.transport.state.borrow_mut().present = false;
        device
    }

    /// Simulate another client holding the device
    pub fn set_busy(&self, busy: bool) {
        self.transport.state.borrow_mut().busy = busy;
    }

    /// Shared view of the transport every handle talks to
    pub fn transport(&self) -> MockTransport {
        self.transport.clone()
    }

    /// Access modes of every successful open
    pub fn opens(&self) -> Vec<AccessMode> {
        self.transport.state.borrow().opens.clone()
    }
}

impl Device for MockDevice {
    type Handle = MockTransport;

    fn exists(&self) -> bool {
        self.transport.state.borrow().present
    }

    fn open(&self, access: AccessMode) -> io::Result<MockTransport> {
        let mut state = self.transport.state.borrow_mut();
        if !state.present {
            return Err(io::Error::from(io::ErrorKind::NotFound));
        }
        if state.busy {
            return Err(io::Error::other("device busy"));
        }
        state.opens.push(access);
        Ok(self.transport.clone())
    }
}

/// Fixed set of live pids
#[derive(Debug, Clone, Default)]
pub struct MockProcesses {
    pids: HashSet<i32>,
}

impl MockProcesses {
    pub fn with_pids<I: IntoIterator<Item = i32>>(pids: I) -> Self {
        Self {
            pids: pids.into_iter().collect(),
        }
    }

    pub fn insert(&mut self, pid: i32) {
        self.pids.insert(pid);
    }
}

impl ProcessProvider for MockProcesses {
    fn exists(&self, pid: i32) -> bool {
        self.pids.contains(&pid)
    }
}

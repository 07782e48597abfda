use memhole::mock::{MockCall, MockDevice, MockProcesses};
use memhole::{Connection, ConnectionConfig, ControlCommand, Error, ReadMemory};

#[test]
fn write_then_read_back_through_the_cursor() {
    let device = MockDevice::new();
    let mut conn = Connection::with_parts(device.clone(), MockProcesses::with_pids([1]), true);

    conn.connect().unwrap();
    let token = conn.attach(1).unwrap();
    assert_ne!(token.value(), 0);

    conn.set_position(0x1000).unwrap();
    conn.write_memory(&[0xAA, 0xBB]).unwrap();
    conn.set_position(0x1000).unwrap();
    assert_eq!(conn.read_memory(2), Some(vec![0xAA, 0xBB]));

    conn.disconnect().unwrap();
    assert!(!conn.is_connected());

    assert_eq!(
        device.transport().calls(),
        vec![
            MockCall::Seek(ControlCommand::SetPid, 1),
            MockCall::Seek(ControlCommand::SetPos, 0x1000),
            MockCall::Write(vec![0xAA, 0xBB]),
            MockCall::Seek(ControlCommand::SetPos, 0x1000),
            MockCall::Read(2),
            MockCall::Close,
        ]
    );
}

#[test]
fn operations_after_disconnect_fail() {
    let device = MockDevice::new();
    let mut conn = Connection::with_parts(device.clone(), MockProcesses::with_pids([1]), true);
    conn.connect().unwrap();
    conn.attach(1).unwrap();
    conn.disconnect().unwrap();

    assert_eq!(conn.attach(1), Err(Error::InvalidDevice));
    assert_eq!(conn.attached_pid(), None);
    assert_eq!(conn.set_position(0), Err(Error::InvalidDevice));
    assert_eq!(conn.get_position(), Err(Error::InvalidDevice));
    assert_eq!(conn.write_memory(&[1]), Err(Error::InvalidDevice));
    assert_eq!(conn.read_memory(1), None);
    assert_eq!(conn.read_bytes(0, 1), Err(Error::InvalidDevice));
}

#[test]
fn second_client_sees_busy_device() {
    let device = MockDevice::new();
    let mut first = Connection::with_parts(device.clone(), MockProcesses::default(), false);
    first.connect().unwrap();

    // The kernel module refuses a second open while the first is held.
    device.set_busy(true);
    let mut second = Connection::with_parts(device.clone(), MockProcesses::default(), false);
    assert_eq!(second.connect(), Err(Error::DeviceBusy));
    assert!(first.is_connected());
}

#[test]
fn missing_device_node_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let config = ConnectionConfig::builder()
        .device_path(dir.path().join("memhole"))
        .build();
    let mut conn = Connection::with_config(config);

    assert_eq!(conn.connect(), Err(Error::DeviceNotFound));
    assert!(!conn.is_connected());
    assert_eq!(conn.disconnect(), Err(Error::InvalidDevice));
}

#[test]
fn reconnect_after_disconnect() {
    let device = MockDevice::new();
    let mut conn = Connection::with_parts(device.clone(), MockProcesses::with_pids([1]), false);

    for _ in 0..3 {
        conn.connect().unwrap();
        conn.attach(1).unwrap();
        conn.disconnect().unwrap();
    }
    assert_eq!(device.opens().len(), 3);
}

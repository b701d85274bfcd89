//! Scheduler behaviour against a mocked transport

use mockall::{mock, predicate, Sequence};
use talkersim_core::core::device::{MessageKind, ParameterSnapshot};
use talkersim_core::core::logger::MessageLog;
use talkersim_core::core::scheduler::{
    CyclingSnapshots, FailurePolicy, FixedSnapshot, SessionState, TickOutcome,
    TransmissionScheduler,
};
use talkersim_core::core::transport::{SerialConfig, Transport, TransportError, TransportStats};

mock! {
    pub Link {}

    impl Transport for Link {
        fn configure(&mut self, config: &SerialConfig) -> Result<(), TransportError>;
        fn send(&mut self, data: &[u8]) -> Result<usize, TransportError>;
        fn connection_info(&self) -> String;
        fn stats(&self) -> TransportStats;
    }
}

fn link() -> MockLink {
    let mut link = MockLink::new();
    link.expect_connection_info().return_const("mock link".to_string());
    link.expect_stats().return_const(TransportStats::default());
    link
}

fn port() -> SerialConfig {
    SerialConfig::new("/dev/ttyUSB0", 4800)
}

fn compass(heading: f64) -> FixedSnapshot {
    FixedSnapshot::new(
        MessageKind::Compass,
        ParameterSnapshot::new()
            .with("id", "HCHDT")
            .with("heading", heading)
            .with("power", "T"),
    )
}

#[test]
fn compass_sentence_reaches_transport_each_tick() {
    let mut link = link();
    link.expect_configure()
        .with(predicate::eq(port()))
        .times(1)
        .returning(|_| Ok(()));
    link.expect_send()
        .withf(|data: &[u8]| data == b"$HCHDT,005.0,T*2C\r\n")
        .times(3)
        .returning(|data| Ok(data.len()));

    let mut scheduler = TransmissionScheduler::new(link);
    let mut source = compass(5.0);
    let mut log = MessageLog::default();

    scheduler.start(&port(), 1000).unwrap();
    for expected in 1..=3 {
        match scheduler.tick(&mut source, &mut log) {
            TickOutcome::Sent { bytes, sent_count, .. } => {
                assert_eq!(bytes, 19);
                assert_eq!(sent_count, expected);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
    assert_eq!(log.lines(), vec!["$HCHDT,005.0,T*2C"; 3]);
}

#[test]
fn sonar_sentence_matches_reference() {
    let mut link = link();
    link.expect_configure().returning(|_| Ok(()));
    link.expect_send()
        .withf(|data: &[u8]| data == b"$SDDBT,,,0012.3,M,05,M,A*33\r\n")
        .times(1)
        .returning(|data| Ok(data.len()));

    let mut scheduler = TransmissionScheduler::new(link);
    let mut source = FixedSnapshot::new(
        MessageKind::Sonar,
        ParameterSnapshot::new()
            .with("id", "SDDBT")
            .with("depth", 12.3)
            .with("danger", 5)
            .with("accuracy", "A"),
    );
    let mut log = MessageLog::default();

    scheduler.start(&port(), 1000).unwrap();
    assert!(scheduler.tick(&mut source, &mut log).is_sent());
}

#[test]
fn start_failure_leaves_scheduler_stopped() {
    let mut link = link();
    link.expect_configure()
        .times(1)
        .returning(|config| Err(TransportError::PortNotFound(config.port.clone())));
    link.expect_send().never();

    let mut scheduler = TransmissionScheduler::new(link);
    let mut source = compass(5.0);
    let mut log = MessageLog::default();

    assert!(scheduler.start(&port(), 1000).is_err());
    assert_eq!(scheduler.state(), SessionState::Stopped);
    assert!(matches!(scheduler.tick(&mut source, &mut log), TickOutcome::Idle));
    assert!(log.is_empty());
}

#[test]
fn invalid_snapshot_never_reaches_transport() {
    let mut link = link();
    link.expect_configure().returning(|_| Ok(()));
    link.expect_send().never();

    let mut scheduler = TransmissionScheduler::new(link);
    let mut log = MessageLog::default();
    scheduler.start(&port(), 1000).unwrap();

    for snapshot in [
        compass(360.0),
        compass(-1.0),
        FixedSnapshot::new(
            MessageKind::Compass,
            ParameterSnapshot::new().with("id", "HCHDT").with("heading", 5.0),
        ),
        FixedSnapshot::new(
            MessageKind::Sensor,
            MessageKind::Sensor.spec().default_snapshot().with("magz", 80.0),
        ),
    ] {
        let mut source = snapshot;
        assert!(matches!(
            scheduler.tick(&mut source, &mut log),
            TickOutcome::Skipped(_)
        ));
    }

    assert!(scheduler.is_running());
    assert_eq!(scheduler.sent_count(), 0);
    assert_eq!(log.errors().len(), 4);
}

#[test]
fn sent_count_resets_on_restart_and_freezes_when_stopped() {
    let mut link = link();
    link.expect_configure().times(2).returning(|_| Ok(()));
    link.expect_send().times(3).returning(|data| Ok(data.len()));

    let mut scheduler = TransmissionScheduler::new(link);
    let mut source = compass(90.0);
    let mut log = MessageLog::default();

    scheduler.start(&port(), 1000).unwrap();
    scheduler.tick(&mut source, &mut log);
    scheduler.tick(&mut source, &mut log);
    scheduler.stop();
    scheduler.tick(&mut source, &mut log);
    assert_eq!(scheduler.sent_count(), 2);

    scheduler.start(&port(), 1000).unwrap();
    assert_eq!(scheduler.sent_count(), 0);
    scheduler.tick(&mut source, &mut log);
    assert_eq!(scheduler.sent_count(), 1);
}

#[test]
fn send_failures_stop_after_limit() {
    let mut seq = Sequence::new();
    let mut link = link();
    link.expect_configure().returning(|_| Ok(()));
    link.expect_send()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Err(TransportError::PortInUse("/dev/ttyUSB0".to_string())));
    link.expect_send()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|data| Ok(data.len()));
    link.expect_send()
        .times(3)
        .in_sequence(&mut seq)
        .returning(|_| Err(TransportError::PortInUse("/dev/ttyUSB0".to_string())));

    let mut scheduler = TransmissionScheduler::with_policy(link, FailurePolicy::default());
    let mut source = compass(5.0);
    let mut log = MessageLog::default();
    scheduler.start(&port(), 1000).unwrap();

    assert!(matches!(
        scheduler.tick(&mut source, &mut log),
        TickOutcome::SendFailed { consecutive_failures: 1, .. }
    ));
    assert!(scheduler.tick(&mut source, &mut log).is_sent());
    assert!(matches!(
        scheduler.tick(&mut source, &mut log),
        TickOutcome::SendFailed { consecutive_failures: 1, .. }
    ));
    assert!(matches!(
        scheduler.tick(&mut source, &mut log),
        TickOutcome::SendFailed { consecutive_failures: 2, .. }
    ));
    assert!(matches!(
        scheduler.tick(&mut source, &mut log),
        TickOutcome::AutoStopped { consecutive_failures: 3, .. }
    ));

    assert_eq!(scheduler.state(), SessionState::Stopped);
    assert_eq!(scheduler.sent_count(), 1);
    assert_eq!(log.lines().len(), 5);
    assert_eq!(log.errors().len(), 4);
}

#[test]
fn cycling_sends_each_device_in_turn() {
    let mut seq = Sequence::new();
    let mut link = link();
    link.expect_configure().returning(|_| Ok(()));
    link.expect_send()
        .withf(|data: &[u8]| data.starts_with(b"$HCHDT"))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|data| Ok(data.len()));
    link.expect_send()
        .withf(|data: &[u8]| data.starts_with(b"$SDDBT"))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|data| Ok(data.len()));
    link.expect_send()
        .withf(|data: &[u8]| data.len() == 17 && data.starts_with(&[0x0D, 0x0A, 0x7E, 0x70, 0x12]))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|data| Ok(data.len()));

    let mut scheduler = TransmissionScheduler::new(link);
    let mut source = CyclingSnapshots::new(MessageKind::Compass);
    let mut log = MessageLog::default();
    scheduler.start(&port(), 1000).unwrap();

    for _ in 0..3 {
        assert!(scheduler.tick(&mut source, &mut log).is_sent());
    }
}

//! Transmission scheduler
//!
//! A two-state machine (Stopped, Running) that performs one
//! validate → encode → send → display cycle per tick. Ticks come from the
//! outside (see [`crate::core::runner`]) and are never concurrent: each tick
//! returns before the next one starts.
//!
//! Transport failures during a tick are surfaced and counted. After
//! [`FailurePolicy::max_consecutive_failures`] failures in a row the
//! scheduler stops itself.

use crate::core::device::{MessageKind, ParameterSnapshot};
use crate::core::encoder::{encode_validated, MessageError};
use crate::core::logger::MessageSink;
use crate::core::transport::{SerialConfig, Transport, TransportError};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Default tick interval
pub const DEFAULT_INTERVAL_MS: u64 = 1000;

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SessionState {
    /// Not transmitting
    #[default]
    Stopped,
    /// Transmitting on every tick
    Running,
}

impl SessionState {
    /// Check if ticks are being serviced
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

/// Link indicator shown next to the log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkStatus {
    /// Never started
    #[default]
    NoConnect,
    /// Configured but not transmitting
    Idle,
    /// Alternates with `Transmit` on every successful send
    Receive,
    /// Alternates with `Receive` on every successful send
    Transmit,
    /// Last operation failed
    Error,
}

impl LinkStatus {
    /// Tooltip text
    pub fn description(&self) -> &'static str {
        match self {
            Self::NoConnect => "no connection",
            Self::Idle => "idle",
            Self::Receive => "receive",
            Self::Transmit => "transmit",
            Self::Error => "error",
        }
    }

    fn blink(self) -> Self {
        match self {
            Self::Receive => Self::Transmit,
            _ => Self::Receive,
        }
    }
}

/// What to do about repeated transport failures while running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailurePolicy {
    /// Consecutive failed sends that stop the session (0 = never stop)
    pub max_consecutive_failures: u32,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        Self {
            max_consecutive_failures: 3,
        }
    }
}

impl FailurePolicy {
    /// Never stop on transport failures
    pub fn never_stop() -> Self {
        Self {
            max_consecutive_failures: 0,
        }
    }

    /// Check if the session should stop after this many failures in a row
    pub fn should_stop(&self, consecutive_failures: u32) -> bool {
        self.max_consecutive_failures > 0 && consecutive_failures >= self.max_consecutive_failures
    }
}

/// Mutable state of the transmission session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransmissionSession {
    /// Current state
    pub state: SessionState,
    /// Tick interval
    pub interval: Duration,
    /// Messages sent since the last start
    pub sent_count: u64,
}

impl Default for TransmissionSession {
    fn default() -> Self {
        Self {
            state: SessionState::Stopped,
            interval: Duration::from_millis(DEFAULT_INTERVAL_MS),
            sent_count: 0,
        }
    }
}

/// State transition event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    /// Previous state
    pub from: SessionState,
    /// New state
    pub to: SessionState,
    /// Timestamp
    pub timestamp: DateTime<Local>,
    /// Reason for transition
    pub reason: String,
}

/// Errors from start
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// Start requested while running
    #[error("transmission is already running")]
    AlreadyRunning,

    /// Zero interval
    #[error("tick interval must be at least 1 ms")]
    InvalidInterval,

    /// Transport rejected the configuration
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Supplies the active device and its parameters on every tick
pub trait SnapshotSource {
    /// Current device kind and parameter values
    fn snapshot(&mut self) -> (MessageKind, ParameterSnapshot);
}

/// Source that returns the same snapshot every time
#[derive(Debug, Clone)]
pub struct FixedSnapshot {
    kind: MessageKind,
    parameters: ParameterSnapshot,
}

impl FixedSnapshot {
    /// Create a fixed source
    pub fn new(kind: MessageKind, parameters: ParameterSnapshot) -> Self {
        Self { kind, parameters }
    }

    /// Replace the parameters returned from the next tick on
    pub fn set_parameters(&mut self, parameters: ParameterSnapshot) {
        self.parameters = parameters;
    }
}

impl SnapshotSource for FixedSnapshot {
    fn snapshot(&mut self) -> (MessageKind, ParameterSnapshot) {
        (self.kind, self.parameters.clone())
    }
}

/// Source that moves to the next device kind on every tick
#[derive(Debug, Clone)]
pub struct CyclingSnapshots {
    current: MessageKind,
    parameters: HashMap<MessageKind, ParameterSnapshot>,
}

impl CyclingSnapshots {
    /// Start at `first`, using each kind's default parameters
    pub fn new(first: MessageKind) -> Self {
        let parameters = MessageKind::all()
            .iter()
            .map(|kind| (*kind, kind.spec().default_snapshot()))
            .collect();
        Self {
            current: first,
            parameters,
        }
    }

    /// Set the parameters used for one kind
    #[must_use]
    pub fn with_parameters(mut self, kind: MessageKind, parameters: ParameterSnapshot) -> Self {
        self.parameters.insert(kind, parameters);
        self
    }
}

impl SnapshotSource for CyclingSnapshots {
    fn snapshot(&mut self) -> (MessageKind, ParameterSnapshot) {
        let kind = self.current;
        self.current = kind.next();
        let parameters = self.parameters.get(&kind).cloned().unwrap_or_default();
        (kind, parameters)
    }
}

/// Result of one tick
#[derive(Debug)]
pub enum TickOutcome {
    /// Scheduler is stopped; nothing happened
    Idle,
    /// Message encoded and sent
    Sent {
        /// Device kind
        kind: MessageKind,
        /// Bytes handed to the transport
        bytes: usize,
        /// Sent count after this tick
        sent_count: u64,
    },
    /// Snapshot rejected; nothing was sent
    Skipped(MessageError),
    /// Transport write failed; still running
    SendFailed {
        /// Transport error
        error: TransportError,
        /// Failures in a row, including this one
        consecutive_failures: u32,
    },
    /// Transport write failed and the failure limit was reached; now stopped
    AutoStopped {
        /// Transport error
        error: TransportError,
        /// Failures in a row, including this one
        consecutive_failures: u32,
    },
}

impl TickOutcome {
    /// Whether a message was sent
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent { .. })
    }
}

/// Periodic encode-and-send driver
pub struct TransmissionScheduler<T: Transport> {
    transport: T,
    session: TransmissionSession,
    policy: FailurePolicy,
    consecutive_failures: u32,
    status: LinkStatus,
    history: VecDeque<StateTransition>,
    max_history: usize,
}

impl<T: Transport> TransmissionScheduler<T> {
    /// Create a stopped scheduler
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            session: TransmissionSession::default(),
            policy: FailurePolicy::default(),
            consecutive_failures: 0,
            status: LinkStatus::NoConnect,
            history: VecDeque::new(),
            max_history: 100,
        }
    }

    /// Create with a custom failure policy
    pub fn with_policy(transport: T, policy: FailurePolicy) -> Self {
        Self {
            policy,
            ..Self::new(transport)
        }
    }

    /// Get current state
    pub fn state(&self) -> SessionState {
        self.session.state
    }

    /// Check if running
    pub fn is_running(&self) -> bool {
        self.session.state.is_running()
    }

    /// Session snapshot
    pub fn session(&self) -> TransmissionSession {
        self.session
    }

    /// Messages sent since the last start
    pub fn sent_count(&self) -> u64 {
        self.session.sent_count
    }

    /// Tick interval
    pub fn interval(&self) -> Duration {
        self.session.interval
    }

    /// Link indicator
    pub fn status(&self) -> LinkStatus {
        self.status
    }

    /// Failed sends in a row
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Failure policy
    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Get state history, oldest first
    pub fn history(&self) -> &VecDeque<StateTransition> {
        &self.history
    }

    /// Borrow the transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutably borrow the transport
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Consume the scheduler, returning the transport
    pub fn into_transport(self) -> T {
        self.transport
    }

    fn transition(&mut self, to: SessionState, reason: &str) {
        let from = self.session.state;
        self.history.push_back(StateTransition {
            from,
            to,
            timestamp: Local::now(),
            reason: reason.to_string(),
        });
        if self.history.len() > self.max_history {
            self.history.pop_front();
        }
        self.session.state = to;
    }

    /// Configure the transport and begin servicing ticks.
    ///
    /// On failure the session stays stopped and the previous sent count is
    /// kept.
    pub fn start(&mut self, config: &SerialConfig, interval_ms: u64) -> Result<(), SchedulerError> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }
        if interval_ms == 0 {
            return Err(SchedulerError::InvalidInterval);
        }

        if let Err(e) = self.transport.configure(config) {
            self.status = LinkStatus::Error;
            error!(port = %config.port, error = %e, "Failed to start transmission");
            return Err(e.into());
        }

        self.session.interval = Duration::from_millis(interval_ms);
        self.session.sent_count = 0;
        self.consecutive_failures = 0;
        self.status = LinkStatus::Idle;
        self.transition(SessionState::Running, "start");

        info!(
            link = %self.transport.connection_info(),
            interval_ms,
            "Transmission started"
        );
        Ok(())
    }

    /// Stop servicing ticks. The sent count stays readable.
    pub fn stop(&mut self) {
        self.stop_with_reason("stop");
    }

    fn stop_with_reason(&mut self, reason: &str) {
        if !self.is_running() {
            return;
        }
        self.transition(SessionState::Stopped, reason);
        if self.status != LinkStatus::Error {
            self.status = LinkStatus::Idle;
        }
        info!(sent = self.session.sent_count, reason, "Transmission stopped");
    }

    /// Run one validate → encode → send → display cycle.
    pub fn tick<S, D>(&mut self, source: &mut S, sink: &mut D) -> TickOutcome
    where
        S: SnapshotSource + ?Sized,
        D: MessageSink + ?Sized,
    {
        if !self.is_running() {
            return TickOutcome::Idle;
        }

        let (kind, snapshot) = source.snapshot();
        let message = match encode_validated(kind, &snapshot) {
            Ok(message) => message,
            Err(e) => {
                warn!(%kind, error = %e, "Tick skipped");
                sink.report_error(&e.to_string());
                return TickOutcome::Skipped(e);
            }
        };

        match self.transport.send(message.as_bytes()) {
            Ok(bytes) => {
                self.consecutive_failures = 0;
                self.status = self.status.blink();
                let rendered = message.render();
                sink.append(&rendered);
                self.session.sent_count += 1;
                debug!(%kind, bytes, sent = self.session.sent_count, message = %rendered, "Sent");
                TickOutcome::Sent {
                    kind,
                    bytes,
                    sent_count: self.session.sent_count,
                }
            }
            Err(error) => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                self.status = LinkStatus::Error;
                let consecutive_failures = self.consecutive_failures;
                error!(%kind, error = %error, consecutive_failures, "Send failed");
                sink.report_error(&format!("send failed: {error}"));

                if self.policy.should_stop(consecutive_failures) {
                    self.stop_with_reason("transport failures");
                    TickOutcome::AutoStopped {
                        error,
                        consecutive_failures,
                    }
                } else {
                    TickOutcome::SendFailed {
                        error,
                        consecutive_failures,
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::logger::MessageLog;
    use crate::core::transport::TransportStats;

    #[derive(Default)]
    struct RecordingTransport {
        sent: Vec<Vec<u8>>,
        reject_configure: bool,
        fail_sends: bool,
    }

    impl Transport for RecordingTransport {
        fn configure(&mut self, config: &SerialConfig) -> Result<(), TransportError> {
            if self.reject_configure {
                return Err(TransportError::PortNotFound(config.port.clone()));
            }
            config.validate()
        }

        fn send(&mut self, data: &[u8]) -> Result<usize, TransportError> {
            if self.fail_sends {
                return Err(TransportError::Timeout("COM1".to_string()));
            }
            self.sent.push(data.to_vec());
            Ok(data.len())
        }

        fn connection_info(&self) -> String {
            "recording".to_string()
        }

        fn stats(&self) -> TransportStats {
            TransportStats::default()
        }
    }

    fn config() -> SerialConfig {
        SerialConfig::new("COM1", 4800)
    }

    fn compass_source() -> FixedSnapshot {
        FixedSnapshot::new(
            MessageKind::Compass,
            ParameterSnapshot::new()
                .with("id", "HCHDT")
                .with("heading", 5.0)
                .with("power", "T"),
        )
    }

    #[test]
    fn test_starts_stopped() {
        let scheduler = TransmissionScheduler::new(RecordingTransport::default());
        assert_eq!(scheduler.state(), SessionState::Stopped);
        assert_eq!(scheduler.sent_count(), 0);
        assert_eq!(scheduler.status(), LinkStatus::NoConnect);
    }

    #[test]
    fn test_tick_sends_and_counts() {
        let mut scheduler = TransmissionScheduler::new(RecordingTransport::default());
        let mut source = compass_source();
        let mut log = MessageLog::default();

        scheduler.start(&config(), 1000).unwrap();
        assert!(scheduler.tick(&mut source, &mut log).is_sent());
        assert!(scheduler.tick(&mut source, &mut log).is_sent());

        assert_eq!(scheduler.sent_count(), 2);
        assert_eq!(scheduler.transport().sent[0], b"$HCHDT,005.0,T*2C\r\n");
        assert_eq!(log.lines(), vec!["$HCHDT,005.0,T*2C", "$HCHDT,005.0,T*2C"]);
    }

    #[test]
    fn test_tick_while_stopped_does_nothing() {
        let mut scheduler = TransmissionScheduler::new(RecordingTransport::default());
        let mut source = compass_source();
        let mut log = MessageLog::default();

        assert!(matches!(scheduler.tick(&mut source, &mut log), TickOutcome::Idle));
        assert_eq!(scheduler.sent_count(), 0);
        assert!(scheduler.transport().sent.is_empty());
        assert!(log.is_empty());
    }

    #[test]
    fn test_stop_keeps_count_and_freezes_it() {
        let mut scheduler = TransmissionScheduler::new(RecordingTransport::default());
        let mut source = compass_source();
        let mut log = MessageLog::default();

        scheduler.start(&config(), 1000).unwrap();
        scheduler.tick(&mut source, &mut log);
        scheduler.stop();
        assert_eq!(scheduler.state(), SessionState::Stopped);
        assert_eq!(scheduler.sent_count(), 1);

        scheduler.tick(&mut source, &mut log);
        assert_eq!(scheduler.sent_count(), 1);
    }

    #[test]
    fn test_restart_resets_count() {
        let mut scheduler = TransmissionScheduler::new(RecordingTransport::default());
        let mut source = compass_source();
        let mut log = MessageLog::default();

        scheduler.start(&config(), 1000).unwrap();
        scheduler.tick(&mut source, &mut log);
        scheduler.stop();
        scheduler.start(&config(), 500).unwrap();
        assert_eq!(scheduler.sent_count(), 0);
        assert_eq!(scheduler.interval(), Duration::from_millis(500));
    }

    #[test]
    fn test_start_failure_stays_stopped() {
        let transport = RecordingTransport {
            reject_configure: true,
            ..Default::default()
        };
        let mut scheduler = TransmissionScheduler::new(transport);
        let err = scheduler.start(&config(), 1000).unwrap_err();
        assert!(matches!(err, SchedulerError::Transport(TransportError::PortNotFound(_))));
        assert_eq!(scheduler.state(), SessionState::Stopped);
        assert_eq!(scheduler.status(), LinkStatus::Error);
    }

    #[test]
    fn test_start_rejects_empty_port_and_zero_interval() {
        let mut scheduler = TransmissionScheduler::new(RecordingTransport::default());
        assert!(matches!(
            scheduler.start(&SerialConfig::new("", 4800), 1000),
            Err(SchedulerError::Transport(TransportError::InvalidConfiguration(_)))
        ));
        assert!(matches!(
            scheduler.start(&config(), 0),
            Err(SchedulerError::InvalidInterval)
        ));
        assert!(!scheduler.is_running());
    }

    #[test]
    fn test_double_start_rejected() {
        let mut scheduler = TransmissionScheduler::new(RecordingTransport::default());
        scheduler.start(&config(), 1000).unwrap();
        assert!(matches!(
            scheduler.start(&config(), 1000),
            Err(SchedulerError::AlreadyRunning)
        ));
        assert!(scheduler.is_running());
    }

    #[test]
    fn test_invalid_snapshot_skips_tick_only() {
        let mut scheduler = TransmissionScheduler::new(RecordingTransport::default());
        let mut source = FixedSnapshot::new(
            MessageKind::Compass,
            ParameterSnapshot::new()
                .with("id", "HCHDT")
                .with("heading", 720.0)
                .with("power", "T"),
        );
        let mut log = MessageLog::default();

        scheduler.start(&config(), 1000).unwrap();
        let outcome = scheduler.tick(&mut source, &mut log);
        assert!(matches!(outcome, TickOutcome::Skipped(MessageError::Validation(_))));
        assert!(scheduler.is_running());
        assert_eq!(scheduler.sent_count(), 0);
        assert!(scheduler.transport().sent.is_empty());
        assert_eq!(log.errors().len(), 1);

        source.set_parameters(MessageKind::Compass.spec().default_snapshot());
        assert!(scheduler.tick(&mut source, &mut log).is_sent());
        assert_eq!(scheduler.sent_count(), 1);
    }

    #[test]
    fn test_repeated_send_failures_auto_stop() {
        let transport = RecordingTransport {
            fail_sends: true,
            ..Default::default()
        };
        let mut scheduler = TransmissionScheduler::with_policy(
            transport,
            FailurePolicy {
                max_consecutive_failures: 2,
            },
        );
        let mut source = compass_source();
        let mut log = MessageLog::default();

        scheduler.start(&config(), 1000).unwrap();
        assert!(matches!(
            scheduler.tick(&mut source, &mut log),
            TickOutcome::SendFailed { consecutive_failures: 1, .. }
        ));
        assert!(scheduler.is_running());
        assert!(matches!(
            scheduler.tick(&mut source, &mut log),
            TickOutcome::AutoStopped { consecutive_failures: 2, .. }
        ));
        assert!(!scheduler.is_running());
        assert_eq!(scheduler.sent_count(), 0);
        assert_eq!(scheduler.status(), LinkStatus::Error);
        assert_eq!(log.errors().len(), 2);
        assert_eq!(scheduler.history().back().unwrap().reason, "transport failures");
    }

    #[test]
    fn test_success_resets_failure_streak() {
        let mut scheduler = TransmissionScheduler::new(RecordingTransport::default());
        let mut source = compass_source();
        let mut log = MessageLog::default();

        scheduler.start(&config(), 1000).unwrap();
        scheduler.transport_mut().fail_sends = true;
        scheduler.tick(&mut source, &mut log);
        scheduler.tick(&mut source, &mut log);
        assert_eq!(scheduler.consecutive_failures(), 2);

        scheduler.transport_mut().fail_sends = false;
        assert!(scheduler.tick(&mut source, &mut log).is_sent());
        assert_eq!(scheduler.consecutive_failures(), 0);
        assert!(scheduler.is_running());
    }

    #[test]
    fn test_never_stop_policy() {
        let transport = RecordingTransport {
            fail_sends: true,
            ..Default::default()
        };
        let mut scheduler = TransmissionScheduler::with_policy(transport, FailurePolicy::never_stop());
        let mut source = compass_source();
        let mut log = MessageLog::default();

        scheduler.start(&config(), 1000).unwrap();
        for _ in 0..10 {
            scheduler.tick(&mut source, &mut log);
        }
        assert!(scheduler.is_running());
        assert_eq!(scheduler.consecutive_failures(), 10);
    }

    #[test]
    fn test_failure_streak_saturates() {
        let transport = RecordingTransport {
            fail_sends: true,
            ..Default::default()
        };
        let mut scheduler = TransmissionScheduler::with_policy(transport, FailurePolicy::never_stop());
        let mut source = compass_source();
        let mut log = MessageLog::default();

        scheduler.start(&config(), 1000).unwrap();
        scheduler.consecutive_failures = u32::MAX - 1;
        assert!(matches!(
            scheduler.tick(&mut source, &mut log),
            TickOutcome::SendFailed { consecutive_failures: u32::MAX, .. }
        ));
        assert!(matches!(
            scheduler.tick(&mut source, &mut log),
            TickOutcome::SendFailed { consecutive_failures: u32::MAX, .. }
        ));
        assert!(scheduler.is_running());
        assert_eq!(scheduler.consecutive_failures(), u32::MAX);
    }

    #[test]
    fn test_status_blinks_on_success() {
        let mut scheduler = TransmissionScheduler::new(RecordingTransport::default());
        let mut source = compass_source();
        let mut log = MessageLog::default();

        scheduler.start(&config(), 1000).unwrap();
        assert_eq!(scheduler.status(), LinkStatus::Idle);
        scheduler.tick(&mut source, &mut log);
        assert_eq!(scheduler.status(), LinkStatus::Receive);
        scheduler.tick(&mut source, &mut log);
        assert_eq!(scheduler.status(), LinkStatus::Transmit);
        scheduler.tick(&mut source, &mut log);
        assert_eq!(scheduler.status(), LinkStatus::Receive);
        scheduler.stop();
        assert_eq!(scheduler.status(), LinkStatus::Idle);
    }

    #[test]
    fn test_cycling_source_rotates_kinds() {
        let mut scheduler = TransmissionScheduler::new(RecordingTransport::default());
        let mut source = CyclingSnapshots::new(MessageKind::Compass);
        let mut log = MessageLog::default();

        scheduler.start(&config(), 1000).unwrap();
        let kinds: Vec<_> = (0..4)
            .map(|_| match scheduler.tick(&mut source, &mut log) {
                TickOutcome::Sent { kind, .. } => kind,
                other => panic!("unexpected outcome: {other:?}"),
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                MessageKind::Compass,
                MessageKind::Sonar,
                MessageKind::Sensor,
                MessageKind::Compass
            ]
        );
        assert_eq!(scheduler.transport().sent[2].len(), 17);
        assert!(log.lines()[2].starts_with("0D 0A 7E 70 12 "));
    }

    #[test]
    fn test_history_records_transitions() {
        let mut scheduler = TransmissionScheduler::new(RecordingTransport::default());
        scheduler.start(&config(), 1000).unwrap();
        scheduler.stop();
        scheduler.stop();
        let history = scheduler.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].from, SessionState::Stopped);
        assert_eq!(history[0].to, SessionState::Running);
        assert_eq!(history[1].to, SessionState::Stopped);
    }

    #[test]
    fn test_history_keeps_newest_hundred() {
        let mut scheduler = TransmissionScheduler::new(RecordingTransport::default());
        for _ in 0..60 {
            scheduler.start(&config(), 1000).unwrap();
            scheduler.stop();
        }
        let history = scheduler.history();
        assert_eq!(history.len(), 100);
        assert_eq!(history.front().unwrap().to, SessionState::Running);
        assert_eq!(history.back().unwrap().to, SessionState::Stopped);
        assert_eq!(history.back().unwrap().reason, "stop");
    }
}

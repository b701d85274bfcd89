//! # Talkersim Core Library
//!
//! Simulates marine "talker" devices that periodically emit navigation data
//! over a serial line:
//! - KF1 compass repeater (`$HCHDT` heading sentence)
//! - NEL echo-sounder repeater (`$SDDBT` depth sentence)
//! - HMR orientation sensor (17-byte little-endian binary frame)
//!
//! ## Features
//!
//! - Field-level validation against each device's value domains
//! - NMEA-0183 sentence building with XOR checksum
//! - Fixed-point encoding of angles and magnetic field strength
//! - Periodic transmission with a two-state scheduler
//! - Serial port released between sends
//! - CLI with exit codes and JSON output
//!
//! ## Example
//!
//! ```rust,no_run
//! use talkersim_core::{
//!     FixedSnapshot, MessageKind, MessageLog, SerialConfig, SerialTransport,
//!     TransmissionScheduler,
//! };
//!
//! let mut scheduler = TransmissionScheduler::new(SerialTransport::new());
//! scheduler.start(&SerialConfig::new("/dev/ttyUSB0", 4800), 1000)?;
//!
//! let mut source = FixedSnapshot::new(
//!     MessageKind::Compass,
//!     MessageKind::Compass.spec().default_snapshot(),
//! );
//! let mut log = MessageLog::default();
//! scheduler.tick(&mut source, &mut log);
//! println!("{:?}", log.lines());
//! # Ok::<(), talkersim_core::SchedulerError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod core;

// Re-exports for convenience
pub use crate::cli::{CliResult, ExitCodes, OutputFormat};
pub use crate::config::{AppConfig, ConfigError};
pub use crate::core::device::{
    validate, Domain, FieldSpec, MessageKind, MessageKindSpec, ParameterSnapshot,
    ValidationError, ValidationReason, Value,
};
pub use crate::core::encoder::{encode, encode_validated, EncodedMessage, EncodingError, MessageError};
pub use crate::core::logger::{ConsoleFormat, ConsoleSink, LogEntry, MessageLog, MessageSink, SharedLog};
pub use crate::core::protocol::{BinaryFrame, NmeaSentence, Scale};
pub use crate::core::runner::{run_until_stopped, RunSummary, StopReason};
pub use crate::core::scheduler::{
    CyclingSnapshots, FailurePolicy, FixedSnapshot, LinkStatus, SchedulerError, SessionState,
    SnapshotSource, TickOutcome, TransmissionScheduler,
};
pub use crate::core::transport::{
    list_ports, SerialConfig, SerialParity, SerialStopBits, SerialTransport, Transport,
    TransportError, TransportStats,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

//! Transport layer for talker output
//!
//! The scheduler only needs to hand a byte buffer to a configured
//! destination. [`SerialTransport`] is the real implementation; tests plug in
//! their own [`Transport`].

mod serial;

pub use serial::{
    list_ports, PortInfo, SerialConfig, SerialParity, SerialStopBits, SerialTransport, BAUD_RATES,
    DATA_BITS,
};

use thiserror::Error;

/// Transport error types
#[derive(Error, Debug)]
pub enum TransportError {
    /// Port not found
    #[error("Port not found: {0}")]
    PortNotFound(String),

    /// Permission denied
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Port already in use
    #[error("Port already in use: {0}")]
    PortInUse(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Port could not be opened for another reason
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Write did not complete in time
    #[error("Write timed out on {0}")]
    Timeout(String),

    /// Send attempted before a successful configure
    #[error("Transport not configured")]
    NotConfigured,

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Transport statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransportStats {
    /// Bytes sent
    pub bytes_sent: u64,
    /// Messages sent
    pub packets_sent: u64,
    /// Failed sends
    pub errors: u64,
}

/// Destination for encoded messages
pub trait Transport {
    /// Check the configuration and that the port can be acquired.
    ///
    /// Called once when transmission starts; a failure leaves the transport
    /// unconfigured.
    fn configure(&mut self, config: &SerialConfig) -> Result<(), TransportError>;

    /// Write one message. The connection is held only for the duration of the
    /// call and released on success and failure alike.
    fn send(&mut self, data: &[u8]) -> Result<usize, TransportError>;

    /// Get connection info string
    fn connection_info(&self) -> String;

    /// Get statistics
    fn stats(&self) -> TransportStats;
}

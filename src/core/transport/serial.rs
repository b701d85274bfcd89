//! Serial port transport implementation

use super::{Transport, TransportError, TransportStats};
use serde::{Deserialize, Serialize};
use serialport::{DataBits, Parity, SerialPort, SerialPortType, StopBits};
use std::io::Write;
use std::time::Duration;

/// Baud rates offered for selection
pub const BAUD_RATES: &[u32] = &[4800, 9600, 19200, 38400, 57600, 115_200];

/// Data bit counts offered for selection
pub const DATA_BITS: &[u8] = &[5, 6, 7, 8];

/// Serial port parity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SerialParity {
    /// No parity
    #[default]
    None,
    /// Odd parity
    Odd,
    /// Even parity
    Even,
}

impl std::str::FromStr for SerialParity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" | "n" => Ok(Self::None),
            "odd" | "o" => Ok(Self::Odd),
            "even" | "e" => Ok(Self::Even),
            other => Err(format!("unknown parity '{other}'")),
        }
    }
}

/// Serial port stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SerialStopBits {
    /// One stop bit
    #[default]
    #[serde(rename = "1")]
    One,
    /// One and a half stop bits
    #[serde(rename = "1.5")]
    OnePointFive,
    /// Two stop bits
    #[serde(rename = "2")]
    Two,
}

impl std::str::FromStr for SerialStopBits {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1" => Ok(Self::One),
            "1.5" => Ok(Self::OnePointFive),
            "2" => Ok(Self::Two),
            other => Err(format!("unknown stop bits '{other}'")),
        }
    }
}

/// Serial port configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Port name (e.g., COM3, /dev/ttyUSB0)
    pub port: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Data bits (5, 6, 7, 8)
    pub data_bits: u8,
    /// Parity
    pub parity: SerialParity,
    /// Stop bits
    pub stop_bits: SerialStopBits,
    /// Write timeout in milliseconds
    pub write_timeout_ms: u64,
}

impl SerialConfig {
    /// Create a new serial configuration with default settings
    pub fn new(port: &str, baud_rate: u32) -> Self {
        Self {
            port: port.to_string(),
            baud_rate,
            data_bits: 8,
            parity: SerialParity::None,
            stop_bits: SerialStopBits::One,
            write_timeout_ms: 100,
        }
    }

    /// Set data bits
    #[must_use]
    pub fn data_bits(mut self, bits: u8) -> Self {
        self.data_bits = bits;
        self
    }

    /// Set parity
    #[must_use]
    pub fn parity(mut self, parity: SerialParity) -> Self {
        self.parity = parity;
        self
    }

    /// Set stop bits
    #[must_use]
    pub fn stop_bits(mut self, stop_bits: SerialStopBits) -> Self {
        self.stop_bits = stop_bits;
        self
    }

    /// Set write timeout
    #[must_use]
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Write timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    /// Check the settings without touching the port
    pub fn validate(&self) -> Result<(), TransportError> {
        if self.port.trim().is_empty() {
            return Err(TransportError::InvalidConfiguration(
                "no port selected".to_string(),
            ));
        }
        if self.baud_rate == 0 {
            return Err(TransportError::InvalidConfiguration(
                "baud rate must be positive".to_string(),
            ));
        }
        if !DATA_BITS.contains(&self.data_bits) {
            return Err(TransportError::InvalidConfiguration(format!(
                "unsupported data bits: {}",
                self.data_bits
            )));
        }
        if self.stop_bits == SerialStopBits::OnePointFive {
            return Err(TransportError::InvalidConfiguration(
                "1.5 stop bits are not supported by the serial driver".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self::new("", 4800)
    }
}

/// Serial port transport.
///
/// The port is opened for every send and closed when the handle drops, so
/// nothing is held between ticks.
#[derive(Debug, Default)]
pub struct SerialTransport {
    config: Option<SerialConfig>,
    stats: TransportStats,
}

impl SerialTransport {
    /// Create an unconfigured serial transport
    pub fn new() -> Self {
        Self::default()
    }

    /// Active configuration, if configured
    pub fn config(&self) -> Option<&SerialConfig> {
        self.config.as_ref()
    }

    fn open(config: &SerialConfig) -> Result<Box<dyn SerialPort>, TransportError> {
        let data_bits = match config.data_bits {
            5 => DataBits::Five,
            6 => DataBits::Six,
            7 => DataBits::Seven,
            _ => DataBits::Eight,
        };

        let stop_bits = match config.stop_bits {
            SerialStopBits::Two => StopBits::Two,
            SerialStopBits::One | SerialStopBits::OnePointFive => StopBits::One,
        };

        let parity = match config.parity {
            SerialParity::Odd => Parity::Odd,
            SerialParity::Even => Parity::Even,
            SerialParity::None => Parity::None,
        };

        serialport::new(&config.port, config.baud_rate)
            .data_bits(data_bits)
            .stop_bits(stop_bits)
            .parity(parity)
            .timeout(config.timeout())
            .open()
            .map_err(|e| match e.kind() {
                serialport::ErrorKind::NoDevice => TransportError::PortNotFound(config.port.clone()),
                serialport::ErrorKind::InvalidInput => {
                    TransportError::InvalidConfiguration(e.to_string())
                }
                serialport::ErrorKind::Io(io_kind) => match io_kind {
                    std::io::ErrorKind::NotFound => TransportError::PortNotFound(config.port.clone()),
                    std::io::ErrorKind::PermissionDenied => {
                        TransportError::PermissionDenied(config.port.clone())
                    }
                    std::io::ErrorKind::AddrInUse | std::io::ErrorKind::WouldBlock => {
                        TransportError::PortInUse(config.port.clone())
                    }
                    _ => TransportError::ConnectionFailed(e.to_string()),
                },
                serialport::ErrorKind::Unknown => TransportError::ConnectionFailed(e.to_string()),
            })
    }

    fn write_once(config: &SerialConfig, data: &[u8]) -> Result<usize, TransportError> {
        let mut port = Self::open(config)?;
        port.write_all(data).map_err(|e| match e.kind() {
            std::io::ErrorKind::TimedOut => TransportError::Timeout(config.port.clone()),
            _ => TransportError::IoError(e),
        })?;
        port.flush()?;
        Ok(data.len())
    }
}

impl Transport for SerialTransport {
    fn configure(&mut self, config: &SerialConfig) -> Result<(), TransportError> {
        self.config = None;
        config.validate()?;
        // probe: the handle is dropped, and the port released, right away
        drop(Self::open(config)?);
        self.config = Some(config.clone());
        self.stats = TransportStats::default();
        Ok(())
    }

    fn send(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        let config = self.config.as_ref().ok_or(TransportError::NotConfigured)?;

        match Self::write_once(config, data) {
            Ok(written) => {
                self.stats.bytes_sent += written as u64;
                self.stats.packets_sent += 1;
                Ok(written)
            }
            Err(e) => {
                self.stats.errors += 1;
                Err(e)
            }
        }
    }

    fn connection_info(&self) -> String {
        match &self.config {
            Some(config) => format!(
                "{} @ {} baud ({}{}{})",
                config.port,
                config.baud_rate,
                config.data_bits,
                match config.parity {
                    SerialParity::None => "N",
                    SerialParity::Odd => "O",
                    SerialParity::Even => "E",
                },
                match config.stop_bits {
                    SerialStopBits::One => "1",
                    SerialStopBits::OnePointFive => "1.5",
                    SerialStopBits::Two => "2",
                }
            ),
            None => "not configured".to_string(),
        }
    }

    fn stats(&self) -> TransportStats {
        self.stats
    }
}

/// An available serial port
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortInfo {
    /// Port name
    pub name: String,
    /// Port kind (USB, PCI, Bluetooth, Unknown)
    pub kind: String,
}

/// List available serial ports
pub fn list_ports() -> Result<Vec<PortInfo>, TransportError> {
    let ports = serialport::available_ports().map_err(|e| TransportError::IoError(e.into()))?;
    Ok(ports
        .into_iter()
        .map(|p| PortInfo {
            kind: match p.port_type {
                SerialPortType::UsbPort(_) => "USB",
                SerialPortType::PciPort => "PCI",
                SerialPortType::BluetoothPort => "Bluetooth",
                SerialPortType::Unknown => "Unknown",
            }
            .to_string(),
            name: p.port_name,
        })
        .collect())
}

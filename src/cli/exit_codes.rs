//! CLI Exit Codes
//!
//! Standard exit codes for CLI operations and automation.

use crate::config::ConfigError;
use crate::core::encoder::MessageError;
use crate::core::scheduler::SchedulerError;
use crate::core::transport::TransportError;
use std::process::ExitCode;

/// Exit code constants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCodes;

impl ExitCodes {
    /// Success
    pub const SUCCESS: u8 = 0;

    /// General error
    pub const ERROR: u8 = 1;

    /// Invalid arguments
    pub const INVALID_ARGS: u8 = 2;

    /// Port could not be opened
    pub const CONNECTION_FAILED: u8 = 3;

    /// Write timed out
    pub const TIMEOUT: u8 = 4;

    /// Permission denied
    pub const PERMISSION_DENIED: u8 = 7;

    /// Configuration error
    pub const CONFIG_ERROR: u8 = 8;

    /// Transmission stopped after repeated send failures
    pub const TRANSMISSION_FAILED: u8 = 10;

    /// Device busy
    pub const DEVICE_BUSY: u8 = 13;

    /// Port not found
    pub const PORT_NOT_FOUND: u8 = 14;

    /// Parameter validation failed
    pub const VALIDATION_FAILED: u8 = 17;

    /// Internal error
    pub const INTERNAL_ERROR: u8 = 127;
}

/// CLI operation result
#[derive(Debug)]
pub enum CliResult {
    /// Success with optional message
    Success(Option<String>),

    /// Error with code and message
    Error(u8, String),
}

impl CliResult {
    /// Success without a message
    pub fn success() -> Self {
        Self::Success(None)
    }

    /// Success with a message
    pub fn success_with_message(msg: impl Into<String>) -> Self {
        Self::Success(Some(msg.into()))
    }

    /// Error with an explicit code
    pub fn error(code: u8, msg: impl Into<String>) -> Self {
        Self::Error(code, msg.into())
    }

    /// Invalid command-line input
    pub fn invalid_args(msg: impl Into<String>) -> Self {
        Self::Error(ExitCodes::INVALID_ARGS, msg.into())
    }

    /// Parameter validation failure
    pub fn validation_failed(msg: impl Into<String>) -> Self {
        Self::Error(ExitCodes::VALIDATION_FAILED, msg.into())
    }

    /// Get exit code
    pub fn code(&self) -> u8 {
        match self {
            Self::Success(_) => ExitCodes::SUCCESS,
            Self::Error(code, _) => *code,
        }
    }

    /// Get message
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Success(Some(msg)) | Self::Error(_, msg) => Some(msg),
            Self::Success(None) => None,
        }
    }

    /// Convert to `ExitCode`
    pub fn to_exit_code(&self) -> ExitCode {
        ExitCode::from(self.code())
    }

    /// Is success?
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

impl From<TransportError> for CliResult {
    fn from(err: TransportError) -> Self {
        let code = match &err {
            TransportError::PortNotFound(_) => ExitCodes::PORT_NOT_FOUND,
            TransportError::PermissionDenied(_) => ExitCodes::PERMISSION_DENIED,
            TransportError::PortInUse(_) => ExitCodes::DEVICE_BUSY,
            TransportError::InvalidConfiguration(_) => ExitCodes::INVALID_ARGS,
            TransportError::Timeout(_) => ExitCodes::TIMEOUT,
            TransportError::ConnectionFailed(_) | TransportError::IoError(_) => {
                ExitCodes::CONNECTION_FAILED
            }
            TransportError::NotConfigured => ExitCodes::INTERNAL_ERROR,
        };
        Self::Error(code, err.to_string())
    }
}

impl From<SchedulerError> for CliResult {
    fn from(err: SchedulerError) -> Self {
        match err {
            SchedulerError::Transport(e) => e.into(),
            SchedulerError::InvalidInterval => Self::invalid_args(err.to_string()),
            SchedulerError::AlreadyRunning => Self::Error(ExitCodes::INTERNAL_ERROR, err.to_string()),
        }
    }
}

impl From<MessageError> for CliResult {
    fn from(err: MessageError) -> Self {
        match err {
            MessageError::Validation(_) => Self::validation_failed(err.to_string()),
            MessageError::Encoding(_) => Self::Error(ExitCodes::INTERNAL_ERROR, err.to_string()),
        }
    }
}

impl From<ConfigError> for CliResult {
    fn from(err: ConfigError) -> Self {
        Self::Error(ExitCodes::CONFIG_ERROR, err.to_string())
    }
}

/// Exit code description
pub fn exit_code_description(code: u8) -> &'static str {
    match code {
        0 => "Success",
        1 => "General error",
        2 => "Invalid arguments",
        3 => "Connection failed",
        4 => "Write timeout",
        7 => "Permission denied",
        8 => "Configuration error",
        10 => "Transmission failed",
        13 => "Device busy",
        14 => "Port not found",
        17 => "Validation failed",
        127 => "Internal error",
        _ => "Unknown error",
    }
}

/// All defined exit codes, in ascending order
pub const ALL_EXIT_CODES: [u8; 12] = [0, 1, 2, 3, 4, 7, 8, 10, 13, 14, 17, 127];

/// Print exit code table
pub fn print_exit_codes() {
    println!("Exit Codes:");
    for code in ALL_EXIT_CODES {
        println!("  {:>3}  {}", code, exit_code_description(code));
    }
}

//! Wire protocols spoken by the simulated talkers
//!
//! - NMEA 0183 sentences (compass and echo-sounder repeaters)
//! - Fixed-layout binary frames with fixed-point fields (orientation sensor)
//! - XOR checksum used by NMEA

pub mod checksum;
pub mod fixed_point;
pub mod frame;
pub mod nmea;

pub use checksum::{format_checksum, nmea_checksum, xor_checksum};
pub use fixed_point::Scale;
pub use frame::{BinaryFrame, FrameBuilder};
pub use nmea::{format_number, zero_pad, NmeaSentence};

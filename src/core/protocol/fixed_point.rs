//! Fixed-point scaling for binary frame fields
//!
//! Physical quantities are carried as 16-bit integers where the full integer
//! range (65536 steps) spans a fixed physical full scale:
//! - angles: 359.9 degrees
//! - magnetic field strength: 750.0 units
//!
//! Encoding rounds to the nearest step and keeps the low 16 bits, so values at
//! or beyond full scale wrap (an unsigned heading of 359.9 encodes as 0).

use super::nmea::round_to;
use serde::Serialize;

/// Number of integer steps across full scale
pub const STEPS: f64 = 65536.0;

/// Full scale of the angle encoding, in degrees
pub const ANGLE_FULL_SCALE: f64 = 359.9;

/// Full scale of the field-strength encoding
pub const FIELD_FULL_SCALE: f64 = 750.0;

/// Decimal places kept when decoding
pub const DECODE_DECIMALS: u32 = 3;

/// Scaling family of a binary field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scale {
    /// Degrees, 359.9 / 65536 per step
    Angle,
    /// Field strength, 750.0 / 65536 per step
    FieldStrength,
}

impl Scale {
    /// Physical value spanned by the full integer range
    pub fn full_scale(self) -> f64 {
        match self {
            Self::Angle => ANGLE_FULL_SCALE,
            Self::FieldStrength => FIELD_FULL_SCALE,
        }
    }

    /// Physical value of one integer step
    pub fn resolution(self) -> f64 {
        self.full_scale() / STEPS
    }

    fn steps(self, value: f64) -> i64 {
        (value * STEPS / self.full_scale()).round_ties_even() as i64
    }

    /// Encode as a signed 16-bit integer (low 16 bits of the rounded step count)
    pub fn encode_signed(self, value: f64) -> i16 {
        self.steps(value) as i16
    }

    /// Encode as an unsigned 16-bit integer (low 16 bits of the rounded step count)
    pub fn encode_unsigned(self, value: f64) -> u16 {
        self.steps(value) as u16
    }

    /// Decode a signed integer back to physical units, rounded to 3 places
    pub fn decode_signed(self, raw: i16) -> f64 {
        round_to(f64::from(raw) * self.resolution(), DECODE_DECIMALS)
    }

    /// Decode an unsigned integer back to physical units, rounded to 3 places
    pub fn decode_unsigned(self, raw: u16) -> f64 {
        round_to(f64::from(raw) * self.resolution(), DECODE_DECIMALS)
    }
}

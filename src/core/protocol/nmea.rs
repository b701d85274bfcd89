//! NMEA 0183 sentence construction
//!
//! Talkers only ever build sentences, so this module covers the output side:
//! field rendering rules and the `$...*hh\r\n` framing.
//!
//! ```text
//! $HCHDT,005.0,T*2C\r\n
//!  \___________/ \/
//!     payload    checksum (XOR of payload bytes)
//! ```

use super::checksum::{format_checksum, nmea_checksum};
use std::fmt;

/// Sentence start delimiter
pub const START: char = '$';
/// Checksum delimiter
pub const CHECKSUM_DELIMITER: char = '*';
/// Sentence terminator
pub const END: &str = "\r\n";

/// A complete, checksummed NMEA sentence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NmeaSentence {
    fields: Vec<String>,
    checksum: u8,
    text: String,
}

impl NmeaSentence {
    /// Build a sentence from already-rendered fields, computing the checksum.
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        let payload = fields.join(",");
        let checksum = nmea_checksum(&payload);
        let text = format!(
            "{START}{payload}{CHECKSUM_DELIMITER}{}{END}",
            format_checksum(checksum)
        );

        Self {
            fields,
            checksum,
            text,
        }
    }

    /// Rendered fields in transmission order
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Comma-joined payload the checksum was computed over
    pub fn payload(&self) -> &str {
        let end = self.text.len() - END.len() - 3;
        &self.text[START.len_utf8()..end]
    }

    /// Checksum byte
    pub fn checksum(&self) -> u8 {
        self.checksum
    }

    /// Full sentence text including CR LF
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Wire bytes
    pub fn as_bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    /// Sentence text without the trailing terminator, as shown in the log
    pub fn to_ascii(&self) -> &str {
        self.text.trim_end_matches(END)
    }
}

impl fmt::Display for NmeaSentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_ascii())
    }
}

/// Round to a fixed number of decimal places, ties to even.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    // adding 0.0 folds -0.0 into 0.0
    (value * factor).round_ties_even() / factor + 0.0
}

/// Render a numeric field.
///
/// The value is rounded to `decimals` places and written in its shortest
/// decimal form. Fractional quantities always keep at least one digit after
/// the point (`5.0`), integral ones never get one (`5`). The text is then
/// zero-padded on the left up to `width`; it is never truncated.
pub fn format_number(value: f64, decimals: u32, fractional: bool, width: usize) -> String {
    let rounded = round_to(value, decimals);
    let mut text = rounded.to_string();
    if fractional && !text.contains('.') {
        text.push_str(".0");
    }
    zero_pad(&text, width)
}

/// Left-pad with zeros to `width`, keeping a leading sign in front.
pub fn zero_pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.to_string();
    }

    let (sign, digits) = match text.chars().next() {
        Some(c @ ('-' | '+')) => (Some(c), &text[1..]),
        _ => (None, text),
    };

    let mut padded = String::with_capacity(width);
    if let Some(c) = sign {
        padded.push(c);
    }
    padded.extend(std::iter::repeat('0').take(width - len));
    padded.push_str(digits);
    padded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentence_framing() {
        let sentence = NmeaSentence::new(["HCHDT", "005.0", "T"]);
        assert_eq!(sentence.as_str(), "$HCHDT,005.0,T*2C\r\n");
        assert_eq!(sentence.payload(), "HCHDT,005.0,T");
        assert_eq!(sentence.checksum(), 0x2C);
        assert_eq!(sentence.to_ascii(), "$HCHDT,005.0,T*2C");
        assert_eq!(sentence.to_string(), "$HCHDT,005.0,T*2C");
        assert_eq!(sentence.as_bytes(), b"$HCHDT,005.0,T*2C\r\n");
    }

    #[test]
    fn test_blank_fields_keep_commas() {
        let sentence = NmeaSentence::new(["SDDBT", "", "", "0012.3", "M", "05", "M", "A"]);
        assert_eq!(sentence.as_str(), "$SDDBT,,,0012.3,M,05,M,A*33\r\n");
        assert_eq!(sentence.fields().len(), 8);
    }

    #[test]
    fn test_format_number_fractional() {
        assert_eq!(format_number(5.0, 1, true, 5), "005.0");
        assert_eq!(format_number(359.9, 1, true, 5), "359.9");
        assert_eq!(format_number(12.3, 2, true, 6), "0012.3");
        assert_eq!(format_number(12.346, 2, true, 6), "012.35");
        assert_eq!(format_number(0.0, 1, true, 5), "000.0");
    }

    #[test]
    fn test_format_number_integral() {
        assert_eq!(format_number(5.0, 2, false, 2), "05");
        assert_eq!(format_number(99.0, 2, false, 2), "99");
        assert_eq!(format_number(0.0, 2, false, 2), "00");
    }

    #[test]
    fn test_zero_padding_never_truncates() {
        assert_eq!(format_number(9999.9, 2, true, 6), "9999.9");
        assert_eq!(format_number(1234.56, 2, true, 6), "1234.56");
        assert_eq!(zero_pad("123456", 2), "123456");
    }

    #[test]
    fn test_zero_padding_width_law() {
        for tenths in 0..=3599 {
            let value = f64::from(tenths) / 10.0;
            let text = format_number(value, 1, true, 5);
            assert!(text.len() >= 5, "{value} rendered as {text}");
            let parsed: f64 = text.parse().unwrap();
            assert!((parsed - value).abs() < 1e-9);
        }
    }

    #[test]
    fn test_zero_pad_keeps_sign_first() {
        assert_eq!(zero_pad("-5.0", 5), "-05.0");
        assert_eq!(zero_pad("+7", 3), "+07");
    }

    #[test]
    fn test_format_number_halves_round_to_even() {
        assert_eq!(format_number(5.25, 1, true, 5), "005.2");
        assert_eq!(format_number(0.125, 2, true, 6), "000.12");
        assert_eq!(format_number(0.375, 2, true, 6), "000.38");
        assert_eq!(format_number(2.5, 0, false, 2), "02");
    }

    #[test]
    fn test_round_to_folds_negative_zero() {
        assert_eq!(round_to(-0.001, 1).to_string(), "0");
    }
}

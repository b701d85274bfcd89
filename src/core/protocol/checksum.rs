//! Checksum calculation for talker output
//!
//! NMEA-0183 sentences carry a single XOR byte computed over the payload that
//! sits strictly between the leading `$` and the `*` delimiter. The byte is
//! transmitted as two uppercase hex digits.

/// XOR of all bytes
pub fn xor_checksum(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |acc, &b| acc ^ b)
}

/// Checksum of an NMEA payload (the text between `$` and `*`).
///
/// Payloads are plain ASCII, so folding the UTF-8 bytes is the same as folding
/// the character codes.
pub fn nmea_checksum(payload: &str) -> u8 {
    xor_checksum(payload.as_bytes())
}

/// Render a checksum the way it appears on the wire: two uppercase hex digits,
/// zero-padded.
pub fn format_checksum(checksum: u8) -> String {
    format!("{checksum:02X}")
}

//! Fixed-layout binary frames
//!
//! Layout of the orientation frame (17 bytes):
//!
//! ```text
//! 0D 0A 7E | 70 | 12 | roll | pitch | heading | magc | magb | magz
//!   sync     id   len   i16    i16     u16      i16    i16    i16   (little-endian)
//! ```
//!
//! The id and length bytes are protocol constants; the length byte is not
//! derived from the payload. The frame has no trailing checksum.

use bytes::{BufMut, Bytes, BytesMut};

/// Sync prefix opening every frame
pub const SYNC: [u8; 3] = [0x0D, 0x0A, 0x7E];

/// Message identifier of the orientation frame
pub const ORIENTATION_MESSAGE_ID: u8 = 0x70;

/// Length byte of the orientation frame
pub const ORIENTATION_LENGTH: u8 = 0x12;

/// Number of 16-bit fields in the orientation frame
pub const ORIENTATION_FIELDS: usize = 6;

/// Total size of the orientation frame in bytes
pub const ORIENTATION_FRAME_LEN: usize = SYNC.len() + 2 + ORIENTATION_FIELDS * 2;

/// An encoded binary frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryFrame {
    message_id: u8,
    data: Bytes,
}

impl BinaryFrame {
    /// Message identifier byte
    pub fn message_id(&self) -> u8 {
        self.message_id
    }

    /// Wire bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Frame size in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the frame is empty (never true for a built frame)
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Payload after the header
    pub fn payload(&self) -> &[u8] {
        &self.data[SYNC.len() + 2..]
    }

    /// Consume into the underlying buffer
    pub fn into_bytes(self) -> Bytes {
        self.data
    }
}

/// Incremental frame writer
#[derive(Debug)]
pub struct FrameBuilder {
    message_id: u8,
    buf: BytesMut,
}

impl FrameBuilder {
    /// Start a frame with the sync prefix, message id and length constant
    pub fn new(message_id: u8, length: u8) -> Self {
        let mut buf = BytesMut::with_capacity(ORIENTATION_FRAME_LEN);
        buf.put_slice(&SYNC);
        buf.put_u8(message_id);
        buf.put_u8(length);
        Self { message_id, buf }
    }

    /// Start an orientation frame
    pub fn orientation() -> Self {
        Self::new(ORIENTATION_MESSAGE_ID, ORIENTATION_LENGTH)
    }

    /// Append a little-endian signed 16-bit field
    #[must_use]
    pub fn i16(mut self, value: i16) -> Self {
        self.buf.put_i16_le(value);
        self
    }

    /// Append a little-endian unsigned 16-bit field
    #[must_use]
    pub fn u16(mut self, value: u16) -> Self {
        self.buf.put_u16_le(value);
        self
    }

    /// Finish the frame
    pub fn finish(self) -> BinaryFrame {
        BinaryFrame {
            message_id: self.message_id,
            data: self.buf.freeze(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        let frame = FrameBuilder::orientation().finish();
        assert_eq!(frame.as_bytes(), &[0x0D, 0x0A, 0x7E, 0x70, 0x12]);
        assert_eq!(frame.message_id(), ORIENTATION_MESSAGE_ID);
        assert!(frame.payload().is_empty());
    }

    #[test]
    fn test_fields_are_little_endian() {
        let frame = FrameBuilder::orientation().i16(-2).u16(0x1234).finish();
        assert_eq!(frame.payload(), &[0xFE, 0xFF, 0x34, 0x12]);
    }

    #[test]
    fn test_orientation_frame_length() {
        let mut builder = FrameBuilder::orientation();
        for _ in 0..ORIENTATION_FIELDS {
            builder = builder.i16(0);
        }
        let frame = builder.finish();
        assert_eq!(frame.len(), 17);
        assert_eq!(ORIENTATION_FRAME_LEN, 17);
    }
}

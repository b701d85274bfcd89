//! Message encoding
//!
//! Turns a validated [`ParameterSnapshot`] into wire bytes for the active
//! [`MessageKind`]:
//! - Compass and Sonar render an NMEA sentence from a fixed field layout
//! - Sensor packs a binary orientation frame with fixed-point fields
//!
//! [`encode`] assumes its input already passed validation; [`encode_validated`]
//! runs the validation gate first.

use crate::core::codec::HexCodec;
use crate::core::device::{MessageKind, ParameterSnapshot, ValidationError, Value};
use crate::core::protocol::frame::FrameBuilder;
use crate::core::protocol::nmea::format_number;
use crate::core::protocol::{BinaryFrame, NmeaSentence, Scale};
use thiserror::Error;

/// Encoder invariant violated (input did not pass validation)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    /// A field the layout reads is absent
    #[error("{kind} encoder: field '{key}' is missing")]
    MissingField {
        /// Device kind
        kind: MessageKind,
        /// Field key
        key: &'static str,
    },

    /// A field holds the wrong kind of value
    #[error("{kind} encoder: field '{key}' must be a {expected}")]
    WrongType {
        /// Device kind
        kind: MessageKind,
        /// Field key
        key: &'static str,
        /// Expected value type
        expected: &'static str,
    },
}

/// Snapshot could not be turned into a message
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MessageError {
    /// Snapshot failed validation
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Encoder invariant violated
    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

/// One rendered field of an ASCII sentence
#[derive(Debug, Clone, Copy)]
enum SentenceField {
    /// Token copied from the snapshot
    Token(&'static str),
    /// Number rounded to `decimals` places and zero-padded to `width`
    Number {
        key: &'static str,
        decimals: u32,
        width: usize,
    },
    /// Constant text, including reserved blanks
    Literal(&'static str),
}

const COMPASS_LAYOUT: &[SentenceField] = &[
    SentenceField::Token("id"),
    SentenceField::Number {
        key: "heading",
        decimals: 1,
        width: 5,
    },
    SentenceField::Token("power"),
];

const SONAR_LAYOUT: &[SentenceField] = &[
    SentenceField::Token("id"),
    SentenceField::Literal(""),
    SentenceField::Literal(""),
    SentenceField::Number {
        key: "depth",
        decimals: 2,
        width: 6,
    },
    SentenceField::Literal("M"),
    SentenceField::Number {
        key: "danger",
        decimals: 2,
        width: 2,
    },
    SentenceField::Literal("M"),
    SentenceField::Token("accuracy"),
];

/// One 16-bit field of the orientation frame
#[derive(Debug, Clone, Copy)]
struct FrameField {
    key: &'static str,
    scale: Scale,
    signed: bool,
}

const ORIENTATION_LAYOUT: &[FrameField] = &[
    FrameField { key: "roll", scale: Scale::Angle, signed: true },
    FrameField { key: "pitch", scale: Scale::Angle, signed: true },
    FrameField { key: "heading", scale: Scale::Angle, signed: false },
    FrameField { key: "magc", scale: Scale::FieldStrength, signed: true },
    FrameField { key: "magb", scale: Scale::FieldStrength, signed: true },
    FrameField { key: "magz", scale: Scale::FieldStrength, signed: true },
];

/// An encoded message, ready for the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodedMessage {
    /// ASCII sentence
    Sentence(NmeaSentence),
    /// Binary frame
    Frame(BinaryFrame),
}

impl EncodedMessage {
    /// Wire bytes
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Sentence(sentence) => sentence.as_bytes(),
            Self::Frame(frame) => frame.as_bytes(),
        }
    }

    /// Human-readable rendering: the sentence without CR LF, or a hex dump of
    /// the frame
    pub fn render(&self) -> String {
        match self {
            Self::Sentence(sentence) => sentence.to_ascii().to_string(),
            Self::Frame(frame) => HexCodec::new().bytes_per_line(0).encode(frame.as_bytes()),
        }
    }
}

/// Encode a snapshot that has already been validated for `kind`.
pub fn encode(kind: MessageKind, snapshot: &ParameterSnapshot) -> Result<EncodedMessage, EncodingError> {
    match kind {
        MessageKind::Compass => encode_sentence(kind, COMPASS_LAYOUT, snapshot).map(EncodedMessage::Sentence),
        MessageKind::Sonar => encode_sentence(kind, SONAR_LAYOUT, snapshot).map(EncodedMessage::Sentence),
        MessageKind::Sensor => encode_frame(kind, ORIENTATION_LAYOUT, snapshot).map(EncodedMessage::Frame),
    }
}

/// Validate a snapshot against the kind's field specification, then encode it.
pub fn encode_validated(kind: MessageKind, snapshot: &ParameterSnapshot) -> Result<EncodedMessage, MessageError> {
    kind.spec().validate(snapshot)?;
    Ok(encode(kind, snapshot)?)
}

fn lookup<'a>(
    kind: MessageKind,
    snapshot: &'a ParameterSnapshot,
    key: &'static str,
) -> Result<&'a Value, EncodingError> {
    snapshot.get(key).ok_or(EncodingError::MissingField { kind, key })
}

fn number(kind: MessageKind, snapshot: &ParameterSnapshot, key: &'static str) -> Result<f64, EncodingError> {
    lookup(kind, snapshot, key)?.as_number().ok_or(EncodingError::WrongType {
        kind,
        key,
        expected: "number",
    })
}

fn encode_sentence(
    kind: MessageKind,
    layout: &[SentenceField],
    snapshot: &ParameterSnapshot,
) -> Result<NmeaSentence, EncodingError> {
    let spec = kind.spec();
    let mut fields = Vec::with_capacity(layout.len());

    for field in layout {
        let rendered = match *field {
            SentenceField::Token(key) => lookup(kind, snapshot, key)?
                .as_token()
                .ok_or(EncodingError::WrongType {
                    kind,
                    key,
                    expected: "token",
                })?
                .to_string(),
            SentenceField::Number { key, decimals, width } => {
                let value = number(kind, snapshot, key)?;
                let fractional = spec.field(key).map_or(true, |f| f.domain.is_fractional());
                format_number(value, decimals, fractional, width)
            }
            SentenceField::Literal(text) => text.to_string(),
        };
        fields.push(rendered);
    }

    Ok(NmeaSentence::new(fields))
}

fn encode_frame(
    kind: MessageKind,
    layout: &[FrameField],
    snapshot: &ParameterSnapshot,
) -> Result<BinaryFrame, EncodingError> {
    let mut builder = FrameBuilder::orientation();

    for field in layout {
        let value = number(kind, snapshot, field.key)?;
        builder = if field.signed {
            builder.i16(field.scale.encode_signed(value))
        } else {
            builder.u16(field.scale.encode_unsigned(value))
        };
    }

    Ok(builder.finish())
}

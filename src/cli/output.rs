//! Output formatting for CLI reports

use crate::core::codec::{HexCodec, HexFormat};
use crate::core::device::{FieldSpec, MessageKind, ParameterSnapshot};
use crate::core::encoder::EncodedMessage;
use serde::Serialize;
use std::fmt::Write as _;

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON (one document per report; one object per line while running)
    Json,
}

/// Description of one device kind
#[derive(Debug, Serialize)]
pub struct DeviceReport {
    /// Kind
    pub kind: MessageKind,
    /// Display name
    pub name: &'static str,
    /// Binary frame rather than ASCII sentence
    pub binary: bool,
    /// Input fields in declaration order
    pub fields: &'static [FieldSpec],
    /// Initial value of every field
    pub defaults: ParameterSnapshot,
}

impl DeviceReport {
    /// Text rendering
    pub fn to_text(&self) -> String {
        let mut out = format!(
            "{:<8} {} ({})\n",
            self.kind.to_string(),
            self.name,
            if self.binary { "binary frame" } else { "NMEA sentence" }
        );
        for field in self.fields {
            let default = self
                .defaults
                .get(field.key)
                .map(ToString::to_string)
                .unwrap_or_default();
            let _ = writeln!(
                out,
                "  {:<10} {:<18} {:<22} default {}",
                field.key, field.label, field.domain.to_string(), default
            );
        }
        out
    }
}

/// Build the report for one kind
pub fn device_report(kind: MessageKind) -> DeviceReport {
    let spec = kind.spec();
    DeviceReport {
        kind,
        name: spec.name,
        binary: kind.is_binary(),
        fields: spec.fields,
        defaults: spec.default_snapshot(),
    }
}

/// One encoded message, as printed by `encode`
#[derive(Debug, Serialize)]
pub struct EncodeReport {
    /// Kind
    pub kind: MessageKind,
    /// Parameters the message was built from
    pub parameters: ParameterSnapshot,
    /// Display rendering
    pub rendered: String,
    /// Wire bytes as compact hex
    pub hex: String,
    /// Wire length in bytes
    pub length: usize,
}

impl EncodeReport {
    /// Text rendering
    pub fn to_text(&self) -> String {
        format!("{}\n{} bytes: {}", self.rendered, self.length, self.hex)
    }
}

/// Build the report for an encoded message
pub fn encode_report(kind: MessageKind, parameters: ParameterSnapshot, message: &EncodedMessage) -> EncodeReport {
    let bytes = message.as_bytes();
    EncodeReport {
        kind,
        parameters,
        rendered: message.render(),
        hex: HexCodec::new()
            .format(HexFormat::Compact)
            .bytes_per_line(0)
            .encode(bytes),
        length: bytes.len(),
    }
}

//! Hexadecimal rendering of binary frames

/// Hex display format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HexFormat {
    /// Uppercase hex (e.g., "0D 0A 7E")
    #[default]
    Upper,
    /// Lowercase hex (e.g., "0d 0a 7e")
    Lower,
    /// No spaces (e.g., "0D0A7E")
    Compact,
}

/// Hex codec configuration
#[derive(Debug, Clone)]
pub struct HexCodecConfig {
    /// Hex format
    pub format: HexFormat,
    /// Bytes per line (0 = no line breaks)
    pub bytes_per_line: usize,
    /// Show line offsets
    pub show_offsets: bool,
}

impl Default for HexCodecConfig {
    fn default() -> Self {
        Self {
            format: HexFormat::Upper,
            bytes_per_line: 16,
            show_offsets: false,
        }
    }
}

/// Hex codec for frame display
#[derive(Debug, Clone, Default)]
pub struct HexCodec {
    config: HexCodecConfig,
}

impl HexCodec {
    /// Create a new hex codec with default config
    pub fn new() -> Self {
        Self::default()
    }

    /// Set format
    #[must_use]
    pub fn format(mut self, format: HexFormat) -> Self {
        self.config.format = format;
        self
    }

    /// Set bytes per line
    #[must_use]
    pub fn bytes_per_line(mut self, n: usize) -> Self {
        self.config.bytes_per_line = n;
        self
    }

    /// Enable line offsets
    #[must_use]
    pub fn show_offsets(mut self, show: bool) -> Self {
        self.config.show_offsets = show;
        self
    }

    fn encode_line(&self, chunk: &[u8]) -> String {
        match self.config.format {
            HexFormat::Compact => ::hex::encode_upper(chunk),
            HexFormat::Upper => join_bytes(chunk, |b| format!("{b:02X}")),
            HexFormat::Lower => join_bytes(chunk, |b| format!("{b:02x}")),
        }
    }

    /// Encode bytes to display text
    pub fn encode(&self, data: &[u8]) -> String {
        if data.is_empty() {
            return String::new();
        }

        if self.config.bytes_per_line == 0 {
            return self.encode_line(data);
        }

        data.chunks(self.config.bytes_per_line)
            .enumerate()
            .map(|(line_idx, chunk)| {
                let hex = self.encode_line(chunk);
                if self.config.show_offsets {
                    format!("{:08X}  {hex}", line_idx * self.config.bytes_per_line)
                } else {
                    hex
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn join_bytes(chunk: &[u8], format_byte: impl Fn(u8) -> String) -> String {
    chunk
        .iter()
        .map(|&b| format_byte(b))
        .collect::<Vec<_>>()
        .join(" ")
}

//! Display codecs
//!
//! Binary frames are shown in the message log as hex rather than text.

mod hex;

pub use self::hex::{HexCodec, HexFormat};

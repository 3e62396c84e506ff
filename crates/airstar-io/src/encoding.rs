//! Text decoding for raw CSV fields.

use std::borrow::Cow;

use encoding_rs::UTF_8;

/// Character encoding of a delimited text file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    /// ISO-8859-1: every byte maps to the code point of the same value.
    #[default]
    Latin1,
    /// UTF-8; invalid sequences are replaced rather than rejected.
    Utf8,
}

impl TextEncoding {
    pub fn decode<'a>(self, bytes: &'a [u8]) -> Cow<'a, str> {
        match self {
            TextEncoding::Latin1 => encoding_rs::mem::decode_latin1(bytes),
            TextEncoding::Utf8 => UTF_8.decode_without_bom_handling(bytes).0,
        }
    }

    /// Decode a header cell; strips a leading UTF-8 byte order mark.
    pub fn decode_header<'a>(self, bytes: &'a [u8]) -> Cow<'a, str> {
        match self {
            TextEncoding::Latin1 => self.decode(bytes),
            TextEncoding::Utf8 => UTF_8.decode_with_bom_removal(bytes).0,
        }
    }
}

impl std::str::FromStr for TextEncoding {
    type Err = crate::error::IoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "latin1" | "latin-1" | "iso-8859-1" | "iso8859-1" => Ok(TextEncoding::Latin1),
            "utf8" | "utf-8" => Ok(TextEncoding::Utf8),
            other => Err(crate::error::IoError::Config(format!(
                "unsupported encoding '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latin1_maps_high_bytes() {
        // "São" in ISO-8859-1
        let raw = [b'S', 0xE3, b'o'];
        assert_eq!(TextEncoding::Latin1.decode(&raw), "São");
    }

    #[test]
    fn utf8_header_drops_bom() {
        let raw = b"\xEF\xBB\xBFYear";
        assert_eq!(TextEncoding::Utf8.decode_header(raw), "Year");
        assert_eq!(TextEncoding::Utf8.decode(b"ok"), "ok");
    }
}

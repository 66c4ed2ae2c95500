//! # String Encodings
//!
//! Byte encodings for string fields. Encoding is always bounded: a limit
//! is given in bytes and text is cut at a character boundary, never inside
//! a multi-byte sequence.

use tracing::debug;

/// Supported string encodings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextEncoding {
    /// UTF-8.
    #[default]
    Utf8,
    /// 7-bit ASCII; other characters become `?`.
    Ascii,
    /// ISO-8859-1, one byte per character; other characters become `?`.
    Latin1,
    /// UTF-16 little endian.
    Utf16Le,
    /// Text is a hex string, stored as the bytes it spells.
    Hex,
}

impl TextEncoding {
    /// Resolves an encoding name, case-insensitive.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let encoding = match name.to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" => Self::Utf8,
            "ascii" => Self::Ascii,
            "latin1" | "binary" => Self::Latin1,
            "ucs2" | "ucs-2" | "utf16le" | "utf-16le" => Self::Utf16Le,
            "hex" => Self::Hex,
            _ => return None,
        };
        Some(encoding)
    }

    /// Encodes at most `limit` bytes of `text`.
    #[must_use]
    pub fn encode(self, text: &str, limit: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(limit.min(text.len() * 2));
        match self {
            Self::Utf8 => {
                let mut end = text.len().min(limit);
                while !text.is_char_boundary(end) {
                    end -= 1;
                }
                out.extend_from_slice(&text.as_bytes()[..end]);
            }
            Self::Ascii | Self::Latin1 => {
                let top = if self == Self::Ascii { 0x7F } else { 0xFF };
                for c in text.chars().take(limit) {
                    out.push(u8::try_from(u32::from(c)).ok().filter(|b| *b <= top).unwrap_or(b'?'));
                }
            }
            Self::Utf16Le => {
                let mut units = [0u16; 2];
                for c in text.chars() {
                    let encoded = c.encode_utf16(&mut units);
                    if out.len() + encoded.len() * 2 > limit {
                        break;
                    }
                    for unit in encoded.iter() {
                        out.extend_from_slice(&unit.to_le_bytes());
                    }
                }
            }
            Self::Hex => match hex::decode(text) {
                Ok(mut bytes) => {
                    bytes.truncate(limit);
                    out = bytes;
                }
                Err(e) => debug!(error = %e, "Invalid hex string, encoding as empty"),
            },
        }
        out
    }

    /// Decodes bytes; invalid sequences are replaced, never rejected.
    #[must_use]
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Self::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Self::Ascii => bytes.iter().map(|b| char::from(b & 0x7F)).collect(),
            Self::Latin1 => bytes.iter().map(|b| char::from(*b)).collect(),
            Self::Utf16Le => {
                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                    .collect();
                String::from_utf16_lossy(&units)
            }
            Self::Hex => hex::encode(bytes),
        }
    }

    /// Decodes a zero-padded fixed-width slot.
    #[must_use]
    pub fn decode_padded(self, bytes: &[u8]) -> String {
        if self == Self::Hex {
            let end = bytes.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
            return hex::encode(&bytes[..end]);
        }
        let mut text = self.decode(bytes);
        let trimmed = text.trim_end_matches('\0').len();
        text.truncate(trimmed);
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_names() {
        assert_eq!(TextEncoding::from_name("UTF8"), Some(TextEncoding::Utf8));
        assert_eq!(TextEncoding::from_name("binary"), Some(TextEncoding::Latin1));
        assert_eq!(TextEncoding::from_name("ucs2"), Some(TextEncoding::Utf16Le));
        assert_eq!(TextEncoding::from_name("ebcdic"), None);
    }

    #[test]
    fn test_utf8_truncates_on_char_boundary() {
        // 'é' is two bytes; a 2-byte limit cannot split it.
        let bytes = TextEncoding::Utf8.encode("aé", 2);
        assert_eq!(bytes, b"a");
        assert_eq!(TextEncoding::Utf8.encode("aé", 3), "aé".as_bytes());
    }

    #[test]
    fn test_ascii_replaces_wide_chars() {
        assert_eq!(TextEncoding::Ascii.encode("aé", 10), b"a?");
        assert_eq!(TextEncoding::Latin1.encode("aé", 10), vec![b'a', 0xE9]);
    }

    #[test]
    fn test_utf16_round_trip() {
        let bytes = TextEncoding::Utf16Le.encode("hi", 10);
        assert_eq!(bytes, vec![b'h', 0, b'i', 0]);
        assert_eq!(TextEncoding::Utf16Le.decode(&bytes), "hi");
        assert_eq!(TextEncoding::Utf16Le.encode("hi", 3).len(), 2);
    }

    #[test]
    fn test_hex_round_trip_and_invalid() {
        let bytes = TextEncoding::Hex.encode("beef", 10);
        assert_eq!(bytes, vec![0xBE, 0xEF]);
        assert_eq!(TextEncoding::Hex.decode(&bytes), "beef");
        assert!(TextEncoding::Hex.encode("xyz", 10).is_empty());
    }

    #[test]
    fn test_padded_decode_strips_nuls() {
        assert_eq!(TextEncoding::Utf8.decode_padded(b"fr\0\0"), "fr");
        assert_eq!(TextEncoding::Hex.decode_padded(&[0xAB, 0, 0]), "ab");
    }

    #[test]
    fn test_invalid_utf8_is_lossy() {
        let text = TextEncoding::Utf8.decode(&[b'o', 0xFF, b'k']);
        assert!(text.starts_with('o'));
        assert!(text.ends_with('k'));
    }
}

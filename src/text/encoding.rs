//! Character-set detection, decoding and re-encoding.
//!
//! Detection walks a fixed list of decoders and stops at the first one that
//! decodes the whole buffer without errors. The last entry is a single-byte
//! charset that maps every byte, so detection never fails.

use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE, WINDOWS_1252};

/// A detected text encoding, remembering whether the input carried a BOM.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextEncoding {
    encoding: &'static Encoding,
    bom: bool,
}

impl Default for TextEncoding {
    fn default() -> Self {
        Self {
            encoding: UTF_8,
            bom: false,
        }
    }
}

impl TextEncoding {
    /// The underlying `encoding_rs` encoding.
    #[must_use]
    pub const fn encoding(self) -> &'static Encoding {
        self.encoding
    }

    /// WHATWG name of the encoding, e.g. `"UTF-8"`.
    #[must_use]
    pub fn name(self) -> &'static str {
        self.encoding.name()
    }

    /// Decode `content` (including any BOM) into a string.
    ///
    /// Bytes that are invalid in this encoding become U+FFFD.
    #[must_use]
    pub fn decode(self, content: &[u8]) -> String {
        let body = if self.bom {
            Encoding::for_bom(content).map_or(content, |(_, len)| &content[len..])
        } else {
            content
        };
        self.encoding
            .decode_without_bom_handling(body)
            .0
            .into_owned()
    }

    /// Encode `text` back into this encoding, restoring the BOM if the
    /// source had one.
    #[must_use]
    pub fn encode(self, text: &str) -> Vec<u8> {
        let mut out = Vec::with_capacity(text.len() + 3);
        if self.encoding == UTF_16LE {
            if self.bom {
                out.extend_from_slice(&[0xFF, 0xFE]);
            }
            out.extend(text.encode_utf16().flat_map(u16::to_le_bytes));
        } else if self.encoding == UTF_16BE {
            if self.bom {
                out.extend_from_slice(&[0xFE, 0xFF]);
            }
            out.extend(text.encode_utf16().flat_map(u16::to_be_bytes));
        } else {
            if self.bom && self.encoding == UTF_8 {
                out.extend_from_slice(&[0xEF, 0xBB, 0xBF]);
            }
            out.extend_from_slice(&self.encoding.encode(text).0);
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Decoder chain
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug)]
enum Decoder {
    /// UTF-8 / UTF-16 announced by a byte-order mark.
    Bom,
    /// Strict UTF-8 (covers plain ASCII).
    Utf8,
    /// Statistical guess for legacy charsets.
    Detected,
    /// Windows-1252, which maps every byte.
    SingleByte,
}

const DECODERS: [Decoder; 4] = [
    Decoder::Bom,
    Decoder::Utf8,
    Decoder::Detected,
    Decoder::SingleByte,
];

impl Decoder {
    fn attempt(self, content: &[u8]) -> Option<TextEncoding> {
        match self {
            Self::Bom => Encoding::for_bom(content).and_then(|(encoding, len)| {
                decodes_cleanly(encoding, &content[len..]).then_some(TextEncoding {
                    encoding,
                    bom: true,
                })
            }),
            Self::Utf8 => decodes_cleanly(UTF_8, content).then_some(TextEncoding {
                encoding: UTF_8,
                bom: false,
            }),
            Self::Detected => {
                let mut detector = chardetng::EncodingDetector::new();
                detector.feed(content, true);
                let encoding = detector.guess(None, false);
                decodes_cleanly(encoding, content).then_some(TextEncoding {
                    encoding,
                    bom: false,
                })
            }
            Self::SingleByte => Some(TextEncoding {
                encoding: WINDOWS_1252,
                bom: false,
            }),
        }
    }
}

fn decodes_cleanly(encoding: &'static Encoding, content: &[u8]) -> bool {
    encoding
        .decode_without_bom_handling_and_without_replacement(content)
        .is_some()
}

/// Guess the encoding of `content`.
///
/// An empty buffer is UTF-8.
#[must_use]
pub fn detect_encoding(content: &[u8]) -> TextEncoding {
    DECODERS
        .iter()
        .find_map(|decoder| decoder.attempt(content))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_and_utf8_are_utf8() {
        assert_eq!(detect_encoding(b"plain").name(), "UTF-8");
        assert_eq!(detect_encoding("gr\u{fc}n".as_bytes()).name(), "UTF-8");
        assert_eq!(detect_encoding(b"").name(), "UTF-8");
    }

    #[test]
    fn utf16_bom_is_honoured_and_restored() {
        let content = [0xFF, 0xFE, b'h', 0, b'i', 0];
        let enc = detect_encoding(&content);
        assert_eq!(enc.name(), "UTF-16LE");
        assert_eq!(enc.decode(&content), "hi");
        assert_eq!(enc.encode("hi"), content);
    }

    #[test]
    fn utf8_bom_is_stripped_on_decode() {
        let content = b"\xEF\xBB\xBFabc";
        let enc = detect_encoding(content);
        assert_eq!(enc.decode(content), "abc");
        assert_eq!(enc.encode("abc"), content.to_vec());
    }

    #[test]
    fn invalid_utf8_falls_back_to_single_byte_charset() {
        let content = b"caf\xE9 \xE0 la cr\xE8me";
        let enc = detect_encoding(content);
        assert_ne!(enc.name(), "UTF-8");
        let text = enc.decode(content);
        assert!(text.starts_with("caf"));
        assert!(!text.contains('\u{FFFD}'));
    }

    #[test]
    fn single_byte_charset_round_trips() {
        let enc = TextEncoding {
            encoding: WINDOWS_1252,
            bom: false,
        };
        let content = b"na\xEFve";
        assert_eq!(enc.encode(&enc.decode(content)), content.to_vec());
    }
}

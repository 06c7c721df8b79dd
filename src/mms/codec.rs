//! Payload transfer encodings and character sets.
//!
//! Part payloads arrive either as inline text (`plain`) or as base64. Text
//! payloads are turned back into bytes in the part's declared character set
//! so every part carries raw bytes, whatever its source.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ThreadpackError};

/// Transfer encoding of a part payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Payload is the text itself
    Plain,
    /// Payload is base64 of the raw bytes
    Base64,
}

impl Encoding {
    /// Resolves an encoding tag. Unknown tags yield `None`; callers skip the
    /// part rather than fail.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "plain" | "text" => Some(Encoding::Plain),
            "base64" | "b64" => Some(Encoding::Base64),
            _ => None,
        }
    }

    /// Resolves an optional tag, defaulting to [`Encoding::Plain`] when absent.
    pub fn from_optional_tag(tag: Option<&str>) -> Result<Self> {
        match tag.map(str::trim).filter(|t| !t.is_empty()) {
            None => Ok(Encoding::Plain),
            Some(t) => Self::from_tag(t).ok_or_else(|| ThreadpackError::UnknownEncoding {
                tag: t.to_string(),
            }),
        }
    }

    /// Produces raw payload bytes from inline `payload` text.
    ///
    /// Plain text is encoded in `charset`; base64 ignores `charset`.
    pub fn decode(self, payload: &str, charset: Charset) -> Result<Vec<u8>> {
        match self {
            Encoding::Plain => charset.encode(payload),
            Encoding::Base64 => {
                let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
                STANDARD
                    .decode(compact.as_bytes())
                    .or_else(|_| STANDARD_NO_PAD.decode(compact.as_bytes()))
                    .map_err(ThreadpackError::from)
            }
        }
    }
}

/// Character sets a text payload may be declared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Charset {
    #[default]
    Utf8,
    UsAscii,
    Latin1,
    /// UTF-16 with optional byte-order mark, big-endian when absent
    Utf16,
    Utf16Be,
    Utf16Le,
}

impl Charset {
    /// Resolves a charset name or IANA MIBenum number.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadpackError::UnsupportedCharset`] for anything else.
    pub fn resolve(name: &str) -> Result<Self> {
        let normalized = name.trim().trim_matches('"').to_ascii_lowercase();
        match normalized.as_str() {
            "utf-8" | "utf8" | "106" => Ok(Charset::Utf8),
            "us-ascii" | "ascii" | "3" => Ok(Charset::UsAscii),
            "iso-8859-1" | "iso_8859-1" | "latin1" | "latin-1" | "4" => Ok(Charset::Latin1),
            "utf-16" | "utf16" | "1015" => Ok(Charset::Utf16),
            "utf-16be" | "1013" => Ok(Charset::Utf16Be),
            "utf-16le" | "1014" => Ok(Charset::Utf16Le),
            _ => Err(ThreadpackError::unsupported_charset(name.trim())),
        }
    }

    /// Resolves an optional declaration. Absent, empty, and `null` fall back
    /// to `default`.
    pub fn resolve_or(name: Option<&str>, default: Charset) -> Result<Self> {
        match name.map(str::trim) {
            None | Some("") => Ok(default),
            Some(n) if n.eq_ignore_ascii_case("null") => Ok(default),
            Some(n) => Self::resolve(n),
        }
    }

    /// Canonical name of this charset.
    pub fn name(self) -> &'static str {
        match self {
            Charset::Utf8 => "UTF-8",
            Charset::UsAscii => "US-ASCII",
            Charset::Latin1 => "ISO-8859-1",
            Charset::Utf16 => "UTF-16",
            Charset::Utf16Be => "UTF-16BE",
            Charset::Utf16Le => "UTF-16LE",
        }
    }

    /// Decodes `bytes` into text.
    ///
    /// UTF-8 is decoded lossily; ASCII and UTF-16 reject malformed input.
    pub fn decode(self, bytes: &[u8]) -> Result<String> {
        let invalid = || ThreadpackError::InvalidText { charset: self.name() };
        match self {
            Charset::Utf8 => Ok(String::from_utf8_lossy(bytes).into_owned()),
            Charset::UsAscii => {
                if bytes.is_ascii() {
                    Ok(bytes.iter().map(|&b| b as char).collect())
                } else {
                    Err(invalid())
                }
            }
            Charset::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
            Charset::Utf16 => match bytes {
                [0xFF, 0xFE, rest @ ..] => decode_utf16(rest, u16::from_le_bytes).ok_or_else(invalid),
                [0xFE, 0xFF, rest @ ..] => decode_utf16(rest, u16::from_be_bytes).ok_or_else(invalid),
                _ => decode_utf16(bytes, u16::from_be_bytes).ok_or_else(invalid),
            },
            Charset::Utf16Be => decode_utf16(bytes, u16::from_be_bytes).ok_or_else(invalid),
            Charset::Utf16Le => decode_utf16(bytes, u16::from_le_bytes).ok_or_else(invalid),
        }
    }

    /// Encodes `text` in this charset.
    pub fn encode(self, text: &str) -> Result<Vec<u8>> {
        let invalid = || ThreadpackError::InvalidText { charset: self.name() };
        match self {
            Charset::Utf8 => Ok(text.as_bytes().to_vec()),
            Charset::UsAscii => {
                if text.is_ascii() {
                    Ok(text.as_bytes().to_vec())
                } else {
                    Err(invalid())
                }
            }
            Charset::Latin1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).map_err(|_| invalid()))
                .collect(),
            Charset::Utf16 | Charset::Utf16Be => {
                Ok(text.encode_utf16().flat_map(u16::to_be_bytes).collect())
            }
            Charset::Utf16Le => Ok(text.encode_utf16().flat_map(u16::to_le_bytes).collect()),
        }
    }
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> Option<String> {
    if bytes.len() % 2 != 0 {
        return None;
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| unit([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units).ok()
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

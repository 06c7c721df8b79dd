//! Shared parsing utilities for all readers.
//!
//! This module contains the element tree both XML readers walk, timestamp
//! helpers, and input loading (gzip detection, byte-order marks, declared
//! encodings).

pub mod timestamp;
pub mod xml;

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::bytes::Regex;

use crate::error::{Result, ThreadpackError};
use crate::mms::Charset;

pub use timestamp::{localize, parse_epoch_millis, parse_flexible, parse_pattern};
pub use xml::{XmlElement, parse_document};

/// First two bytes of every gzip stream.
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

static XML_ENCODING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*<\?xml[^>]*?\bencoding\s*=\s*["']([A-Za-z0-9._-]+)["']"#).expect("valid regex")
});

/// Reads a backup file into a string, inflating gzip input.
///
/// # Errors
///
/// - [`ThreadpackError::InputNotFound`] if `path` does not exist
/// - [`ThreadpackError::UnreadableInput`] if `path` is a directory or unreadable
/// - [`ThreadpackError::Io`] for other read failures
pub fn read_input(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(ThreadpackError::InputNotFound {
            path: path.to_path_buf(),
        });
    }
    if path.is_dir() {
        return Err(ThreadpackError::UnreadableInput {
            path: Some(path.to_path_buf()),
        });
    }
    let bytes = fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => ThreadpackError::UnreadableInput {
            path: Some(path.to_path_buf()),
        },
        _ => ThreadpackError::Io(e),
    })?;
    decode_input(&bytes).map_err(|e| e.with_path(path))
}

/// Turns raw backup bytes into text.
///
/// Gzip streams are inflated when the `gzip` feature is enabled. A leading
/// UTF-8 byte-order mark is dropped, a UTF-16 one selects UTF-16. Otherwise
/// the encoding named by the XML declaration applies, UTF-8 when there is
/// none. Only the charsets [`Charset::resolve`] knows are accepted.
pub fn decode_input(bytes: &[u8]) -> Result<String> {
    let inflated;
    let bytes = if bytes.starts_with(&GZIP_MAGIC) {
        inflated = inflate(bytes)?;
        inflated.as_slice()
    } else {
        bytes
    };
    if let Some(rest) = bytes.strip_prefix(b"\xEF\xBB\xBF") {
        return decode_utf8(rest);
    }
    if bytes.starts_with(&[0xFF, 0xFE]) || bytes.starts_with(&[0xFE, 0xFF]) {
        return decode_with(bytes, Charset::Utf16);
    }

    match declared_encoding(bytes) {
        None => decode_utf8(bytes),
        Some(name) => match Charset::resolve(&name) {
            Ok(Charset::Utf8) => decode_utf8(bytes),
            Ok(charset) => decode_with(bytes, charset),
            Err(_) => Err(ThreadpackError::structure(
                "XML",
                format!("unsupported document encoding `{name}`"),
            )),
        },
    }
}

/// Encoding named in the XML declaration, if any.
fn declared_encoding(bytes: &[u8]) -> Option<String> {
    let prolog = &bytes[..bytes.len().min(256)];
    let name = XML_ENCODING.captures(prolog)?.get(1)?;
    Some(String::from_utf8_lossy(name.as_bytes()).into_owned())
}

fn decode_utf8(bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|e| ThreadpackError::structure("XML", format!("input is not UTF-8: {e}")))
}

fn decode_with(bytes: &[u8], charset: Charset) -> Result<String> {
    let text = charset
        .decode(bytes)
        .map_err(|e| ThreadpackError::structure("XML", e.to_string()))?;
    if text.starts_with('\u{feff}') {
        return Ok(text['\u{feff}'.len_utf8()..].to_string());
    }
    Ok(text)
}

#[cfg(feature = "gzip")]
fn inflate(bytes: &[u8]) -> Result<Vec<u8>> {
    use std::io::Read;

    let mut out = Vec::new();
    flate2::read::GzDecoder::new(bytes).read_to_end(&mut out)?;
    Ok(out)
}

#[cfg(not(feature = "gzip"))]
fn inflate(_bytes: &[u8]) -> Result<Vec<u8>> {
    Err(ThreadpackError::invalid_format(
        "XML",
        "gzip input requires the `gzip` feature",
    ))
}

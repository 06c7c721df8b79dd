//! Multimedia message parts.
//!
//! - [`codec`]: payload transfer encodings and character sets
//! - [`content_type`]: content-type registry and part dispatch
//! - [`part`]: the [`MultimediaPart`] model
//! - [`smil`]: presentation descriptions and display ordering
//!
//! Both XML readers describe parts as a bag of attributes plus a payload;
//! they fill a [`RawPart`] and hand it to [`build_part`].

pub mod codec;
pub mod content_type;
pub mod part;
pub mod smil;

use tracing::{debug, warn};

pub use codec::{Charset, Encoding};
pub use content_type::{ContentKind, instantiate};
pub use part::{MultimediaPart, PartBody};
pub use smil::{PartRef, order_parts, parse_description};

use crate::error::Result;

/// Part attributes as read from a backup, before decoding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPart {
    pub content_type: Option<String>,
    pub content_id: Option<String>,
    pub content_location: Option<String>,
    /// Transfer encoding tag; absent means plain
    pub encoding: Option<String>,
    pub charset: Option<String>,
    pub payload: String,
}

/// Decodes and builds one part.
///
/// Returns `Ok(None)` when the content type is unknown, the encoding tag is
/// unrecognized, or the kind has no part representation. Callers skip those
/// parts.
///
/// # Errors
///
/// Propagates charset and payload decoding failures.
pub fn build_part(raw: &RawPart, default_charset: Charset) -> Result<Option<MultimediaPart>> {
    let content_type = raw.content_type.as_deref().unwrap_or_default();
    let Some(kind) = ContentKind::resolve(content_type) else {
        warn!(content_type, "Unknown content type, skipping part");
        return Ok(None);
    };

    let encoding = match raw.encoding.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        None => Encoding::Plain,
        Some(tag) => match Encoding::from_tag(tag) {
            Some(encoding) => encoding,
            None => {
                warn!(encoding = tag, "Unknown payload encoding, skipping part");
                return Ok(None);
            }
        },
    };

    let charset = Charset::resolve_or(raw.charset.as_deref(), default_charset)?;
    let data = encoding.decode(&raw.payload, charset)?;
    debug!(kind = %kind, bytes = data.len(), "Decoded part");
    instantiate(
        kind,
        raw.content_id.as_deref(),
        raw.content_location.as_deref(),
        &data,
        charset,
    )
}

//! Content-type registry.
//!
//! Maps a MIME-like content type onto a [`ContentKind`] and dispatches to the
//! constructor of the matching [`PartBody`] variant. Kinds without a
//! constructor (audio, video) resolve but never instantiate.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::codec::Charset;
use super::part::{MultimediaPart, PartBody};
use super::smil;
use crate::error::Result;

/// Known part content kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentKind {
    ImageJpeg,
    ImagePng,
    ImageGif,
    TextPlain,
    /// Presentation description (`application/smil`)
    Smil,
    VCard,
    AudioAmr,
    Video3gpp,
}

/// Builds a part body from its raw payload.
pub type BodyConstructor = fn(&[u8], Charset) -> Result<PartBody>;

impl ContentKind {
    /// Every registered kind.
    pub const ALL: [ContentKind; 8] = [
        ContentKind::ImageJpeg,
        ContentKind::ImagePng,
        ContentKind::ImageGif,
        ContentKind::TextPlain,
        ContentKind::Smil,
        ContentKind::VCard,
        ContentKind::AudioAmr,
        ContentKind::Video3gpp,
    ];

    /// Resolves a content-type string, ignoring parameters and case.
    ///
    /// ```
    /// use threadpack::mms::ContentKind;
    ///
    /// assert_eq!(ContentKind::resolve("text/plain; charset=utf-8"), Some(ContentKind::TextPlain));
    /// assert_eq!(ContentKind::resolve("application/pdf"), None);
    /// ```
    pub fn resolve(content_type: &str) -> Option<Self> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(ContentKind::ImageJpeg),
            "image/png" => Some(ContentKind::ImagePng),
            "image/gif" => Some(ContentKind::ImageGif),
            "text/plain" => Some(ContentKind::TextPlain),
            "application/smil" => Some(ContentKind::Smil),
            "text/x-vcard" | "text/vcard" => Some(ContentKind::VCard),
            "audio/amr" => Some(ContentKind::AudioAmr),
            "video/3gpp" => Some(ContentKind::Video3gpp),
            _ => None,
        }
    }

    /// Canonical MIME string.
    pub fn mime(self) -> &'static str {
        match self {
            ContentKind::ImageJpeg => "image/jpeg",
            ContentKind::ImagePng => "image/png",
            ContentKind::ImageGif => "image/gif",
            ContentKind::TextPlain => "text/plain",
            ContentKind::Smil => "application/smil",
            ContentKind::VCard => "text/x-vCard",
            ContentKind::AudioAmr => "audio/amr",
            ContentKind::Video3gpp => "video/3gpp",
        }
    }

    /// Returns `true` for image kinds.
    pub fn is_image(self) -> bool {
        matches!(
            self,
            ContentKind::ImageJpeg | ContentKind::ImagePng | ContentKind::ImageGif
        )
    }

    /// Dispatch table entry for this kind.
    pub fn constructor(self) -> Option<BodyConstructor> {
        match self {
            ContentKind::TextPlain => Some(text_body),
            ContentKind::ImageJpeg | ContentKind::ImagePng | ContentKind::ImageGif => Some(image_body),
            ContentKind::VCard => Some(vcard_body),
            ContentKind::Smil => Some(presentation_body),
            ContentKind::AudioAmr | ContentKind::Video3gpp => None,
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

fn text_body(data: &[u8], charset: Charset) -> Result<PartBody> {
    Ok(PartBody::Text {
        text: charset.decode(data)?,
    })
}

fn image_body(_data: &[u8], _charset: Charset) -> Result<PartBody> {
    Ok(PartBody::Image)
}

fn vcard_body(data: &[u8], charset: Charset) -> Result<PartBody> {
    Ok(PartBody::ContactCard {
        vcard: charset.decode(data)?,
    })
}

fn presentation_body(data: &[u8], charset: Charset) -> Result<PartBody> {
    let markup = charset.decode(data)?;
    let refs = match smil::parse_description(&markup) {
        Ok(refs) => refs,
        Err(e) => {
            warn!(error = %e, "Unreadable presentation description, parts stay unordered");
            Vec::new()
        }
    };
    Ok(PartBody::Presentation { refs })
}

/// Builds the part for `kind`.
///
/// Returns `Ok(None)` for kinds with no part representation.
///
/// # Errors
///
/// Fails when a text payload does not decode in `charset`.
pub fn instantiate(
    kind: ContentKind,
    content_id: Option<&str>,
    content_location: Option<&str>,
    data: &[u8],
    charset: Charset,
) -> Result<Option<MultimediaPart>> {
    let Some(build) = kind.constructor() else {
        debug!(kind = %kind, "No part representation, skipping");
        return Ok(None);
    };
    let body = build(data, charset)?;
    Ok(Some(MultimediaPart::new(
        kind,
        content_id,
        content_location,
        charset,
        data,
        body,
    )))
}

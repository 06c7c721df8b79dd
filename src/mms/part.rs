//! Multimedia message parts.

use serde::Serialize;

use super::codec::Charset;
use super::content_type::ContentKind;
use super::smil::PartRef;

/// Kind-specific content of a part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PartBody {
    /// Decoded text
    Text { text: String },
    /// Image bytes live in [`MultimediaPart::data`]
    Image,
    /// Decoded vCard text
    ContactCard { vcard: String },
    /// Presentation description, parsed once at construction
    Presentation { refs: Vec<PartRef> },
}

/// One typed part of a multimedia message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MultimediaPart {
    /// Registered content kind
    pub kind: ContentKind,

    /// Content identifier with angle brackets stripped; empty when absent
    pub content_id: String,

    /// Content location, used by presentation descriptions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_location: Option<String>,

    /// Character set the payload was declared in
    pub charset: Charset,

    #[serde(skip)]
    data: Vec<u8>,

    /// Kind-specific content
    #[serde(flatten)]
    pub body: PartBody,
}

impl MultimediaPart {
    /// Creates a part, copying `data`.
    pub fn new(
        kind: ContentKind,
        content_id: Option<&str>,
        content_location: Option<&str>,
        charset: Charset,
        data: &[u8],
        body: PartBody,
    ) -> Self {
        Self {
            kind,
            content_id: content_id.map(strip_angle_brackets).unwrap_or_default(),
            content_location: content_location
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string),
            charset,
            data: data.to_vec(),
            body,
        }
    }

    /// Raw payload bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Decoded text of a text part.
    pub fn text(&self) -> Option<&str> {
        match &self.body {
            PartBody::Text { text } => Some(text),
            _ => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self.body, PartBody::Text { .. })
    }

    pub fn is_presentation(&self) -> bool {
        matches!(self.body, PartBody::Presentation { .. })
    }

    /// References held by a presentation part; empty for other parts.
    pub fn refs(&self) -> &[PartRef] {
        match &self.body {
            PartBody::Presentation { refs } => refs,
            _ => &[],
        }
    }

    /// Name shown for this part: its location if set, else its identifier.
    pub fn display_name(&self) -> &str {
        self.content_location.as_deref().unwrap_or(&self.content_id)
    }
}

/// Strips surrounding whitespace and one pair of angle brackets.
pub(crate) fn strip_angle_brackets(id: &str) -> String {
    let id = id.trim();
    id.strip_prefix('<')
        .and_then(|s| s.strip_suffix('>'))
        .unwrap_or(id)
        .to_string()
}

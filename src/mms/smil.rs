//! Presentation descriptions (SMIL).
//!
//! A presentation description is a small XML document whose `par` elements
//! hold media elements pointing at sibling parts through their `src`
//! attribute:
//!
//! ```xml
//! <smil><body>
//!   <par dur="5000ms"><img src="cid:photo"/><text src="caption.txt"/></par>
//! </body></smil>
//! ```
//!
//! `cid:` references match a part's content identifier; anything else is a
//! content location.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use super::part::{MultimediaPart, strip_angle_brackets};
use crate::error::Result;
use crate::parsing::xml::parse_document;

/// Reference from a presentation description to a part.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PartRef {
    /// `cid:` reference, prefix and angle brackets removed
    ContentId(String),
    /// Bare content-location reference
    Location(String),
}

impl PartRef {
    /// Classifies a `src` attribute value.
    pub fn parse(src: &str) -> Self {
        let src = src.trim();
        match src.get(..4) {
            Some(prefix) if prefix.eq_ignore_ascii_case("cid:") => {
                PartRef::ContentId(strip_angle_brackets(&src[4..]))
            }
            _ => PartRef::Location(src.to_string()),
        }
    }

    fn matches(&self, part: &MultimediaPart) -> bool {
        match self {
            PartRef::ContentId(id) => part.content_id == *id,
            PartRef::Location(location) => part.content_location.as_deref() == Some(location.as_str()),
        }
    }

    // Some encoders write a bare content id where a location is expected.
    fn matches_loosely(&self, part: &MultimediaPart) -> bool {
        match self {
            PartRef::Location(location) => part.content_id == *location,
            PartRef::ContentId(_) => false,
        }
    }
}

impl fmt::Display for PartRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartRef::ContentId(id) => write!(f, "cid:{id}"),
            PartRef::Location(location) => f.write_str(location),
        }
    }
}

/// Collects the `src` of every child of every `par` element, in document
/// order.
///
/// # Errors
///
/// Returns a parse error if `markup` is not well-formed XML.
pub fn parse_description(markup: &str) -> Result<Vec<PartRef>> {
    let root = parse_document(markup)?;
    let refs = root
        .descendants_named("par")
        .into_iter()
        .flat_map(|par| par.children.iter())
        .filter_map(|media| media.attr("src"))
        .filter(|src| !src.trim().is_empty())
        .map(PartRef::parse)
        .collect();
    Ok(refs)
}

/// Orders `parts` for display following `refs`.
///
/// Each reference picks the first part it matches. Presentation parts are
/// never returned and no part is returned twice. When `refs` is empty or
/// resolves to nothing, every non-presentation part is returned in its
/// original order.
pub fn order_parts<'a>(parts: &'a [MultimediaPart], refs: &[PartRef]) -> Vec<&'a MultimediaPart> {
    let mut seen = HashSet::new();
    let mut ordered = Vec::new();

    for reference in refs {
        let candidates = || parts.iter().enumerate().filter(|(_, p)| !p.is_presentation());
        let found = candidates()
            .find(|(_, p)| reference.matches(p))
            .or_else(|| candidates().find(|(_, p)| reference.matches_loosely(p)));
        if let Some((index, part)) = found {
            if seen.insert(index) {
                ordered.push(part);
            }
        }
    }

    if ordered.is_empty() {
        return parts.iter().filter(|p| !p.is_presentation()).collect();
    }
    ordered
}

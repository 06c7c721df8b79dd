//! Minimal element tree over `quick_xml` events.
//!
//! Backups are walked as trees rather than event streams: readers need to look
//! at an `mms` element's attributes, its `address` children and its `part`
//! children together. Text nodes and CDATA sections are concatenated into the
//! owning element's [`text`](XmlElement::text).

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{Result, ThreadpackError};

/// One element of a parsed document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    /// Local element name (namespace prefix dropped)
    pub name: String,
    /// Attributes in document order, values unescaped
    pub attributes: Vec<(String, String)>,
    /// Child elements in document order
    pub children: Vec<XmlElement>,
    /// Concatenated text and CDATA content, unescaped
    pub text: String,
}

impl XmlElement {
    /// Returns the value of the attribute `key`.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the value of the first attribute in `keys` that is present.
    pub fn attr_any(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|key| self.attr(key))
    }

    /// Like [`attr`](Self::attr), treating empty values and the literal
    /// `null` as absent.
    pub fn attr_present(&self, key: &str) -> Option<&str> {
        self.attr(key)
            .map(str::trim)
            .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("null"))
    }

    /// Iterates over direct children named `name`.
    pub fn children_named<'a, 'n>(&'a self, name: &'n str) -> impl Iterator<Item = &'a XmlElement> + use<'a, 'n> {
        self.children
            .iter()
            .filter(move |c| c.name.eq_ignore_ascii_case(name))
    }

    /// Returns the first direct child named `name`.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children_named(name).next()
    }

    /// Collects every descendant named `name`, depth-first in document order.
    pub fn descendants_named<'a>(&'a self, name: &str) -> Vec<&'a XmlElement> {
        let mut found = Vec::new();
        collect_named(self, name, &mut found);
        found
    }
}

fn collect_named<'a>(element: &'a XmlElement, name: &str, found: &mut Vec<&'a XmlElement>) {
    for child in &element.children {
        if child.name.eq_ignore_ascii_case(name) {
            found.push(child);
        }
        collect_named(child, name, found);
    }
}

/// Parses `content` into its root element.
///
/// # Errors
///
/// Returns [`ThreadpackError::Parse`] on malformed markup, mismatched or
/// unclosed tags, a missing root, or more than one root.
pub fn parse_document(content: &str) -> Result<XmlElement> {
    let mut reader = Reader::from_str(content);
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(element_from(&start)?),
            Event::Empty(start) => {
                let element = element_from(&start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| ThreadpackError::structure("XML", "unexpected closing tag"))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                if let Some(open) = stack.last_mut() {
                    open.text.push_str(&text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let Some(open) = stack.last_mut() {
                    open.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(ThreadpackError::structure(
            "XML",
            format!("document ended inside <{}>", open.name),
        ));
    }
    root.ok_or_else(|| ThreadpackError::structure("XML", "document has no root element"))
}

fn element_from(start: &BytesStart<'_>) -> Result<XmlElement> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        attributes.push((key, value));
    }
    Ok(XmlElement {
        name,
        attributes,
        ..XmlElement::default()
    })
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        return Ok(());
    }
    if root.is_some() {
        return Err(ThreadpackError::structure("XML", "more than one root element"));
    }
    *root = Some(element);
    Ok(())
}

//! Normalized message type for all backup sources.
//!
//! This module provides [`Message`], the representation every reader
//! produces, and [`Direction`].
//!
//! # Overview
//!
//! A message always has an address, a timestamp, a body, and a direction.
//! Multimedia messages also carry a subject and typed parts; when one of
//! those parts is a presentation description the message remembers the
//! display order it defines.
//!
//! # Identity
//!
//! Two messages are equal when address, timestamp, body, direction, and relay
//! are equal. Parts do not take part in equality. Messages order by
//! timestamp first, so a [`BTreeSet`](std::collections::BTreeSet) of messages
//! is chronological and collapses duplicates.
//!
//! # Examples
//!
//! ```
//! use chrono::{FixedOffset, TimeZone};
//! use threadpack::{Direction, Message};
//!
//! let ts = FixedOffset::east_opt(0).unwrap().with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
//! let msg = Message::new("+15550100", ts, "See you at 8", Direction::Received);
//!
//! assert_eq!(msg.to_string(), "2024-01-15 10:30:00 RECEIVED +15550100: See you at 8");
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::error::ThreadpackError;
use crate::mms::{MultimediaPart, PartBody, PartRef, order_parts};

/// Which way a message travelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Sent,
    Received,
    Draft,
}

impl Direction {
    /// Upper-case label used in text output.
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Sent => "SENT",
            Direction::Received => "RECEIVED",
            Direction::Draft => "DRAFT",
        }
    }
}

impl FromStr for Direction {
    type Err = ThreadpackError;

    /// Parses a direction word, case-insensitively.
    ///
    /// `inbox` is accepted as [`Direction::Received`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sent" => Ok(Direction::Sent),
            "received" | "inbox" => Ok(Direction::Received),
            "draft" => Ok(Direction::Draft),
            _ => Err(ThreadpackError::unknown_direction(s)),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a message carries beyond its body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Content {
    /// Text-only message
    Plain,

    /// Multimedia message without a presentation description
    Multimedia {
        #[serde(skip_serializing_if = "Option::is_none")]
        subject: Option<String>,
        parts: Vec<MultimediaPart>,
    },

    /// Multimedia message whose parts are ordered by a presentation description
    Presented {
        #[serde(skip_serializing_if = "Option::is_none")]
        subject: Option<String>,
        parts: Vec<MultimediaPart>,
        order: Vec<PartRef>,
    },
}

/// A normalized message from any supported backup.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    /// Counterpart address (phone number, e-mail, or account name)
    pub address: String,

    /// Relay the message passed through, such as an SMS service center
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relay: Option<String>,

    /// When the message was sent or received
    pub timestamp: DateTime<FixedOffset>,

    /// Text body; for multimedia messages the text parts in display order
    pub body: String,

    pub direction: Direction,

    #[serde(flatten)]
    pub content: Content,
}

impl Message {
    /// Creates a plain text message.
    pub fn new(
        address: impl Into<String>,
        timestamp: DateTime<FixedOffset>,
        body: impl Into<String>,
        direction: Direction,
    ) -> Self {
        Self {
            address: address.into(),
            relay: None,
            timestamp,
            body: body.into(),
            direction,
            content: Content::Plain,
        }
    }

    /// Creates a multimedia message.
    ///
    /// If any part is a presentation description the message keeps the
    /// references of the first one and becomes [`Content::Presented`]. The
    /// body is built from the text parts in display order, joined by spaces.
    pub fn multimedia(
        address: impl Into<String>,
        timestamp: DateTime<FixedOffset>,
        direction: Direction,
        subject: Option<String>,
        parts: Vec<MultimediaPart>,
    ) -> Self {
        let order = parts.iter().find_map(|p| match &p.body {
            PartBody::Presentation { refs } => Some(refs.clone()),
            _ => None,
        });
        let body = order_parts(&parts, order.as_deref().unwrap_or_default())
            .into_iter()
            .filter_map(MultimediaPart::text)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        let content = match order {
            Some(order) => Content::Presented { subject, parts, order },
            None => Content::Multimedia { subject, parts },
        };
        Self {
            address: address.into(),
            relay: None,
            timestamp,
            body,
            direction,
            content,
        }
    }

    /// Sets the relay identifier.
    #[must_use]
    pub fn with_relay(mut self, relay: impl Into<String>) -> Self {
        self.relay = Some(relay.into());
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn relay(&self) -> Option<&str> {
        self.relay.as_deref()
    }

    pub fn timestamp(&self) -> DateTime<FixedOffset> {
        self.timestamp
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Subject line of a multimedia message.
    pub fn subject(&self) -> Option<&str> {
        match &self.content {
            Content::Plain => None,
            Content::Multimedia { subject, .. } | Content::Presented { subject, .. } => {
                subject.as_deref()
            }
        }
    }

    /// All parts in their original order, presentation parts included.
    pub fn parts(&self) -> &[MultimediaPart] {
        match &self.content {
            Content::Plain => &[],
            Content::Multimedia { parts, .. } | Content::Presented { parts, .. } => parts,
        }
    }

    /// Parts in display order.
    ///
    /// Follows the presentation description when there is one and it
    /// resolves; otherwise every non-presentation part in original order.
    pub fn message_parts(&self) -> Vec<&MultimediaPart> {
        match &self.content {
            Content::Plain => Vec::new(),
            Content::Multimedia { parts, .. } => order_parts(parts, &[]),
            Content::Presented { parts, order, .. } => order_parts(parts, order),
        }
    }

    pub fn is_multimedia(&self) -> bool {
        !matches!(self.content, Content::Plain)
    }

    fn identity(&self) -> (&DateTime<FixedOffset>, &str, Direction, &str, Option<&str>) {
        (
            &self.timestamp,
            &self.address,
            self.direction,
            &self.body,
            self.relay.as_deref(),
        )
    }
}

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for Message {}

impl PartialOrd for Message {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Timestamp first; the remaining fields only break ties so that ordering
// agrees with equality.
impl Ord for Message {
    fn cmp(&self, other: &Self) -> Ordering {
        self.identity().cmp(&other.identity())
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}: {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.direction,
            self.address,
            self.body
        )?;
        for part in self.message_parts() {
            match part.body {
                PartBody::Text { .. } | PartBody::Presentation { .. } => {}
                PartBody::Image => write!(f, " [Image: {}]", part.display_name())?,
                PartBody::ContactCard { .. } => write!(f, " [Contact card: {}]", part.display_name())?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mms::{Charset, ContentKind};
    use chrono::TimeZone;

    fn ts(hour: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 1, hour, 0, 0)
            .unwrap()
    }

    fn text_part(id: &str, text: &str) -> MultimediaPart {
        MultimediaPart::new(
            ContentKind::TextPlain,
            Some(id),
            Some(&format!("{id}.txt")),
            Charset::Utf8,
            text.as_bytes(),
            PartBody::Text { text: text.to_string() },
        )
    }

    fn image_part(id: &str) -> MultimediaPart {
        MultimediaPart::new(ContentKind::ImageJpeg, Some(id), Some(&format!("{id}.jpg")), Charset::Utf8, &[0xFF], PartBody::Image)
    }

    fn smil_part(refs: Vec<PartRef>) -> MultimediaPart {
        MultimediaPart::new(ContentKind::Smil, Some("smil"), None, Charset::Utf8, &[], PartBody::Presentation { refs })
    }

    #[test]
    fn test_direction_from_str() {
        assert_eq!("SENT".parse::<Direction>().unwrap(), Direction::Sent);
        assert_eq!("inbox".parse::<Direction>().unwrap(), Direction::Received);
        assert_eq!("Draft".parse::<Direction>().unwrap(), Direction::Draft);
        assert!("outbox".parse::<Direction>().is_err());
    }

    #[test]
    fn test_equality_ignores_parts() {
        let a = Message::multimedia("a", ts(1), Direction::Sent, None, vec![image_part("x")]);
        let b = Message::multimedia("a", ts(1), Direction::Sent, None, vec![image_part("y")]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_equality_includes_relay() {
        let a = Message::new("a", ts(1), "hi", Direction::Received);
        let b = a.clone().with_relay("+1555");
        assert_ne!(a, b);
    }

    #[test]
    fn test_ordering_by_timestamp_first() {
        let early = Message::new("z", ts(1), "zzz", Direction::Sent);
        let late = Message::new("a", ts(2), "aaa", Direction::Received);
        assert!(early < late);
    }

    #[test]
    fn test_ordering_consistent_with_equality() {
        let a = Message::new("a", ts(1), "one", Direction::Sent);
        let b = Message::new("a", ts(1), "two", Direction::Sent);
        assert_ne!(a.cmp(&b), Ordering::Equal);
        assert_eq!(a.cmp(&a.clone()), Ordering::Equal);
    }

    #[test]
    fn test_multimedia_without_presentation() {
        let msg = Message::multimedia(
            "a",
            ts(1),
            Direction::Received,
            Some("Trip".into()),
            vec![image_part("img"), text_part("t", "Look!")],
        );
        assert!(matches!(msg.content, Content::Multimedia { .. }));
        assert_eq!(msg.body(), "Look!");
        assert_eq!(msg.subject(), Some("Trip"));
        assert_eq!(msg.message_parts().len(), 2);
    }

    #[test]
    fn test_presented_message_orders_parts() {
        let refs = vec![
            PartRef::ContentId("b".into()),
            PartRef::ContentId("a".into()),
            PartRef::ContentId("c".into()),
        ];
        let msg = Message::multimedia(
            "a",
            ts(1),
            Direction::Sent,
            None,
            vec![text_part("a", "first"), smil_part(refs), text_part("b", "second"), text_part("c", "third")],
        );
        assert!(matches!(msg.content, Content::Presented { .. }));
        let ids: Vec<_> = msg.message_parts().iter().map(|p| p.content_id.as_str()).collect();
        assert_eq!(ids, ["b", "a", "c"]);
        assert_eq!(msg.body(), "second first third");
        assert_eq!(msg.parts().len(), 4);
    }

    #[test]
    fn test_presented_message_fallback() {
        let msg = Message::multimedia(
            "a",
            ts(1),
            Direction::Sent,
            None,
            vec![text_part("a", "first"), smil_part(Vec::new()), image_part("b")],
        );
        let ids: Vec<_> = msg.message_parts().iter().map(|p| p.content_id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn test_display_plain() {
        let msg = Message::new("+15550100", ts(9), "Hello", Direction::Sent);
        assert_eq!(msg.to_string(), "2024-03-01 09:00:00 SENT +15550100: Hello");
    }

    #[test]
    fn test_display_lists_attachments() {
        let msg = Message::multimedia("a", ts(9), Direction::Received, None, vec![text_part("t", "Hi"), image_part("cat")]);
        assert_eq!(msg.to_string(), "2024-03-01 09:00:00 RECEIVED a: Hi [Image: cat.jpg]");
    }

    #[test]
    fn test_plain_message_has_no_parts() {
        let msg = Message::new("a", ts(1), "x", Direction::Draft);
        assert!(msg.message_parts().is_empty());
        assert!(!msg.is_multimedia());
    }
}

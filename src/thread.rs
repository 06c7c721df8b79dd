//! Message threads and the per-import thread collection.
//!
//! A [`Thread`] is identified by its label, `"Name <address>"`. Two threads
//! with the same label are the same thread: [`ThreadCollection::insert`]
//! merges their messages. Distinct addresses that format to the same label
//! therefore share one thread; the collection logs a warning when that
//! happens.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;
use tracing::warn;

use crate::message::Message;

/// Name shown for threads whose contact is unknown.
pub const UNKNOWN_CONTACT: &str = "(Unknown)";

/// The messages exchanged with one address.
#[derive(Debug, Clone, Serialize)]
pub struct Thread {
    /// Contact display name, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Counterpart address
    pub address: String,

    /// Messages in chronological order, duplicates collapsed
    pub messages: BTreeSet<Message>,
}

impl Thread {
    /// Creates an empty thread.
    ///
    /// Empty names, `null`, and the unknown-contact placeholder count as no
    /// name.
    pub fn new(name: Option<String>, address: impl Into<String>) -> Self {
        let name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty() && n != UNKNOWN_CONTACT && !n.eq_ignore_ascii_case("null"));
        Self {
            name,
            address: address.into(),
            messages: BTreeSet::new(),
        }
    }

    /// Adds a message. Returns `false` if an equal message was already present.
    pub fn add(&mut self, message: Message) -> bool {
        self.messages.insert(message)
    }

    /// Identity label: `"Name <address>"`, with a placeholder for no name.
    ///
    /// ```
    /// use threadpack::Thread;
    ///
    /// let thread = Thread::new(None, "+1 (555) 010-0200");
    /// assert_eq!(thread.label(), "(Unknown) <+15550100200>");
    /// ```
    pub fn label(&self) -> String {
        format!("{} <{}>", self.display_name(), format_address(&self.address))
    }

    /// Contact name or the unknown-contact placeholder.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(UNKNOWN_CONTACT)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Iterates messages chronologically.
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    /// Moves every message of `other` into this thread.
    pub fn merge(&mut self, other: Thread) {
        self.messages.extend(other.messages);
        if self.name.is_none() {
            self.name = other.name;
        }
    }

    /// Keeps only messages matching `keep`.
    pub fn retain(&mut self, keep: impl FnMut(&Message) -> bool) {
        self.messages.retain(keep);
    }
}

impl PartialEq for Thread {
    fn eq(&self, other: &Self) -> bool {
        self.label() == other.label()
    }
}

impl Eq for Thread {}

impl PartialOrd for Thread {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Thread {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.label().cmp(&other.label())
    }
}

impl fmt::Display for Thread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Formats an address for display.
///
/// Phone-like addresses lose their separators (spaces, dashes, dots,
/// parentheses). Anything containing letters or `@` is returned trimmed.
pub fn format_address(address: &str) -> String {
    let address = address.trim();
    let phone_like = address
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')' | '.' | '*' | '#'));
    if !phone_like {
        return address.to_string();
    }
    address
        .chars()
        .filter(|c| !matches!(c, '-' | ' ' | '(' | ')' | '.'))
        .collect()
}

/// Threads of one import, keyed and ordered by label.
#[derive(Debug, Clone, Default)]
pub struct ThreadCollection {
    threads: BTreeMap<String, Thread>,
}

impl ThreadCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a thread, merging it into an existing one with the same label.
    pub fn insert(&mut self, thread: Thread) {
        let label = thread.label();
        match self.threads.get_mut(&label) {
            Some(existing) => {
                if existing.address != thread.address {
                    warn!(
                        label = %label,
                        kept = %existing.address,
                        merged = %thread.address,
                        "Distinct addresses share a thread label, merging their messages"
                    );
                }
                existing.merge(thread);
            }
            None => {
                self.threads.insert(label, thread);
            }
        }
    }

    /// Number of threads.
    pub fn len(&self) -> usize {
        self.threads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }

    /// Number of messages across all threads.
    pub fn message_count(&self) -> usize {
        self.threads.values().map(Thread::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Thread> {
        self.threads.values()
    }

    pub fn clear(&mut self) {
        self.threads.clear();
    }

    /// Threads ordered by label.
    pub fn into_vec(self) -> Vec<Thread> {
        self.threads.into_values().collect()
    }
}

impl FromIterator<Thread> for ThreadCollection {
    fn from_iter<I: IntoIterator<Item = Thread>>(iter: I) -> Self {
        let mut collection = Self::new();
        for thread in iter {
            collection.insert(thread);
        }
        collection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Direction;
    use chrono::{FixedOffset, TimeZone};

    fn msg(address: &str, minute: u32, body: &str) -> Message {
        let ts = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 5, 1, 12, minute, 0)
            .unwrap();
        Message::new(address, ts, body, Direction::Received)
    }

    #[test]
    fn test_thread_name_normalization() {
        assert_eq!(Thread::new(Some(String::new()), "1").name, None);
        assert_eq!(Thread::new(Some("(Unknown)".into()), "1").name, None);
        assert_eq!(Thread::new(Some("null".into()), "1").name, None);
        assert_eq!(Thread::new(Some(" Ann ".into()), "1").name.as_deref(), Some("Ann"));
    }

    #[test]
    fn test_label() {
        let thread = Thread::new(Some("Ann".into()), "555-0100");
        assert_eq!(thread.label(), "Ann <5550100>");
        let mail = Thread::new(None, "ann@example.com");
        assert_eq!(mail.label(), "(Unknown) <ann@example.com>");
    }

    #[test]
    fn test_messages_chronological_and_deduplicated() {
        let mut thread = Thread::new(None, "1");
        assert!(thread.add(msg("1", 30, "later")));
        assert!(thread.add(msg("1", 10, "earlier")));
        assert!(!thread.add(msg("1", 10, "earlier")));
        let bodies: Vec<_> = thread.messages().map(Message::body).collect();
        assert_eq!(bodies, ["earlier", "later"]);
    }

    #[test]
    fn test_threads_equal_by_label() {
        let a = Thread::new(Some("Ann".into()), "555 0100");
        let b = Thread::new(Some("Ann".into()), "5550100");
        assert_eq!(a, b);
    }

    #[test]
    fn test_collection_merges_on_label_collision() {
        let mut a = Thread::new(Some("Ann".into()), "555 0100");
        a.add(msg("555 0100", 1, "one"));
        let mut b = Thread::new(Some("Ann".into()), "555-0100");
        b.add(msg("555-0100", 2, "two"));

        let collection: ThreadCollection = [a, b].into_iter().collect();
        assert_eq!(collection.len(), 1);
        assert_eq!(collection.message_count(), 2);
    }

    #[test]
    fn test_collection_ordered_by_label() {
        let collection: ThreadCollection = [
            Thread::new(Some("Zed".into()), "2"),
            Thread::new(Some("Amy".into()), "1"),
        ]
        .into_iter()
        .collect();
        let names: Vec<_> = collection.iter().map(Thread::display_name).collect();
        assert_eq!(names, ["Amy", "Zed"]);
    }

    #[test]
    fn test_format_address() {
        assert_eq!(format_address("+1 (555) 010-0200"), "+15550100200");
        assert_eq!(format_address("Mom"), "Mom");
        assert_eq!(format_address(" *86 "), "*86");
    }
}

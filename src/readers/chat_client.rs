//! Desktop chat client database reader.
//!
//! The client keeps a SQLite `main.db` with a `Conversations` table (one row
//! per peer, `identity` holding the peer's account name) and a `Messages`
//! table. Only messages of one message-kind code are imported.
//!
//! Imports are all-or-nothing: any database error discards everything read
//! so far.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::{debug, info, warn};

use super::LoadedThreads;
use crate::config::ChatClientConfig;
use crate::error::{ErrorCode, Result};
use crate::extract::{ArchiveExtractor, resolve_input};
use crate::message::{Direction, Message};
use crate::parsing::localize;
use crate::parsing::timestamp::parse_epoch_seconds;
use crate::reader::{ImportSummary, Reader, Source, require_input};
use crate::sqlite::SqliteConversationStore;
use crate::thread::{Thread, ThreadCollection};

static MARKUP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

/// One conversation row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationRow {
    pub id: i64,
    /// Peer account name
    pub identity: String,
    pub display_name: Option<String>,
}

/// One message row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRow {
    pub conversation_id: i64,
    pub author: String,
    /// Message body with inline markup
    pub body: Option<String>,
    /// Unix seconds
    pub timestamp: i64,
}

/// The two queries the reader needs.
pub trait ConversationStore {
    /// Conversations holding at least one message of `message_kind`.
    fn conversations(&self, message_kind: i64) -> Result<Vec<ConversationRow>>;

    /// Every message of `message_kind`, oldest first.
    fn messages(&self, message_kind: i64) -> Result<Vec<ChatRow>>;
}

/// Reader for chat client databases.
pub struct ChatClientReader {
    config: ChatClientConfig,
    extractor: Option<Arc<dyn ArchiveExtractor>>,
    loaded: LoadedThreads,
}

impl ChatClientReader {
    pub fn new() -> Self {
        Self::with_config(ChatClientConfig::default())
    }

    pub fn with_config(config: ChatClientConfig) -> Self {
        Self {
            config,
            extractor: None,
            loaded: LoadedThreads::default(),
        }
    }

    /// Sets the extractor used for archived databases.
    #[must_use]
    pub fn with_extractor(mut self, extractor: Arc<dyn ArchiveExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn config(&self) -> &ChatClientConfig {
        &self.config
    }

    /// Loads threads from `store`, replacing prior state.
    pub fn load_store(&mut self, store: &dyn ConversationStore) -> Result<ImportSummary> {
        self.loaded.clear();
        let (collection, skipped) = self.read_store(store)?;
        let (threads, messages) = self.loaded.publish(collection);
        Ok(ImportSummary {
            threads,
            messages,
            skipped,
            status: ErrorCode::Success,
        })
    }

    fn read_store(&self, store: &dyn ConversationStore) -> Result<(ThreadCollection, usize)> {
        let kind = self.config.message_kind;
        let conversations = store.conversations(kind)?;
        let rows = store.messages(kind)?;

        let mut threads: HashMap<i64, Thread> = conversations
            .into_iter()
            .map(|c| (c.id, Thread::new(c.display_name, c.identity)))
            .collect();

        let offset = self.config.offset();
        let mut skipped = 0;
        for row in rows {
            let Some(thread) = threads.get_mut(&row.conversation_id) else {
                debug!(conversation = row.conversation_id, "Message for unknown conversation");
                skipped += 1;
                continue;
            };
            let Some(instant) = parse_epoch_seconds(row.timestamp) else {
                warn!(timestamp = row.timestamp, "Timestamp out of range, skipping message");
                skipped += 1;
                continue;
            };
            let direction = if row.author == thread.address {
                Direction::Received
            } else {
                Direction::Sent
            };
            let body = plain_body(row.body.as_deref().unwrap_or_default());
            let address = thread.address.clone();
            thread.add(Message::new(address, localize(instant, offset), body, direction));
        }

        Ok((threads.into_values().collect(), skipped))
    }
}

impl Default for ChatClientReader {
    fn default() -> Self {
        Self::new()
    }
}

impl Reader for ChatClientReader {
    fn name(&self) -> &'static str {
        "Chat client"
    }

    fn source(&self) -> Source {
        Source::ChatClient
    }

    fn import(&mut self, input: &Path, auxiliary: Option<&Path>) -> Result<ImportSummary> {
        self.loaded.clear();
        require_input(input)?;
        if let Some(path) = auxiliary {
            debug!(path = %path.display(), "Chat client imports carry their own names, ignoring address book");
        }

        let db_path = resolve_input(
            input,
            &self.config.database_filename,
            &self.config.extract_dir,
            self.extractor.as_deref(),
        )?;
        let store = SqliteConversationStore::open(&db_path, self.config.query_timeout)?;
        let (collection, skipped) = self.read_store(&store)?;
        let (threads, messages) = self.loaded.publish(collection);

        let status = match store.close() {
            Ok(()) => ErrorCode::Success,
            Err(e) => {
                warn!(error = %e, "Chat database did not close cleanly");
                ErrorCode::from(&e)
            }
        };

        info!(threads, messages, skipped, "Loaded chat client database");
        Ok(ImportSummary {
            threads,
            messages,
            skipped,
            status,
        })
    }

    fn threads(&self) -> &[Thread] {
        self.loaded.threads()
    }

    fn message_count(&self) -> usize {
        self.loaded.message_count()
    }
}

/// Strips inline markup from a message body and unescapes entities.
fn plain_body(body_xml: &str) -> String {
    let stripped = MARKUP.replace_all(body_xml, "");
    match quick_xml::escape::unescape(&stripped) {
        Ok(text) => text.into_owned(),
        Err(_) => stripped.into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ThreadpackError;

    struct FakeStore {
        conversations: Vec<ConversationRow>,
        messages: Vec<ChatRow>,
        fail_messages: bool,
    }

    impl ConversationStore for FakeStore {
        fn conversations(&self, _kind: i64) -> Result<Vec<ConversationRow>> {
            Ok(self.conversations.clone())
        }

        fn messages(&self, _kind: i64) -> Result<Vec<ChatRow>> {
            if self.fail_messages {
                return Err(ThreadpackError::invalid_format("chat database", "disk image is malformed"));
            }
            Ok(self.messages.clone())
        }
    }

    fn store() -> FakeStore {
        FakeStore {
            conversations: vec![ConversationRow {
                id: 7,
                identity: "alice.w".into(),
                display_name: Some("Alice".into()),
            }],
            messages: vec![
                ChatRow {
                    conversation_id: 7,
                    author: "alice.w".into(),
                    body: Some("Lunch &amp; coffee? <ss type=\"smile\">:)</ss>".into()),
                    timestamp: 1_700_000_060,
                },
                ChatRow {
                    conversation_id: 7,
                    author: "me.local".into(),
                    body: Some("Sure".into()),
                    timestamp: 1_700_000_000,
                },
                ChatRow {
                    conversation_id: 99,
                    author: "ghost".into(),
                    body: None,
                    timestamp: 1_700_000_000,
                },
            ],
            fail_messages: false,
        }
    }

    #[test]
    fn test_direction_from_author() {
        let mut reader = ChatClientReader::new();
        let summary = reader.load_store(&store()).unwrap();
        assert_eq!(summary.threads, 1);
        assert_eq!(summary.messages, 2);
        assert_eq!(summary.skipped, 1);

        let thread = &reader.threads()[0];
        assert_eq!(thread.label(), "Alice <alice.w>");
        let messages: Vec<_> = thread.messages().collect();
        assert_eq!(messages[0].direction(), Direction::Sent);
        assert!(messages.iter().all(|m| m.address() == "alice.w"));
        assert_eq!(messages[1].direction(), Direction::Received);
        assert_eq!(messages[1].body(), "Lunch & coffee? :)");
    }

    #[test]
    fn test_database_error_discards_everything() {
        let mut reader = ChatClientReader::new();
        reader.load_store(&store()).unwrap();

        let mut failing = store();
        failing.fail_messages = true;
        assert!(reader.load_store(&failing).is_err());
        assert!(reader.threads().is_empty());
        assert_eq!(reader.message_count(), 0);
    }

    #[test]
    fn test_plain_body() {
        assert_eq!(plain_body("a <b>bold</b> move"), "a bold move");
        assert_eq!(plain_body("1 &lt; 2"), "1 < 2");
        assert_eq!(plain_body("broken &entity"), "broken &entity");
    }

    #[test]
    fn test_missing_database() {
        let mut reader = ChatClientReader::new();
        let status = reader.load_messages(Path::new("/no/such/main.db"), None);
        assert_eq!(status, ErrorCode::InputNotFound);
    }
}

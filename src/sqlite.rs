//! SQLite adapters for the address-book and chat-client ports.
//!
//! Both databases are opened read-only. Every query runs under a deadline
//! enforced through SQLite's progress handler, so a corrupt snapshot cannot
//! hang an import.

use std::path::Path;
use std::time::{Duration, Instant};

use rusqlite::{Connection, OpenFlags, params};

use crate::contacts::AddressBook;
use crate::error::{Result, ThreadpackError};
use crate::readers::chat_client::{ChatRow, ConversationRow, ConversationStore};

/// Number of virtual machine steps between deadline checks.
const PROGRESS_STEPS: i32 = 1000;

const EXACT_QUERY: &str = "SELECT COALESCE(r.display_name, '') \
     FROM phone_lookup p JOIN raw_contacts r ON r._id = p.raw_contact_id \
     WHERE p.normalized_number = ?1 OR p.normalized_number = ?2";

const MIN_MATCH_QUERY: &str = "SELECT DISTINCT p.raw_contact_id, COALESCE(r.display_name, '') \
     FROM phone_lookup p JOIN raw_contacts r ON r._id = p.raw_contact_id \
     WHERE p.min_match = ?1";

const CONVERSATIONS_QUERY: &str = "SELECT c.id, c.identity, c.displayname FROM Conversations c \
     WHERE EXISTS (SELECT 1 FROM Messages m WHERE m.convo_id = c.id AND m.type = ?1) \
     ORDER BY c.id";

const MESSAGES_QUERY: &str = "SELECT convo_id, author, body_xml, timestamp FROM Messages \
     WHERE type = ?1 ORDER BY timestamp, id";

fn open_read_only(path: &Path, timeout: Duration) -> Result<Connection> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    conn.busy_timeout(timeout)?;
    Ok(conn)
}

/// Runs `query` with a deadline of `timeout` from now.
fn with_deadline<T>(
    conn: &Connection,
    timeout: Duration,
    query: impl FnOnce(&Connection) -> rusqlite::Result<T>,
) -> rusqlite::Result<T> {
    let deadline = Instant::now() + timeout;
    conn.progress_handler(PROGRESS_STEPS, Some(move || Instant::now() > deadline));
    let result = query(conn);
    conn.progress_handler(PROGRESS_STEPS, None::<fn() -> bool>);
    result
}

/// Android-style `contacts2.db` snapshot.
pub struct SqliteAddressBook {
    conn: Connection,
    timeout: Duration,
}

impl SqliteAddressBook {
    /// Opens the snapshot at `path`.
    ///
    /// Fails if the file is not a database holding the lookup tables.
    pub fn open(path: &Path, timeout: Duration) -> Result<Self> {
        Self::from_connection(open_read_only(path, timeout)?, timeout)
    }

    /// Wraps an existing connection after checking its schema.
    pub fn from_connection(conn: Connection, timeout: Duration) -> Result<Self> {
        conn.prepare(EXACT_QUERY)?;
        conn.prepare(MIN_MATCH_QUERY)?;
        Ok(Self { conn, timeout })
    }
}

impl AddressBook for SqliteAddressBook {
    fn exact_matches(&self, address: &str, normalized: &str) -> Result<Vec<String>> {
        let names = with_deadline(&self.conn, self.timeout, |conn| {
            let mut stmt = conn.prepare_cached(EXACT_QUERY)?;
            let rows = stmt.query_map(params![address, normalized], |row| row.get::<_, String>(0))?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })?;
        Ok(names)
    }

    fn min_match_candidates(&self, key: &str) -> Result<Vec<String>> {
        let names = with_deadline(&self.conn, self.timeout, |conn| {
            let mut stmt = conn.prepare_cached(MIN_MATCH_QUERY)?;
            let rows = stmt.query_map(params![key], |row| row.get::<_, String>(1))?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })?;
        Ok(names)
    }
}

/// Chat-client `main.db`.
pub struct SqliteConversationStore {
    conn: Connection,
    timeout: Duration,
}

impl SqliteConversationStore {
    pub fn open(path: &Path, timeout: Duration) -> Result<Self> {
        Ok(Self::from_connection(open_read_only(path, timeout)?, timeout))
    }

    pub fn from_connection(conn: Connection, timeout: Duration) -> Self {
        Self { conn, timeout }
    }

    /// Closes the connection.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadpackError::Close`] if SQLite refuses to close.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| ThreadpackError::Close(e))
    }
}

impl ConversationStore for SqliteConversationStore {
    fn conversations(&self, message_kind: i64) -> Result<Vec<ConversationRow>> {
        let rows = with_deadline(&self.conn, self.timeout, |conn| {
            let mut stmt = conn.prepare(CONVERSATIONS_QUERY)?;
            let rows = stmt.query_map(params![message_kind], |row| {
                Ok(ConversationRow {
                    id: row.get(0)?,
                    identity: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    display_name: row.get(2)?,
                })
            })?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })?;
        Ok(rows)
    }

    fn messages(&self, message_kind: i64) -> Result<Vec<ChatRow>> {
        let rows = with_deadline(&self.conn, self.timeout, |conn| {
            let mut stmt = conn.prepare(MESSAGES_QUERY)?;
            let rows = stmt.query_map(params![message_kind], |row| {
                Ok(ChatRow {
                    conversation_id: row.get(0)?,
                    author: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    body: row.get(2)?,
                    timestamp: row.get(3)?,
                })
            })?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })?;
        Ok(rows)
    }
}

/// Address book whose lookup view never finishes in time.
#[cfg(test)]
pub(crate) fn slow_address_book(timeout: Duration) -> SqliteAddressBook {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE raw_contacts (_id INTEGER PRIMARY KEY, display_name TEXT);
         INSERT INTO raw_contacts VALUES (1, 'Ann');
         CREATE VIEW phone_lookup AS
             WITH RECURSIVE n(i) AS (SELECT 1 UNION ALL SELECT i + 1 FROM n WHERE i < 500000000)
             SELECT 1 AS raw_contact_id, CAST(i AS TEXT) AS normalized_number, CAST(i AS TEXT) AS min_match FROM n;",
    )
    .unwrap();
    SqliteAddressBook::from_connection(conn, timeout).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::readers::ChatClientReader;

    fn address_book() -> SqliteAddressBook {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE raw_contacts (_id INTEGER PRIMARY KEY, display_name TEXT);
             CREATE TABLE phone_lookup (raw_contact_id INTEGER, normalized_number TEXT, min_match TEXT);
             INSERT INTO raw_contacts VALUES (1, 'Ann'), (2, 'Bob'), (3, 'Rob');
             INSERT INTO phone_lookup VALUES (1, '+15550100200', '0020010');
             INSERT INTO phone_lookup VALUES (2, '+15550300400', '0040030');
             INSERT INTO phone_lookup VALUES (2, '5550300400', '0040030');
             INSERT INTO phone_lookup VALUES (3, '+15550900400', '0040090');
             INSERT INTO phone_lookup VALUES (2, '+15559900400', '0040090');",
        )
        .unwrap();
        SqliteAddressBook::from_connection(conn, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_exact_matches() {
        let book = address_book();
        assert_eq!(book.exact_matches("+1 555", "+15550100200").unwrap(), vec!["Ann".to_string()]);
        assert!(book.exact_matches("x", "y").unwrap().is_empty());
    }

    #[test]
    fn test_min_match_candidates_distinct_contacts() {
        let book = address_book();
        assert_eq!(book.min_match_candidates("0040030").unwrap(), vec!["Bob".to_string()]);
        assert_eq!(book.min_match_candidates("0040090").unwrap().len(), 2);
    }

    #[test]
    fn test_schema_is_checked() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(SqliteAddressBook::from_connection(conn, Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_conversation_store_queries() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE Conversations (id INTEGER PRIMARY KEY, identity TEXT, displayname TEXT);
             CREATE TABLE Messages (id INTEGER PRIMARY KEY, convo_id INTEGER, author TEXT, body_xml TEXT, timestamp INTEGER, type INTEGER);
             INSERT INTO Conversations VALUES (1, 'alice', 'Alice'), (2, 'bob', NULL), (3, 'carol', 'Carol');
             INSERT INTO Messages VALUES (1, 1, 'alice', 'hi', 1700000060, 61);
             INSERT INTO Messages VALUES (2, 1, 'me', 'hello', 1700000000, 61);
             INSERT INTO Messages VALUES (3, 2, 'bob', 'call?', 1700000100, 61);
             INSERT INTO Messages VALUES (4, 3, 'carol', NULL, 1700000200, 30);",
        )
        .unwrap();
        let store = SqliteConversationStore::from_connection(conn, Duration::from_secs(5));

        let conversations = store.conversations(61).unwrap();
        assert_eq!(conversations.len(), 2);
        assert_eq!(conversations[1].display_name, None);

        let messages = store.messages(61).unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].body.as_deref(), Some("hello"));
        assert!(store.close().is_ok());
    }

    #[test]
    fn test_slow_lookup_is_interrupted() {
        let book = slow_address_book(Duration::from_millis(50));
        let start = Instant::now();
        let result = book.exact_matches("x", "y");
        assert!(result.is_err());
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_slow_chat_query_fails_import() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE Conversations (id INTEGER PRIMARY KEY, identity TEXT, displayname TEXT);
             CREATE VIEW Messages AS
                 WITH RECURSIVE n(i) AS (SELECT 1 UNION ALL SELECT i + 1 FROM n WHERE i < 500000000)
                 SELECT i AS id, 1 AS convo_id, 'x' AS author, '' AS body_xml, i AS timestamp, 0 AS type FROM n;",
        )
        .unwrap();
        let store = SqliteConversationStore::from_connection(conn, Duration::from_millis(50));

        let start = Instant::now();
        let err = ChatClientReader::new().load_store(&store).unwrap_err();
        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(ErrorCode::from(&err), ErrorCode::ReadFailure);
        assert_eq!(ErrorCode::from(&err).code(), 3);
    }
}

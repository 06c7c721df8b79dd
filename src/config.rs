//! Configuration types for readers and contact resolution.
//!
//! Every value a parse depends on (timestamp pattern, time zone, default
//! character set) travels inside these structs and is handed to each parse
//! call explicitly. Nothing is held in process-wide state, so separate reader
//! instances can run on separate threads.
//!
//! # Example
//!
//! ```rust
//! use threadpack::config::{FullBackupConfig, ParseConfig};
//! use threadpack::readers::FullBackupReader;
//!
//! let parse = ParseConfig::new().with_default_offset_minutes(60);
//! let reader = FullBackupReader::with_config(FullBackupConfig::new().with_parse(parse));
//! ```

use std::path::PathBuf;
use std::time::Duration;

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

use crate::mms::Charset;

/// Timestamp pattern used by the full-backup format, interpreted in GMT.
pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// File name of the address-book snapshot inside an archive.
pub const ADDRESS_BOOK_FILENAME: &str = "contacts2.db";

/// File name of the chat-client database inside an archive.
pub const CHAT_DATABASE_FILENAME: &str = "main.db";

/// Values shared by every record parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseConfig {
    /// chrono format string for textual timestamps (default: [`BACKUP_TIMESTAMP_FORMAT`])
    pub timestamp_format: String,

    /// Offset east of UTC, in minutes, that parsed instants are expressed in
    /// unless a record carries its own (default: 0)
    pub default_offset_minutes: i32,

    /// Character set for parts that declare none (default: UTF-8)
    pub default_charset: Charset,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            timestamp_format: BACKUP_TIMESTAMP_FORMAT.to_string(),
            default_offset_minutes: 0,
            default_charset: Charset::Utf8,
        }
    }
}

impl ParseConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the textual timestamp pattern.
    #[must_use]
    pub fn with_timestamp_format(mut self, format: impl Into<String>) -> Self {
        self.timestamp_format = format.into();
        self
    }

    /// Sets the default offset, in minutes east of UTC.
    #[must_use]
    pub fn with_default_offset_minutes(mut self, minutes: i32) -> Self {
        self.default_offset_minutes = minutes;
        self
    }

    /// Sets the fallback character set.
    #[must_use]
    pub fn with_default_charset(mut self, charset: Charset) -> Self {
        self.default_charset = charset;
        self
    }

    /// Returns the default offset as a chrono [`FixedOffset`].
    ///
    /// Out-of-range values collapse to UTC.
    pub fn default_offset(&self) -> FixedOffset {
        offset_from_minutes(self.default_offset_minutes)
    }
}

/// Parses a `+HH:MM`, `-HHMM`, or `Z` offset string.
///
/// Returns `None` for anything else, including offsets beyond ±23:59.
pub fn parse_offset(input: &str) -> Option<FixedOffset> {
    let input = input.trim();
    if input.eq_ignore_ascii_case("z")
        || input.eq_ignore_ascii_case("utc")
        || input.eq_ignore_ascii_case("gmt")
    {
        return Some(utc_offset());
    }

    let (sign, rest) = match input.as_bytes().first()? {
        b'+' => (1, &input[1..]),
        b'-' => (-1, &input[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    if minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

fn utc_offset() -> FixedOffset {
    Utc.fix()
}

fn offset_from_minutes(minutes: i32) -> FixedOffset {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(utc_offset)
}

/// Configuration for the full-backup XML reader.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FullBackupConfig {
    /// Shared parse settings
    pub parse: ParseConfig,

    /// Contact lookup settings
    pub contacts: ContactConfig,
}

impl FullBackupConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the shared parse settings.
    #[must_use]
    pub fn with_parse(mut self, parse: ParseConfig) -> Self {
        self.parse = parse;
        self
    }

    /// Replaces the contact lookup settings.
    #[must_use]
    pub fn with_contacts(mut self, contacts: ContactConfig) -> Self {
        self.contacts = contacts;
        self
    }
}

/// Configuration for the dedicated-SMS XML reader.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SmsBackupConfig {
    /// Shared parse settings
    pub parse: ParseConfig,

    /// Contact lookup settings, used when a record has no `contact_name`
    pub contacts: ContactConfig,
}

impl SmsBackupConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the shared parse settings.
    #[must_use]
    pub fn with_parse(mut self, parse: ParseConfig) -> Self {
        self.parse = parse;
        self
    }

    /// Replaces the contact lookup settings.
    #[must_use]
    pub fn with_contacts(mut self, contacts: ContactConfig) -> Self {
        self.contacts = contacts;
        self
    }
}

/// Configuration for the chat-client database reader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatClientConfig {
    /// Message-kind code of plain chat messages (default: 61)
    pub message_kind: i64,

    /// Database file name looked up inside archives (default: `main.db`)
    pub database_filename: String,

    /// Directory archives are unpacked into (default: `$TMP/threadpack`)
    pub extract_dir: PathBuf,

    /// Offset, in minutes east of UTC, that timestamps are expressed in
    pub offset_minutes: i32,

    /// Per-query time budget (default: 30s)
    #[serde(with = "duration_secs")]
    pub query_timeout: Duration,
}

impl Default for ChatClientConfig {
    fn default() -> Self {
        Self {
            message_kind: 61,
            database_filename: CHAT_DATABASE_FILENAME.to_string(),
            extract_dir: default_extract_dir(),
            offset_minutes: 0,
            query_timeout: Duration::from_secs(30),
        }
    }
}

impl ChatClientConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the message-kind code.
    #[must_use]
    pub fn with_message_kind(mut self, kind: i64) -> Self {
        self.message_kind = kind;
        self
    }

    /// Sets the extraction directory.
    #[must_use]
    pub fn with_extract_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.extract_dir = dir.into();
        self
    }

    /// Sets the offset timestamps are expressed in, in minutes east of UTC.
    #[must_use]
    pub fn with_offset_minutes(mut self, minutes: i32) -> Self {
        self.offset_minutes = minutes;
        self
    }

    /// Sets the per-query time budget.
    #[must_use]
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// Returns the configured offset. Out-of-range values collapse to UTC.
    pub fn offset(&self) -> FixedOffset {
        offset_from_minutes(self.offset_minutes)
    }
}

/// Configuration for contact-name resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactConfig {
    /// Per-query time budget (default: 30s)
    #[serde(with = "duration_secs")]
    pub query_timeout: Duration,

    /// Number of trailing digits in the minimal-match key (default: 7)
    pub min_match_len: usize,

    /// Address-book file name looked up inside archives (default: `contacts2.db`)
    pub database_filename: String,

    /// Directory archives are unpacked into (default: `$TMP/threadpack`)
    pub extract_dir: PathBuf,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            query_timeout: Duration::from_secs(30),
            min_match_len: 7,
            database_filename: ADDRESS_BOOK_FILENAME.to_string(),
            extract_dir: default_extract_dir(),
        }
    }
}

impl ContactConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the per-query time budget.
    #[must_use]
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// Sets the minimal-match key length.
    #[must_use]
    pub fn with_min_match_len(mut self, len: usize) -> Self {
        self.min_match_len = len;
        self
    }

    /// Sets the extraction directory.
    #[must_use]
    pub fn with_extract_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.extract_dir = dir.into();
        self
    }
}

fn default_extract_dir() -> PathBuf {
    std::env::temp_dir().join("threadpack")
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

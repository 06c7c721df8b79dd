//! Backup readers.
//!
//! | Reader | Source | Input |
//! |--------|--------|-------|
//! | [`FullBackupReader`] | [`Source::FullBackup`](crate::reader::Source::FullBackup) | `<backup>` XML, optionally gzip |
//! | [`SmsBackupReader`] | [`Source::SmsBackup`](crate::reader::Source::SmsBackup) | `<smses>` XML, optionally gzip |
//! | [`ChatClientReader`] | [`Source::ChatClient`](crate::reader::Source::ChatClient) | SQLite `main.db`, optionally archived |

pub mod full_backup;
pub mod sms_backup;

#[cfg(feature = "sqlite")]
pub mod chat_client;

pub use full_backup::FullBackupReader;
pub use sms_backup::SmsBackupReader;

#[cfg(feature = "sqlite")]
pub use chat_client::ChatClientReader;

use std::str::FromStr;

use chrono::FixedOffset;
use tracing::warn;

use crate::config::{ParseConfig, parse_offset};
use crate::error::{Result, ThreadpackError};
use crate::message::Direction;
use crate::parsing::XmlElement;
use crate::thread::{Thread, ThreadCollection};

/// Threads and message count published by a reader.
#[derive(Debug, Default)]
pub(crate) struct LoadedThreads {
    threads: Vec<Thread>,
    message_count: usize,
}

impl LoadedThreads {
    pub(crate) fn clear(&mut self) {
        self.threads.clear();
        self.message_count = 0;
    }

    /// Replaces the loaded state and returns `(threads, messages)`.
    pub(crate) fn publish(&mut self, collection: ThreadCollection) -> (usize, usize) {
        self.message_count = collection.message_count();
        self.threads = collection.into_vec();
        (self.threads.len(), self.message_count)
    }

    pub(crate) fn threads(&self) -> &[Thread] {
        &self.threads
    }

    pub(crate) fn message_count(&self) -> usize {
        self.message_count
    }
}

/// Parses a numeric message box code (`1` inbox, `2` sent, `3` draft) or a
/// direction word.
pub(crate) fn parse_box_direction(value: &str) -> Result<Direction> {
    match value.trim() {
        "1" => Ok(Direction::Received),
        "2" => Ok(Direction::Sent),
        "3" => Ok(Direction::Draft),
        other => Direction::from_str(other),
    }
}

/// Offset a record is expressed in: its `timezone` attribute when valid,
/// else the configured default.
pub(crate) fn record_offset(record: &XmlElement, config: &ParseConfig) -> FixedOffset {
    match record.attr_present("timezone") {
        Some(zone) => parse_offset(zone).unwrap_or_else(|| {
            warn!(timezone = zone, "Unrecognized time zone, using default offset");
            config.default_offset()
        }),
        None => config.default_offset(),
    }
}

/// Logs a skipped record, or hands back errors that must abort the import.
pub(crate) fn absorb(err: ThreadpackError, record: &str, skipped: &mut usize) -> Result<()> {
    if err.is_record_level() {
        warn!(record, error = %err, "Skipping record");
        *skipped += 1;
        Ok(())
    } else {
        Err(err)
    }
}

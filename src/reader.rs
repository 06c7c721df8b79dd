//! Unified reader trait for backup sources.
//!
//! Every source is imported through the same [`Reader`] interface: one call
//! loads a file into threads and reports an [`ErrorCode`], after which the
//! threads and message count can be read back.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use threadpack::reader::{Reader, Source, create_reader};
//!
//! let mut reader = create_reader(Source::SmsBackup);
//! let status = reader.load_messages(Path::new("sms-20240115.xml"), None);
//!
//! if status.is_success() {
//!     for thread in reader.threads() {
//!         println!("{} ({} messages)", thread.label(), thread.len());
//!     }
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ErrorCode, Result, ThreadpackError};
use crate::thread::Thread;

/// Supported backup sources.
///
/// ```rust
/// use threadpack::reader::Source;
/// use std::str::FromStr;
///
/// assert_eq!(Source::from_str("sms").unwrap(), Source::SmsBackup);
/// assert_eq!(Source::from_str("full-backup").unwrap(), Source::FullBackup);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum Source {
    /// Full-device backup XML (`<backup><thread>…`)
    #[serde(alias = "full")]
    FullBackup,

    /// Dedicated SMS backup XML (`<smses>…`)
    #[serde(alias = "sms")]
    SmsBackup,

    /// Desktop chat client database (`main.db`)
    #[serde(alias = "chat")]
    ChatClient,
}

impl Source {
    /// Returns all source names including aliases.
    pub fn all_names() -> &'static [&'static str] {
        &["full-backup", "full", "sms-backup", "sms", "chat-client", "chat"]
    }

    /// Returns all sources.
    pub fn all() -> &'static [Source] {
        &[Source::FullBackup, Source::SmsBackup, Source::ChatClient]
    }

    /// Returns `true` for the XML-based sources.
    pub fn is_xml(self) -> bool {
        matches!(self, Source::FullBackup | Source::SmsBackup)
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::FullBackup => write!(f, "Full backup"),
            Source::SmsBackup => write!(f, "SMS backup"),
            Source::ChatClient => write!(f, "Chat client"),
        }
    }
}

impl std::str::FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full-backup" | "full" => Ok(Source::FullBackup),
            "sms-backup" | "sms" => Ok(Source::SmsBackup),
            "chat-client" | "chat" => Ok(Source::ChatClient),
            _ => Err(format!(
                "Unknown source: '{}'. Expected one of: {}",
                s,
                Source::all_names().join(", ")
            )),
        }
    }
}

/// Outcome of a successful import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ImportSummary {
    /// Threads loaded
    pub threads: usize,
    /// Messages loaded
    pub messages: usize,
    /// Records and parts that were logged and dropped
    pub skipped: usize,
    /// [`ErrorCode::Success`], or a non-fatal code such as
    /// [`ErrorCode::AuxiliaryNotFound`]
    #[serde(skip)]
    pub status: ErrorCode,
}

/// Unified trait for backup readers.
///
/// # Implementation Notes
///
/// Readers must implement:
/// - [`name`](Reader::name) and [`source`](Reader::source)
/// - [`import`](Reader::import): load a file, replacing all prior state
/// - [`threads`](Reader::threads) and [`message_count`](Reader::message_count)
///
/// A failed import leaves the reader empty, never half-populated. A reader
/// is not safe for concurrent imports; use one instance per import.
pub trait Reader: Send {
    /// Returns the human-readable name of this reader.
    fn name(&self) -> &'static str;

    /// Returns the source this reader handles.
    fn source(&self) -> Source;

    /// Loads `input`, resolving contact names through `auxiliary` when the
    /// source supports it.
    ///
    /// # Errors
    ///
    /// Returns the stream-level failure that aborted the import.
    fn import(&mut self, input: &Path, auxiliary: Option<&Path>) -> Result<ImportSummary>;

    /// Loads `input` and reports the outcome as an [`ErrorCode`].
    fn load_messages(&mut self, input: &Path, auxiliary: Option<&Path>) -> ErrorCode {
        match self.import(input, auxiliary) {
            Ok(summary) => summary.status,
            Err(e) => {
                warn!(reader = self.name(), error = %e, "Import failed");
                ErrorCode::from(&e)
            }
        }
    }

    /// Threads of the last import, ordered by label.
    fn threads(&self) -> &[Thread];

    /// Number of messages of the last import.
    fn message_count(&self) -> usize;
}

/// Rejects an empty input path.
pub(crate) fn require_input(input: &Path) -> Result<()> {
    if input.as_os_str().is_empty() {
        return Err(ThreadpackError::UnreadableInput { path: None });
    }
    Ok(())
}

/// Creates a reader for the specified source with default configuration.
///
/// # Panics
///
/// Panics if the chat-client source is requested without the `sqlite`
/// feature.
pub fn create_reader(source: Source) -> Box<dyn Reader> {
    match source {
        Source::FullBackup => Box::new(crate::readers::FullBackupReader::new()),
        Source::SmsBackup => Box::new(crate::readers::SmsBackupReader::new()),
        #[cfg(feature = "sqlite")]
        Source::ChatClient => Box::new(crate::readers::ChatClientReader::new()),
        #[allow(unreachable_patterns)]
        _ => panic!(
            "Reader for {:?} is not enabled. Enable the `sqlite` feature.",
            source
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_source_from_str() {
        assert_eq!(Source::from_str("full-backup").unwrap(), Source::FullBackup);
        assert_eq!(Source::from_str("FULL").unwrap(), Source::FullBackup);
        assert_eq!(Source::from_str("sms").unwrap(), Source::SmsBackup);
        assert_eq!(Source::from_str("chat-client").unwrap(), Source::ChatClient);
        assert!(Source::from_str("telegram").is_err());
    }

    #[test]
    fn test_source_display() {
        assert_eq!(Source::FullBackup.to_string(), "Full backup");
        assert_eq!(Source::SmsBackup.to_string(), "SMS backup");
        assert_eq!(Source::ChatClient.to_string(), "Chat client");
    }

    #[test]
    fn test_source_all() {
        assert_eq!(Source::all().len(), 3);
        assert!(Source::FullBackup.is_xml());
        assert!(!Source::ChatClient.is_xml());
    }

    #[test]
    fn test_create_reader() {
        let reader = create_reader(Source::FullBackup);
        assert_eq!(reader.source(), Source::FullBackup);
        assert_eq!(reader.message_count(), 0);
        assert!(reader.threads().is_empty());
    }

    #[test]
    fn test_empty_input_path_is_unreadable() {
        let mut reader = create_reader(Source::SmsBackup);
        assert_eq!(reader.load_messages(Path::new(""), None), ErrorCode::UnreadableInput);
    }
}

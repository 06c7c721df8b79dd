//! # Threadpack
//!
//! A Rust library for importing phone messaging backups into a uniform
//! model of message threads.
//!
//! ## Overview
//!
//! Threadpack reads three unrelated backup formats:
//! - **Full backup**: custom `<backup>` XML written by full-device backup
//!   tools, optionally gzip-compressed
//! - **SMS backup**: flat `<smses>` XML written by dedicated SMS backup apps,
//!   in both attribute generations
//! - **Chat client**: the SQLite `main.db` of a desktop chat client,
//!   optionally inside a tar archive
//!
//! Every source produces the same [`Thread`]s of [`Message`]s. Multimedia
//! messages keep their typed parts ([`mms`]) and are ordered by their
//! embedded presentation description when one is present. Thread names are
//! resolved from an address-book snapshot through the [`contacts`] module.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use threadpack::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let input = Path::new("sms-20240115.xml");
//!     let mut reader = create_reader(detect_source(input)?);
//!
//!     let status = reader.load_messages(input, Some(Path::new("contacts2.db")));
//!     if status.is_fatal() {
//!         eprintln!("import failed: {status}");
//!         return Ok(());
//!     }
//!
//!     let threads = apply_filters(reader.threads().to_vec(), &FilterConfig::new());
//!     write_text(&threads, "threads.txt")?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Structure
//!
//! - [`reader`]: the [`Reader`](reader::Reader) trait, [`Source`](reader::Source) and
//!   [`create_reader`](reader::create_reader)
//! - [`readers`]: the three reader implementations
//! - [`detect`]: format detection by file name and schema
//! - [`message`], [`thread`]: the normalized model
//! - [`mms`]: content codec, content-type registry, parts, presentation ordering
//! - [`contacts`]: two-tier contact name lookup
//! - [`extract`]: archive extraction port
//! - [`parsing`]: shared XML tree, timestamps, input decoding
//! - [`config`]: reader configuration types
//! - [`core`]: filtering, statistics and export writers
//! - [`format`]: export format selection
//! - [`error`]: [`ThreadpackError`], [`ErrorCode`] and [`Result`]
//! - [`prelude`]: convenient re-exports

pub mod config;
pub mod contacts;
pub mod core;
pub mod detect;
pub mod error;
pub mod extract;
pub mod format;
pub mod message;
pub mod mms;
pub mod parsing;
pub mod reader;
pub mod readers;
pub mod thread;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "cli")]
pub mod cli;

// Re-export the main types at the crate root for convenience
pub use error::{ErrorCode, Result, ThreadpackError};
pub use message::{Direction, Message};
pub use thread::Thread;

/// Convenient re-exports for common usage.
///
/// ```rust
/// use threadpack::prelude::*;
/// ```
pub mod prelude {
    // Model
    pub use crate::message::{Content, Direction, Message};
    pub use crate::thread::{Thread, ThreadCollection};

    // Error types
    pub use crate::error::{ErrorCode, Result, ThreadpackError};

    // Readers
    pub use crate::detect::detect_source;
    pub use crate::reader::{ImportSummary, Reader, Source, create_reader};
    pub use crate::readers::{FullBackupReader, SmsBackupReader};

    #[cfg(feature = "sqlite")]
    pub use crate::readers::ChatClientReader;

    // Configuration
    pub use crate::config::{ChatClientConfig, ContactConfig, FullBackupConfig, ParseConfig, SmsBackupConfig};

    // Filtering and statistics
    pub use crate::core::{FilterConfig, ImportStats, apply_filters};

    // Output
    pub use crate::core::output::{to_text, write_text};
    #[cfg(feature = "csv-output")]
    pub use crate::core::output::{to_csv, write_csv};
    #[cfg(feature = "json-output")]
    pub use crate::core::output::{to_json, write_json};
    pub use crate::format::{OutputFormat, write_to_format};
}

//! Thread export writers.
//!
//! - [`write_text`] / [`to_text`] - line-oriented plain text, always available
//! - [`write_csv`] / [`to_csv`] - one row per message, semicolon delimiter - requires `csv-output` feature
//! - [`write_json`] / [`to_json`] - threads with nested messages and parts - requires `json-output` feature
//!
//! # Example
//!
//! ```rust,no_run
//! # fn main() -> threadpack::Result<()> {
//! use threadpack::core::output::{to_text, write_text};
//! use threadpack::Thread;
//!
//! let threads = vec![Thread::new(Some("Alice".into()), "5551234567")];
//! write_text(&threads, "threads.txt")?;
//! let text = to_text(&threads);
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "csv-output")]
mod csv_writer;
#[cfg(feature = "json-output")]
mod json_writer;
mod text_writer;

#[cfg(feature = "csv-output")]
pub use csv_writer::{to_csv, write_csv};
#[cfg(feature = "json-output")]
pub use json_writer::{to_json, write_json};
pub use text_writer::{THREAD_DELIMITER, thread_to_text, to_text, write_text};

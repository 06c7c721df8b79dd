//! Export format selection.
//!
//! This module keeps format types free of CLI dependencies so library
//! callers can pick a writer by name or by file extension.
//!
//! # Example
//!
//! ```rust
//! # #[cfg(all(feature = "csv-output", feature = "json-output"))]
//! # fn example() -> threadpack::Result<()> {
//! use threadpack::format::{OutputFormat, write_to_format};
//! use threadpack::Thread;
//!
//! let threads = vec![Thread::new(Some("Alice".into()), "5551234567")];
//!
//! // Write using format enum
//! write_to_format(&threads, "threads.csv", OutputFormat::Csv)?;
//!
//! // Or use format detection from extension
//! let format = OutputFormat::from_path("threads.json")?;
//! assert_eq!(format, OutputFormat::Json);
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, ThreadpackError};
use crate::thread::Thread;

/// Export format for imported threads.
///
/// - [`Text`](OutputFormat::Text) - Label, blank line, one line per message
/// - [`Json`](OutputFormat::Json) - Threads with nested messages and parts
/// - [`Csv`](OutputFormat::Csv) - One semicolon-delimited row per message
///
/// ```rust
/// use threadpack::format::OutputFormat;
/// use std::str::FromStr;
///
/// let format = OutputFormat::from_str("txt").unwrap();
/// assert_eq!(format, OutputFormat::Text);
/// assert_eq!(format.extension(), "txt");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum OutputFormat {
    /// Plain text, as shown by message viewers
    #[default]
    Text,

    /// JSON array of threads
    Json,

    /// CSV with semicolon delimiter
    Csv,
}

impl OutputFormat {
    /// Returns the file extension for this format (without dot).
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Text => "txt",
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        }
    }

    /// Returns all supported format names.
    pub fn all_names() -> &'static [&'static str] {
        &["text", "txt", "json", "csv"]
    }

    /// Returns all available formats.
    pub fn all() -> &'static [OutputFormat] {
        &[OutputFormat::Text, OutputFormat::Json, OutputFormat::Csv]
    }

    /// Detects format from a file path based on extension.
    ///
    /// ```rust
    /// use threadpack::format::OutputFormat;
    ///
    /// assert_eq!(OutputFormat::from_path("out/threads.CSV").unwrap(), OutputFormat::Csv);
    /// assert!(OutputFormat::from_path("threads.xml").is_err());
    /// ```
    pub fn from_path(path: &str) -> Result<Self> {
        let ext = path.rsplit('.').next().unwrap_or("").to_lowercase();

        match ext.as_str() {
            "txt" | "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(ThreadpackError::invalid_format(
                "output",
                format!("Unknown file extension: '.{ext}'. Expected one of: txt, json, csv"),
            )),
        }
    }

    /// Cargo feature the writer for this format needs, if any.
    pub fn required_feature(&self) -> Option<&'static str> {
        match self {
            OutputFormat::Text => None,
            OutputFormat::Json => Some("json-output"),
            OutputFormat::Csv => Some("csv-output"),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "Text"),
            OutputFormat::Json => write!(f, "JSON"),
            OutputFormat::Csv => write!(f, "CSV"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!(
                "Unknown format: '{}'. Expected one of: {}",
                s,
                OutputFormat::all_names().join(", ")
            )),
        }
    }
}

fn missing_feature(format: OutputFormat) -> ThreadpackError {
    ThreadpackError::invalid_format(
        "output",
        format!(
            "Output format {} requires the '{}' feature to be enabled",
            format,
            format.required_feature().unwrap_or_default()
        ),
    )
}

/// Writes threads to a file in the specified format.
///
/// # Errors
///
/// Returns an error if:
/// - The required feature for the format is not enabled
/// - The file cannot be written
pub fn write_to_format(threads: &[Thread], path: &str, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => crate::core::output::write_text(threads, path),
        #[cfg(feature = "json-output")]
        OutputFormat::Json => crate::core::output::write_json(threads, path),
        #[cfg(feature = "csv-output")]
        OutputFormat::Csv => crate::core::output::write_csv(threads, path),
        #[allow(unreachable_patterns)]
        _ => Err(missing_feature(format)),
    }
}

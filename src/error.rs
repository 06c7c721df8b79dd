//! Unified error types for threadpack.
//!
//! This module provides a single [`ThreadpackError`] enum that covers all error
//! cases in the library, and [`ErrorCode`], the integer status every reader
//! reports at its `load_messages` boundary.
//!
//! # Error Handling Philosophy
//!
//! - **Record-level** faults (one bad message or part) are logged and skipped
//! - **Stream-level** faults (missing file, broken XML) abort the import
//! - **Callers** of a reader only ever see an [`ErrorCode`]

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A specialized [`Result`] type for threadpack operations.
///
/// # Example
///
/// ```rust
/// use threadpack::error::Result;
/// use threadpack::Thread;
///
/// fn my_function() -> Result<Vec<Thread>> {
///     Ok(vec![])
/// }
/// ```
pub type Result<T> = std::result::Result<T, ThreadpackError>;

/// The error type for all threadpack operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ThreadpackError {
    /// An I/O error occurred while reading input.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// No input was supplied, or it could not be opened for reading.
    #[error("Input is missing or unreadable{}", path.as_ref().map(|p| format!(" (file: {})", p.display())).unwrap_or_default())]
    UnreadableInput {
        /// The offending path, if one was given
        path: Option<PathBuf>,
    },

    /// The message file does not exist.
    #[error("Input file not found: {}", path.display())]
    InputNotFound {
        /// The missing path
        path: PathBuf,
    },

    /// The auxiliary address-book file does not exist or cannot be used.
    #[error("Address book not usable: {}", path.display())]
    AuxiliaryNotFound {
        /// The address-book path that was supplied
        path: PathBuf,
    },

    /// Failed to parse the input document.
    #[error("Failed to parse {format} backup{}: {source}", path.as_ref().map(|p| format!(" (file: {})", p.display())).unwrap_or_default())]
    Parse {
        /// The format being parsed (e.g., "Full backup XML")
        format: &'static str,
        /// The underlying parse error
        #[source]
        source: ParseErrorKind,
        /// The file path, if available
        path: Option<PathBuf>,
    },

    /// The document parsed but does not match the expected structure.
    #[error("Invalid {format} format: {message}")]
    InvalidFormat {
        /// The format that was expected
        format: &'static str,
        /// Description of what's wrong
        message: String,
    },

    /// A timestamp did not match any accepted form.
    #[error("Invalid timestamp '{input}'. Expected format: {expected}")]
    InvalidTimestamp {
        /// The offending input
        input: String,
        /// Expected format description
        expected: String,
    },

    /// Invalid date in a filter configuration.
    #[error("Invalid date '{input}'. Expected format: {expected}")]
    InvalidDate {
        /// The invalid date string that was provided
        input: String,
        /// Expected format description
        expected: &'static str,
    },

    /// A message carried a direction value nobody recognizes.
    #[error("Unknown message direction '{value}'")]
    UnknownDirection {
        /// The raw direction value
        value: String,
    },

    /// A part declared a character set that cannot be decoded.
    #[error("Unsupported character set '{name}'")]
    UnsupportedCharset {
        /// The declared character set
        name: String,
    },

    /// A payload declared a transfer encoding other than `plain` or `base64`.
    #[error("Unknown payload encoding '{tag}'")]
    UnknownEncoding {
        /// The declared encoding tag
        tag: String,
    },

    /// Bytes did not decode in the declared character set.
    #[error("Payload is not valid {charset}")]
    InvalidText {
        /// The character set that was attempted
        charset: &'static str,
    },

    /// Base64 payload could not be decoded.
    #[error("Base64 error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The file type could not be determined.
    #[error("Unrecognized backup format: {}", path.display())]
    UnknownFormat {
        /// The file that was inspected
        path: PathBuf,
    },

    /// An archive was supplied but nothing is configured to unpack it.
    #[error("Cannot open archive {}: {message}", path.display())]
    Archive {
        /// The archive path
        path: PathBuf,
        /// Description of what's wrong
        message: String,
    },

    /// Database query or connection error.
    #[cfg(feature = "sqlite")]
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The database connection failed to close after a completed read.
    #[cfg(feature = "sqlite")]
    #[error("Failed to close database: {0}")]
    Close(#[source] rusqlite::Error),

    /// CSV writing error.
    #[cfg(feature = "csv-output")]
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[cfg(feature = "json-output")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// UTF-8 encoding error.
    #[error("UTF-8 encoding error in {context}: {source}")]
    Utf8 {
        /// Description of where the error occurred
        context: String,
        /// The underlying UTF-8 error
        #[source]
        source: std::string::FromUtf8Error,
    },
}

/// Kinds of parse errors that can occur.
#[derive(Debug, Error)]
pub enum ParseErrorKind {
    /// XML tokenizer error
    #[error("{0}")]
    Xml(#[from] quick_xml::Error),
    /// Document ended with open elements, or similar structural problems
    #[error("{0}")]
    Structure(String),
}

impl From<quick_xml::Error> for ThreadpackError {
    fn from(err: quick_xml::Error) -> Self {
        ThreadpackError::Parse {
            format: "XML",
            source: ParseErrorKind::Xml(err),
            path: None,
        }
    }
}

impl From<quick_xml::events::attributes::AttrError> for ThreadpackError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        ThreadpackError::from(quick_xml::Error::from(err))
    }
}

impl From<std::string::FromUtf8Error> for ThreadpackError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        ThreadpackError::Utf8 {
            context: "output conversion".to_string(),
            source: err,
        }
    }
}

// ============================================================================
// Convenience constructors
// ============================================================================

impl ThreadpackError {
    /// Creates a structural parse error for the given format.
    pub fn structure(format: &'static str, message: impl Into<String>) -> Self {
        ThreadpackError::Parse {
            format,
            source: ParseErrorKind::Structure(message.into()),
            path: None,
        }
    }

    /// Creates an invalid format error.
    pub fn invalid_format(format: &'static str, message: impl Into<String>) -> Self {
        ThreadpackError::InvalidFormat {
            format,
            message: message.into(),
        }
    }

    /// Creates an invalid timestamp error.
    pub fn invalid_timestamp(input: impl Into<String>, expected: impl Into<String>) -> Self {
        ThreadpackError::InvalidTimestamp {
            input: input.into(),
            expected: expected.into(),
        }
    }

    /// Creates an invalid date error.
    pub fn invalid_date(input: impl Into<String>) -> Self {
        ThreadpackError::InvalidDate {
            input: input.into(),
            expected: "YYYY-MM-DD",
        }
    }

    /// Creates an unknown direction error.
    pub fn unknown_direction(value: impl Into<String>) -> Self {
        ThreadpackError::UnknownDirection {
            value: value.into(),
        }
    }

    /// Creates an unsupported charset error.
    pub fn unsupported_charset(name: impl Into<String>) -> Self {
        ThreadpackError::UnsupportedCharset { name: name.into() }
    }

    /// Attaches a file path to a parse error. Other variants pass through.
    #[must_use]
    pub fn with_path(self, file: impl Into<PathBuf>) -> Self {
        match self {
            ThreadpackError::Parse { format, source, .. } => ThreadpackError::Parse {
                format,
                source,
                path: Some(file.into()),
            },
            other => other,
        }
    }

    /// Returns `true` if this is an IO error.
    pub fn is_io(&self) -> bool {
        matches!(self, ThreadpackError::Io(_))
    }

    /// Returns `true` if this is a parse error.
    pub fn is_parse(&self) -> bool {
        matches!(self, ThreadpackError::Parse { .. })
    }

    /// Returns `true` if this is an invalid format error.
    pub fn is_invalid_format(&self) -> bool {
        matches!(self, ThreadpackError::InvalidFormat { .. })
    }

    /// Returns `true` if this error only concerns a single record.
    ///
    /// Readers log and skip records failing with these errors.
    pub fn is_record_level(&self) -> bool {
        matches!(
            self,
            ThreadpackError::UnknownDirection { .. }
                | ThreadpackError::UnsupportedCharset { .. }
                | ThreadpackError::UnknownEncoding { .. }
                | ThreadpackError::InvalidText { .. }
                | ThreadpackError::InvalidTimestamp { .. }
                | ThreadpackError::Base64(_)
        )
    }
}

// ============================================================================
// Integer status codes
// ============================================================================

/// Status reported by [`Reader::load_messages`](crate::reader::Reader::load_messages).
///
/// | Code | Meaning |
/// |------|---------|
/// | `0` | success |
/// | `1` | missing or unreadable input |
/// | `2` | structurally invalid input |
/// | `3` | other I/O failure during read |
/// | `-1` | input file not found |
/// | `-2` | failure closing input (data is loaded) |
/// | `-3` | address book not found or unusable (data is loaded) |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ErrorCode {
    #[default]
    Success,
    UnreadableInput,
    InvalidStructure,
    ReadFailure,
    InputNotFound,
    CloseFailure,
    AuxiliaryNotFound,
}

impl ErrorCode {
    /// Returns the integer value of this status.
    pub fn code(self) -> i32 {
        match self {
            ErrorCode::Success => 0,
            ErrorCode::UnreadableInput => 1,
            ErrorCode::InvalidStructure => 2,
            ErrorCode::ReadFailure => 3,
            ErrorCode::InputNotFound => -1,
            ErrorCode::CloseFailure => -2,
            ErrorCode::AuxiliaryNotFound => -3,
        }
    }

    /// Returns `true` for [`ErrorCode::Success`].
    pub fn is_success(self) -> bool {
        self == ErrorCode::Success
    }

    /// Returns `true` if the import was abandoned and no threads are loaded.
    pub fn is_fatal(self) -> bool {
        !matches!(
            self,
            ErrorCode::Success | ErrorCode::CloseFailure | ErrorCode::AuxiliaryNotFound
        )
    }
}

impl From<&ThreadpackError> for ErrorCode {
    fn from(err: &ThreadpackError) -> Self {
        match err {
            ThreadpackError::UnreadableInput { .. } | ThreadpackError::Archive { .. } => {
                ErrorCode::UnreadableInput
            }
            ThreadpackError::InputNotFound { .. } => ErrorCode::InputNotFound,
            ThreadpackError::AuxiliaryNotFound { .. } => ErrorCode::AuxiliaryNotFound,
            ThreadpackError::Parse { .. }
            | ThreadpackError::InvalidFormat { .. }
            | ThreadpackError::UnknownFormat { .. } => ErrorCode::InvalidStructure,
            ThreadpackError::Io(e) => match e.kind() {
                io::ErrorKind::NotFound => ErrorCode::InputNotFound,
                io::ErrorKind::PermissionDenied => ErrorCode::UnreadableInput,
                _ => ErrorCode::ReadFailure,
            },
            #[cfg(feature = "sqlite")]
            ThreadpackError::Close(_) => ErrorCode::CloseFailure,
            _ => ErrorCode::ReadFailure,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            ErrorCode::Success => "success",
            ErrorCode::UnreadableInput => "input missing or unreadable",
            ErrorCode::InvalidStructure => "input is not a valid backup",
            ErrorCode::ReadFailure => "I/O failure while reading",
            ErrorCode::InputNotFound => "input file not found",
            ErrorCode::CloseFailure => "input could not be closed",
            ErrorCode::AuxiliaryNotFound => "address book not found",
        };
        write!(f, "{} ({})", text, self.code())
    }
}

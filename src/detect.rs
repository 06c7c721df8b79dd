//! Backup format detection.
//!
//! The chat-client database is recognized by file name alone. XML backups
//! are validated against both schemas; file names that look like SMS backup
//! exports (`sms-20240115.xml`) try that schema first.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::{Result, ThreadpackError};
use crate::extract::is_archive;
use crate::parsing::{parse_document, read_input};
use crate::reader::Source;
use crate::readers::{full_backup, sms_backup};

static CHAT_DATABASE_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^main\.db$").unwrap());

static SMS_BACKUP_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^sms[-_].*\.xml(\.gz)?$").unwrap());

/// Returns the source implied by the file name alone, if any.
pub fn source_from_name(path: &Path) -> Option<Source> {
    let name = path.file_name()?.to_string_lossy();
    if CHAT_DATABASE_NAME.is_match(&name) || is_archive(path) {
        return Some(Source::ChatClient);
    }
    None
}

/// Order in which the XML schemas are tried for `path`.
pub fn xml_priority(path: &Path) -> [Source; 2] {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if SMS_BACKUP_NAME.is_match(&name) {
        [Source::SmsBackup, Source::FullBackup]
    } else {
        [Source::FullBackup, Source::SmsBackup]
    }
}

/// Determines which reader applies to `path`.
///
/// # Errors
///
/// - [`ThreadpackError::InputNotFound`] if `path` does not exist
/// - [`ThreadpackError::UnknownFormat`] if no schema matches
pub fn detect_source(path: &Path) -> Result<Source> {
    if let Some(source) = source_from_name(path) {
        return Ok(source);
    }

    let content = read_input(path)?;
    detect_content(&content, xml_priority(path)).ok_or_else(|| ThreadpackError::UnknownFormat {
        path: path.to_path_buf(),
    })
}

/// Validates `content` against each XML schema in `priority` order.
pub fn detect_content(content: &str, priority: [Source; 2]) -> Option<Source> {
    let root = match parse_document(content) {
        Ok(root) => root,
        Err(e) => {
            debug!(error = %e, "Not well-formed XML");
            return None;
        }
    };
    priority.into_iter().find(|source| {
        let validated = match source {
            Source::FullBackup => full_backup::validate(&root),
            Source::SmsBackup => sms_backup::validate(&root),
            _ => return false,
        };
        if let Err(e) = &validated {
            debug!(source = %source, error = %e, "Schema does not match");
        }
        validated.is_ok()
    })
}

//! Command-line interface definition using clap.
//!
//! This module defines:
//! - [`Args`] - CLI argument structure (for use with clap)
//! - [`SourceArg`] - Backup source selection, including auto-detection
//! - [`FormatArg`] - Export format options
//! - [`DirectionArg`] - Direction filter values
//!
//! Each value enum converts into its library counterpart so the binary
//! never passes clap types into library code.

use clap::{ArgAction, Parser, ValueEnum};

use crate::format::OutputFormat;
use crate::message::Direction;
use crate::reader::Source;

/// Default output path; its extension follows `--format`.
pub const DEFAULT_OUTPUT: &str = "threads.txt";

/// Normalize phone messaging backups into message threads and export them
/// as text, JSON or CSV.
#[derive(Parser, Debug, Clone)]
#[command(name = "threadpack")]
#[command(version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    threadpack backup.xml
    threadpack sms-20240115.xml --contacts contacts2.db -f csv
    threadpack full-backup.xml.gz --after 2024-01-01 --direction sent
    threadpack skype.tar.gz --source chat-client -o chats.json -f json")]
pub struct Args {
    /// Path to the backup file
    pub input: String,

    /// Address book used to name threads (SQLite snapshot or archive)
    #[arg(long, value_name = "FILE")]
    pub contacts: Option<String>,

    /// Backup source type
    #[arg(short, long, value_enum, default_value = "auto")]
    pub source: SourceArg,

    /// Path to output file
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    pub output: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: FormatArg,

    /// Keep messages on or after this date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub after: Option<String>,

    /// Keep messages on or before this date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub before: Option<String>,

    /// Keep messages with this direction
    #[arg(long, value_enum)]
    pub direction: Option<DirectionArg>,

    /// Keep threads whose contact name or address contains this text
    #[arg(long, value_name = "NAME")]
    pub contact: Option<String>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Output path with its extension matched to the format when the
    /// default was kept.
    pub fn output_path(&self) -> String {
        if self.output != DEFAULT_OUTPUT {
            return self.output.clone();
        }
        let format: OutputFormat = self.format.into();
        format!("threads.{}", format.extension())
    }

    /// Log filter implied by `-v`.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

/// Backup source selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Default)]
pub enum SourceArg {
    /// Detect from file name and content
    #[default]
    Auto,

    /// Full-device backup XML
    #[value(alias = "full")]
    FullBackup,

    /// Dedicated SMS backup XML
    #[value(alias = "sms")]
    SmsBackup,

    /// Desktop chat client database
    #[value(alias = "chat")]
    ChatClient,
}

impl SourceArg {
    /// The explicit source, or `None` for auto-detection.
    pub fn source(self) -> Option<Source> {
        match self {
            SourceArg::Auto => None,
            SourceArg::FullBackup => Some(Source::FullBackup),
            SourceArg::SmsBackup => Some(Source::SmsBackup),
            SourceArg::ChatClient => Some(Source::ChatClient),
        }
    }
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Default)]
pub enum FormatArg {
    /// Plain text (default)
    #[default]
    #[value(alias = "txt")]
    Text,

    /// JSON array of threads
    Json,

    /// CSV with semicolon delimiter
    Csv,
}

impl From<FormatArg> for OutputFormat {
    fn from(format: FormatArg) -> OutputFormat {
        match format {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Csv => OutputFormat::Csv,
        }
    }
}

/// Direction filter values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum DirectionArg {
    Sent,
    #[value(alias = "inbox")]
    Received,
    Draft,
}

impl From<DirectionArg> for Direction {
    fn from(direction: DirectionArg) -> Direction {
        match direction {
            DirectionArg::Sent => Direction::Sent,
            DirectionArg::Received => Direction::Received,
            DirectionArg::Draft => Direction::Draft,
        }
    }
}

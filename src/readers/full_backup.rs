//! Full-device backup XML reader.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{LoadedThreads, absorb, record_offset};
use crate::config::FullBackupConfig;
use crate::contacts::ContactResolver;
use crate::error::{ErrorCode, Result, ThreadpackError};
use crate::extract::ArchiveExtractor;
use crate::message::{Direction, Message};
use crate::mms::{Charset, Encoding, MultimediaPart, RawPart, build_part};
use crate::parsing::{XmlElement, localize, parse_document, parse_pattern, read_input};
use crate::reader::{ImportSummary, Reader, Source, require_input};
use crate::thread::{Thread, ThreadCollection};

const FORMAT: &str = "Full backup XML";

/// Reader for full-device backup XML.
///
/// The backup groups records per thread:
/// ```xml
/// <backup>
///   <thread address="+15550100200;+15550100300">
///     <sms type="received" date="2024-01-15T10:30:00.000Z" timezone="+01:00"
///          encoding="base64" charset="utf-8" service_center="+15550000">SGk=</sms>
///     <mms type="sent" date="2024-01-15T10:35:00.000Z" subject="Trip">
///       <address type="from" address="+15550100999"/>
///       <address type="to" address="+15550100200"/>
///       <part content_type="application/smil" content_id="&lt;smil&gt;">…</part>
///       <part content_type="image/jpeg" content_id="&lt;img1&gt;"
///             content_location="img1.jpg" encoding="base64">…</part>
///     </mms>
///   </thread>
/// </backup>
/// ```
///
/// Timestamps follow `yyyy-MM-ddTHH:mm:ss.SSSZ` in GMT; `date_sent` is
/// preferred over `date`. Only the first `;`-separated address of a thread is
/// used for contact lookup.
pub struct FullBackupReader {
    config: FullBackupConfig,
    extractor: Option<Arc<dyn ArchiveExtractor>>,
    loaded: LoadedThreads,
}

impl FullBackupReader {
    pub fn new() -> Self {
        Self::with_config(FullBackupConfig::default())
    }

    pub fn with_config(config: FullBackupConfig) -> Self {
        Self {
            config,
            extractor: None,
            loaded: LoadedThreads::default(),
        }
    }

    /// Sets the extractor used for archived address books.
    #[must_use]
    pub fn with_extractor(mut self, extractor: Arc<dyn ArchiveExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn config(&self) -> &FullBackupConfig {
        &self.config
    }

    /// Loads a backup held in memory, without contact lookup.
    pub fn load_str(&mut self, content: &str) -> Result<ImportSummary> {
        self.loaded.clear();
        let (collection, skipped) = self.parse_str(content, &mut ContactResolver::disabled())?;
        let (threads, messages) = self.loaded.publish(collection);
        Ok(ImportSummary {
            threads,
            messages,
            skipped,
            status: ErrorCode::Success,
        })
    }

    /// Parses a backup into threads. Returns the threads and the number of
    /// skipped records.
    pub fn parse_str(&self, content: &str, resolver: &mut ContactResolver) -> Result<(ThreadCollection, usize)> {
        let root = parse_document(content)?;
        validate(&root)?;

        let mut collection = ThreadCollection::new();
        let mut skipped = 0;
        for element in root.children_named("thread") {
            let thread = self.parse_thread(element, resolver, &mut skipped)?;
            collection.insert(thread);
        }
        Ok((collection, skipped))
    }

    fn parse_thread(&self, element: &XmlElement, resolver: &mut ContactResolver, skipped: &mut usize) -> Result<Thread> {
        let address = element.attr_present("address").unwrap_or_default();
        let lookup_address = address.split(';').next().unwrap_or_default().trim();
        let name = element
            .attr_present("name")
            .map(str::to_string)
            .or_else(|| resolver.resolve_name(lookup_address));
        let mut thread = Thread::new(name, address);

        for record in &element.children {
            let parsed = match record.name.as_str() {
                "sms" => self.parse_sms(record, address).map(Some),
                "mms" => self.parse_mms(record, skipped),
                other => {
                    warn!(tag = other, thread = address, "Unknown record type, skipping");
                    *skipped += 1;
                    continue;
                }
            };
            match parsed {
                Ok(Some(message)) => {
                    if !thread.add(message) {
                        debug!(thread = address, "Duplicate message collapsed");
                    }
                }
                Ok(None) => *skipped += 1,
                Err(e) => absorb(e, &record.name, skipped)?,
            }
        }
        Ok(thread)
    }

    fn parse_sms(&self, record: &XmlElement, thread_address: &str) -> Result<Message> {
        let parse = &self.config.parse;
        let direction = Direction::from_str(record.attr("type").unwrap_or_default())?;
        let timestamp = self.record_timestamp(record)?;

        let encoding = Encoding::from_optional_tag(record.attr("encoding"))?;
        let charset = Charset::resolve_or(record.attr("charset"), parse.default_charset)?;
        let body = match encoding {
            Encoding::Plain => record.text.clone(),
            Encoding::Base64 => charset.decode(&encoding.decode(&record.text, charset)?)?,
        };

        let address = record.attr_present("address").unwrap_or(thread_address);
        let message = Message::new(address, timestamp, body, direction);
        Ok(match record.attr_present("service_center") {
            Some(relay) => message.with_relay(relay),
            None => message,
        })
    }

    fn parse_mms(&self, record: &XmlElement, skipped: &mut usize) -> Result<Option<Message>> {
        let direction = Direction::from_str(record.attr("type").unwrap_or_default())?;
        let timestamp = self.record_timestamp(record)?;

        let wanted = match direction {
            Direction::Received => Some("from"),
            Direction::Sent => Some("to"),
            Direction::Draft => None,
        };
        let address = wanted.and_then(|kind| {
            record
                .children_named("address")
                .find(|a| a.attr("type").is_some_and(|t| t.eq_ignore_ascii_case(kind)))
                .and_then(address_value)
        });
        let Some(address) = address else {
            warn!(direction = %direction, "No address matches the message direction, skipping");
            return Ok(None);
        };

        let parts = self.parse_parts(record, skipped)?;
        let subject = record.attr_present("subject").map(str::to_string);
        Ok(Some(Message::multimedia(address, timestamp, direction, subject, parts)))
    }

    fn parse_parts(&self, record: &XmlElement, skipped: &mut usize) -> Result<Vec<MultimediaPart>> {
        let mut parts = Vec::new();
        for element in record.children_named("part") {
            let raw = RawPart {
                content_type: element.attr("content_type").map(str::to_string),
                content_id: element.attr_present("content_id").map(str::to_string),
                content_location: element.attr_present("content_location").map(str::to_string),
                encoding: element.attr("encoding").map(str::to_string),
                charset: element.attr("charset").map(str::to_string),
                payload: element.text.clone(),
            };
            match build_part(&raw, self.config.parse.default_charset) {
                Ok(Some(part)) => parts.push(part),
                Ok(None) => *skipped += 1,
                Err(e) => absorb(e, "part", skipped)?,
            }
        }
        Ok(parts)
    }

    fn record_timestamp(&self, record: &XmlElement) -> Result<chrono::DateTime<chrono::FixedOffset>> {
        let parse = &self.config.parse;
        let raw = record
            .attr_present("date_sent")
            .or_else(|| record.attr_present("date"))
            .ok_or_else(|| ThreadpackError::invalid_timestamp("", parse.timestamp_format.clone()))?;
        let instant = parse_pattern(raw, parse)?;
        Ok(localize(instant, record_offset(record, parse)))
    }
}

impl Default for FullBackupReader {
    fn default() -> Self {
        Self::new()
    }
}

impl Reader for FullBackupReader {
    fn name(&self) -> &'static str {
        "Full backup"
    }

    fn source(&self) -> Source {
        Source::FullBackup
    }

    fn import(&mut self, input: &Path, auxiliary: Option<&Path>) -> Result<ImportSummary> {
        self.loaded.clear();
        require_input(input)?;
        let content = read_input(input)?;

        let (mut resolver, status) =
            ContactResolver::open_or_disabled(auxiliary, &self.config.contacts, self.extractor.as_deref());
        let (collection, skipped) = self
            .parse_str(&content, &mut resolver)
            .map_err(|e| e.with_path(input))?;
        let (threads, messages) = self.loaded.publish(collection);

        info!(threads, messages, skipped, "Loaded full backup");
        Ok(ImportSummary {
            threads,
            messages,
            skipped,
            status,
        })
    }

    fn threads(&self) -> &[Thread] {
        self.loaded.threads()
    }

    fn message_count(&self) -> usize {
        self.loaded.message_count()
    }
}

fn address_value(element: &XmlElement) -> Option<String> {
    element
        .attr_present("address")
        .or_else(|| element.attr_present("value"))
        .or_else(|| Some(element.text.trim()).filter(|t| !t.is_empty()))
        .map(str::to_string)
}

/// Checks that `root` is a full backup: a `backup` element whose `thread`
/// children each carry an address.
pub fn validate(root: &XmlElement) -> Result<()> {
    if root.name != "backup" {
        return Err(ThreadpackError::invalid_format(
            FORMAT,
            format!("expected <backup> root, found <{}>", root.name),
        ));
    }
    for child in &root.children {
        if child.name != "thread" {
            return Err(ThreadpackError::invalid_format(
                FORMAT,
                format!("unexpected <{}> under <backup>", child.name),
            ));
        }
        if child.attr_present("address").is_none() {
            return Err(ThreadpackError::invalid_format(FORMAT, "<thread> without address"));
        }
    }
    Ok(())
}

/// Parses `content` and checks it is a full backup.
pub fn validate_str(content: &str) -> Result<()> {
    validate(&parse_document(content)?)
}

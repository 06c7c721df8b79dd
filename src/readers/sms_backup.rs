//! Dedicated SMS backup XML reader.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use tracing::{debug, info, warn};

use super::{LoadedThreads, absorb, parse_box_direction, record_offset};
use crate::config::SmsBackupConfig;
use crate::contacts::ContactResolver;
use crate::error::{ErrorCode, Result, ThreadpackError};
use crate::extract::ArchiveExtractor;
use crate::message::{Direction, Message};
use crate::mms::{MultimediaPart, RawPart, build_part};
use crate::parsing::{XmlElement, localize, parse_document, parse_flexible, read_input};
use crate::reader::{ImportSummary, Reader, Source, require_input};
use crate::thread::{Thread, ThreadCollection};

const FORMAT: &str = "SMS backup XML";

/// MMS address role codes.
const ADDR_FROM: &str = "137";
const ADDR_TO: &str = "151";

/// Reader for dedicated SMS backup XML.
///
/// Records sit flat under the root and are grouped into threads by address:
/// ```xml
/// <smses count="2">
///   <sms address="+15550100200" date="1705314600000" type="1" body="Hi"
///        service_center="+15550000" contact_name="Ann"/>
///   <mms address="+15550100200" date="1705314700000" msg_box="2" sub="null">
///     <parts>
///       <part ct="text/plain" chset="106" cid="&lt;text0&gt;" cl="text0.txt" text="Look"/>
///       <part ct="image/jpeg" cid="&lt;img1&gt;" cl="img1.jpg" data="/9j/…"/>
///     </parts>
///   </mms>
/// </smses>
/// ```
///
/// Older backups spell part attributes out (`content_type`, `content_id`,
/// `content_location`, `charset`); both generations are accepted. Dates are
/// epoch milliseconds or the configured pattern.
pub struct SmsBackupReader {
    config: SmsBackupConfig,
    extractor: Option<Arc<dyn ArchiveExtractor>>,
    loaded: LoadedThreads,
}

impl SmsBackupReader {
    pub fn new() -> Self {
        Self::with_config(SmsBackupConfig::default())
    }

    pub fn with_config(config: SmsBackupConfig) -> Self {
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

    pub fn config(&self) -> &SmsBackupConfig {
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

        let mut threads: Vec<Thread> = Vec::new();
        let mut by_address: HashMap<String, usize> = HashMap::new();
        let mut skipped = 0;

        for record in &root.children {
            let parsed = match record.name.as_str() {
                "sms" => self.parse_sms(record),
                "mms" => self.parse_mms(record, &mut skipped),
                other => {
                    debug!(tag = other, "Ignoring element");
                    continue;
                }
            };
            let message = match parsed {
                Ok(Some(message)) => message,
                Ok(None) => {
                    skipped += 1;
                    continue;
                }
                Err(e) => {
                    absorb(e, &record.name, &mut skipped)?;
                    continue;
                }
            };

            let index = *by_address.entry(message.address.clone()).or_insert_with(|| {
                let name = record.attr_present("contact_name").map(str::to_string);
                threads.push(Thread::new(name, message.address.clone()));
                threads.len() - 1
            });
            threads[index].add(message);
        }

        let collection = threads
            .into_iter()
            .map(|mut thread| {
                if thread.name.is_none() {
                    thread.name = resolver.resolve_name(&thread.address);
                }
                thread
            })
            .collect();
        Ok((collection, skipped))
    }

    fn parse_sms(&self, record: &XmlElement) -> Result<Option<Message>> {
        let Some(address) = record.attr_present("address") else {
            warn!("SMS without address, skipping");
            return Ok(None);
        };
        let direction = parse_box_direction(record.attr("type").unwrap_or_default())?;
        let timestamp = self.record_timestamp(record)?;
        let body = record.attr("body").unwrap_or_default();

        let message = Message::new(address, timestamp, body, direction);
        Ok(Some(match record.attr_present("service_center") {
            Some(relay) => message.with_relay(relay),
            None => message,
        }))
    }

    fn parse_mms(&self, record: &XmlElement, skipped: &mut usize) -> Result<Option<Message>> {
        let direction = parse_box_direction(record.attr("msg_box").unwrap_or_default())?;
        let timestamp = self.record_timestamp(record)?;

        let Some(address) = record
            .attr_present("address")
            .map(str::to_string)
            .or_else(|| fallback_address(record, direction))
        else {
            warn!("MMS without address, skipping");
            return Ok(None);
        };

        let parts = self.parse_parts(record, skipped)?;
        let subject = record.attr_present("sub").map(str::to_string);
        Ok(Some(Message::multimedia(address, timestamp, direction, subject, parts)))
    }

    fn parse_parts(&self, record: &XmlElement, skipped: &mut usize) -> Result<Vec<MultimediaPart>> {
        let elements = record
            .children_named("parts")
            .flat_map(|parts| parts.children_named("part"))
            .chain(record.children_named("part"));

        let mut parts = Vec::new();
        for element in elements {
            match build_part(&raw_part(element), self.config.parse.default_charset) {
                Ok(Some(part)) => parts.push(part),
                Ok(None) => *skipped += 1,
                Err(e) => absorb(e, "part", skipped)?,
            }
        }
        Ok(parts)
    }

    fn record_timestamp(&self, record: &XmlElement) -> Result<DateTime<FixedOffset>> {
        let parse = &self.config.parse;
        let raw = record
            .attr_present("date")
            .ok_or_else(|| ThreadpackError::invalid_timestamp("", "milliseconds since 1970-01-01"))?;
        let instant = parse_flexible(raw, parse)?;
        Ok(localize(instant, record_offset(record, parse)))
    }
}

impl Default for SmsBackupReader {
    fn default() -> Self {
        Self::new()
    }
}

impl Reader for SmsBackupReader {
    fn name(&self) -> &'static str {
        "SMS backup"
    }

    fn source(&self) -> Source {
        Source::SmsBackup
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

        info!(threads, messages, skipped, "Loaded SMS backup");
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

/// Reads part attributes in either naming generation.
fn raw_part(element: &XmlElement) -> RawPart {
    let owned = |keys: &[&str]| {
        keys.iter()
            .find_map(|key| element.attr_present(key))
            .map(str::to_string)
    };
    let (encoding, payload) = match element.attr_present("data") {
        Some(data) => (Some("base64".to_string()), data.to_string()),
        None => {
            let text = element
                .attr("text")
                .filter(|t| !t.eq_ignore_ascii_case("null"))
                .map(str::to_string)
                .unwrap_or_else(|| element.text.clone());
            (None, text)
        }
    };
    RawPart {
        content_type: owned(&["ct", "content_type"]),
        content_id: owned(&["cid", "content_id"]),
        content_location: owned(&["cl", "content_location"]),
        encoding,
        charset: owned(&["chset", "charset"]),
        payload,
    }
}

/// Address from `addrs/addr`, picking the sender of received messages and
/// the recipient otherwise.
fn fallback_address(record: &XmlElement, direction: Direction) -> Option<String> {
    let role = match direction {
        Direction::Received => ADDR_FROM,
        Direction::Sent | Direction::Draft => ADDR_TO,
    };
    record
        .children_named("addrs")
        .flat_map(|addrs| addrs.children_named("addr"))
        .find(|addr| addr.attr("type") == Some(role))
        .and_then(|addr| addr.attr_present("address"))
        .map(str::to_string)
}

/// Checks that `root` is an SMS backup.
pub fn validate(root: &XmlElement) -> Result<()> {
    if root.name != "smses" {
        return Err(ThreadpackError::invalid_format(
            FORMAT,
            format!("expected <smses> root, found <{}>", root.name),
        ));
    }
    Ok(())
}

/// Parses `content` and checks it is an SMS backup.
pub fn validate_str(content: &str) -> Result<()> {
    validate(&parse_document(content)?)
}

//! Contact-name resolution against an address-book snapshot.
//!
//! Lookup runs in two tiers:
//!
//! 1. exact match of the address, or its normalized form, in the phone
//!    lookup table
//! 2. when tier 1 returns no rows, the minimal-match key (last seven digits,
//!    reversed) against the precomputed minimal-match column; more than one
//!    candidate contact is ambiguous and yields no name
//!
//! The address book itself sits behind the [`AddressBook`] port. Any query
//! failure turns the resolver into a no-op for the rest of the import.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, warn};

use crate::config::ContactConfig;
use crate::error::{ErrorCode, Result};
use crate::extract::ArchiveExtractor;

/// Read-only queries against an address book.
pub trait AddressBook: Send {
    /// Display names of contacts whose phone lookup entry equals `address`
    /// or `normalized`. Contacts without a name yield an empty string.
    fn exact_matches(&self, address: &str, normalized: &str) -> Result<Vec<String>>;

    /// Display names of the distinct contacts whose minimal-match key is
    /// `key`. Contacts without a name yield an empty string.
    fn min_match_candidates(&self, key: &str) -> Result<Vec<String>>;
}

/// Maps addresses to contact names.
pub struct ContactResolver {
    book: Option<Box<dyn AddressBook>>,
    config: ContactConfig,
    cache: HashMap<String, Option<String>>,
}

impl std::fmt::Debug for ContactResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContactResolver")
            .field("enabled", &self.is_enabled())
            .field("cached", &self.cache.len())
            .finish()
    }
}

impl Default for ContactResolver {
    fn default() -> Self {
        Self::disabled()
    }
}

impl ContactResolver {
    /// A resolver that never finds a name.
    pub fn disabled() -> Self {
        Self {
            book: None,
            config: ContactConfig::default(),
            cache: HashMap::new(),
        }
    }

    /// Wraps an address book.
    pub fn new(book: Box<dyn AddressBook>, config: ContactConfig) -> Self {
        Self {
            book: Some(book),
            config,
            cache: HashMap::new(),
        }
    }

    /// Opens the SQLite address book at `path`, extracting it first when
    /// `path` is an archive.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadpackError::AuxiliaryNotFound`](crate::ThreadpackError::AuxiliaryNotFound)
    /// when the file is missing or is not a usable address book.
    #[cfg(feature = "sqlite")]
    pub fn open(path: &Path, config: ContactConfig, extractor: Option<&dyn ArchiveExtractor>) -> Result<Self> {
        use crate::error::ThreadpackError;

        let unusable = || ThreadpackError::AuxiliaryNotFound {
            path: path.to_path_buf(),
        };
        let db_path = crate::extract::resolve_input(path, &config.database_filename, &config.extract_dir, extractor)
            .map_err(|e| {
                debug!(error = %e, "Address book could not be located");
                unusable()
            })?;
        let book = crate::sqlite::SqliteAddressBook::open(&db_path, config.query_timeout).map_err(|e| {
            debug!(error = %e, "Address book could not be opened");
            unusable()
        })?;
        Ok(Self::new(Box::new(book), config))
    }

    /// Opens the address book if one was supplied.
    ///
    /// Never fails: an unusable address book yields a disabled resolver and
    /// [`ErrorCode::AuxiliaryNotFound`].
    pub fn open_or_disabled(
        auxiliary: Option<&Path>,
        config: &ContactConfig,
        extractor: Option<&dyn ArchiveExtractor>,
    ) -> (Self, ErrorCode) {
        let Some(path) = auxiliary else {
            return (Self::disabled(), ErrorCode::Success);
        };

        match Self::open_auxiliary(path, config, extractor) {
            Ok(resolver) => (resolver, ErrorCode::Success),
            Err(e) => {
                warn!(error = %e, "Continuing without contact names");
                (Self::disabled(), ErrorCode::from(&e))
            }
        }
    }

    #[cfg(feature = "sqlite")]
    fn open_auxiliary(path: &Path, config: &ContactConfig, extractor: Option<&dyn ArchiveExtractor>) -> Result<Self> {
        Self::open(path, config.clone(), extractor)
    }

    #[cfg(not(feature = "sqlite"))]
    fn open_auxiliary(path: &Path, _config: &ContactConfig, _extractor: Option<&dyn ArchiveExtractor>) -> Result<Self> {
        debug!("Address books need the `sqlite` feature");
        Err(crate::error::ThreadpackError::AuxiliaryNotFound {
            path: path.to_path_buf(),
        })
    }

    /// Returns `true` while an address book is attached.
    pub fn is_enabled(&self) -> bool {
        self.book.is_some()
    }

    /// Looks up the contact name for `address`.
    pub fn resolve_name(&mut self, address: &str) -> Option<String> {
        let address = address.trim();
        if address.is_empty() || self.book.is_none() {
            return None;
        }
        if let Some(cached) = self.cache.get(address) {
            return cached.clone();
        }

        match self.lookup(address) {
            Ok(name) => {
                self.cache.insert(address.to_string(), name.clone());
                name
            }
            Err(e) => {
                warn!(error = %e, "Address book query failed, contact lookup disabled");
                self.book = None;
                None
            }
        }
    }

    fn lookup(&self, address: &str) -> Result<Option<String>> {
        let Some(book) = self.book.as_deref() else {
            return Ok(None);
        };

        let normalized = normalize_number(address);
        let exact = book.exact_matches(address, &normalized)?;
        if !exact.is_empty() {
            return Ok(exact
                .into_iter()
                .map(|n| n.trim().to_string())
                .find(|n| !n.is_empty()));
        }

        let key = min_match_key(address, self.config.min_match_len);
        if key.is_empty() {
            return Ok(None);
        }
        let candidates = book.min_match_candidates(&key)?;
        match candidates.as_slice() {
            [only] if !only.trim().is_empty() => Ok(Some(only.trim().to_string())),
            [] | [_] => Ok(None),
            _ => {
                debug!(address, candidates = candidates.len(), "Ambiguous minimal match");
                Ok(None)
            }
        }
    }
}

/// Keeps a leading `+` and the digits of a phone number.
///
/// ```
/// use threadpack::contacts::normalize_number;
///
/// assert_eq!(normalize_number("+1 (555) 010-0200"), "+15550100200");
/// ```
pub fn normalize_number(address: &str) -> String {
    let address = address.trim();
    let mut normalized = String::with_capacity(address.len());
    if address.starts_with('+') {
        normalized.push('+');
    }
    normalized.extend(address.chars().filter(char::is_ascii_digit));
    normalized
}

/// Last `len` digits of `address`, reversed.
///
/// ```
/// use threadpack::contacts::min_match_key;
///
/// assert_eq!(min_match_key("+1 555-010-0200", 7), "0020010");
/// ```
pub fn min_match_key(address: &str, len: usize) -> String {
    let digits: Vec<char> = address.chars().filter(char::is_ascii_digit).collect();
    let start = digits.len().saturating_sub(len);
    digits[start..].iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ThreadpackError;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeBook {
        exact: HashMap<String, String>,
        min_match: HashMap<String, Vec<String>>,
        fail: bool,
        queries: Arc<AtomicUsize>,
    }

    impl AddressBook for FakeBook {
        fn exact_matches(&self, address: &str, normalized: &str) -> Result<Vec<String>> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ThreadpackError::invalid_format("address book", "corrupt"));
            }
            Ok([address, normalized]
                .iter()
                .filter_map(|a| self.exact.get(*a).cloned())
                .collect())
        }

        fn min_match_candidates(&self, key: &str) -> Result<Vec<String>> {
            Ok(self.min_match.get(key).cloned().unwrap_or_default())
        }
    }

    #[test]
    fn test_exact_match() {
        let mut book = FakeBook::default();
        book.exact.insert("+15550100200".into(), "Ann".into());
        let mut resolver = ContactResolver::new(Box::new(book), ContactConfig::default());
        assert_eq!(resolver.resolve_name("+1 555 010 0200").as_deref(), Some("Ann"));
    }

    #[test]
    fn test_unique_min_match() {
        let mut book = FakeBook::default();
        book.min_match.insert("0020010".into(), vec!["Bob".into()]);
        let mut resolver = ContactResolver::new(Box::new(book), ContactConfig::default());
        assert_eq!(resolver.resolve_name("5550100200").as_deref(), Some("Bob"));
    }

    #[test]
    fn test_unnamed_exact_match_stops_lookup() {
        let mut book = FakeBook::default();
        book.exact.insert("5550100200".into(), String::new());
        book.min_match.insert("0020010".into(), vec!["Bob".into()]);
        let mut resolver = ContactResolver::new(Box::new(book), ContactConfig::default());
        assert_eq!(resolver.resolve_name("5550100200"), None);
    }

    #[test]
    fn test_ambiguous_min_match() {
        let mut book = FakeBook::default();
        book.min_match
            .insert("0020010".into(), vec!["Bob".into(), "Rob".into()]);
        let mut resolver = ContactResolver::new(Box::new(book), ContactConfig::default());
        assert_eq!(resolver.resolve_name("5550100200"), None);
    }

    #[test]
    fn test_failure_disables_resolver() {
        let book = FakeBook {
            fail: true,
            ..FakeBook::default()
        };
        let mut resolver = ContactResolver::new(Box::new(book), ContactConfig::default());
        assert_eq!(resolver.resolve_name("123"), None);
        assert!(!resolver.is_enabled());
    }

    #[test]
    fn test_results_are_cached() {
        let queries = Arc::new(AtomicUsize::new(0));
        let book = FakeBook {
            queries: Arc::clone(&queries),
            ..FakeBook::default()
        };
        let mut resolver = ContactResolver::new(Box::new(book), ContactConfig::default());
        resolver.resolve_name("5550100");
        resolver.resolve_name("5550100");
        assert_eq!(queries.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_disabled_resolver() {
        let mut resolver = ContactResolver::disabled();
        assert_eq!(resolver.resolve_name("5550100"), None);
    }

    #[test]
    fn test_open_or_disabled_without_file() {
        let (resolver, code) = ContactResolver::open_or_disabled(None, &ContactConfig::default(), None);
        assert!(!resolver.is_enabled());
        assert_eq!(code, ErrorCode::Success);
    }

    #[test]
    fn test_open_or_disabled_missing_file() {
        let (resolver, code) = ContactResolver::open_or_disabled(
            Some(Path::new("/no/such/contacts2.db")),
            &ContactConfig::default(),
            None,
        );
        assert!(!resolver.is_enabled());
        assert_eq!(code, ErrorCode::AuxiliaryNotFound);
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn test_timed_out_query_disables_resolver() {
        let book = crate::sqlite::slow_address_book(std::time::Duration::from_millis(50));
        let mut resolver = ContactResolver::new(Box::new(book), ContactConfig::default());
        let start = std::time::Instant::now();
        assert_eq!(resolver.resolve_name("+15550100200"), None);
        assert!(start.elapsed() < std::time::Duration::from_secs(1));
        assert!(!resolver.is_enabled());
        assert_eq!(resolver.resolve_name("+15550100200"), None);
    }

    #[test]
    fn test_min_match_key_short_address() {
        assert_eq!(min_match_key("123", 7), "321");
        assert_eq!(min_match_key("Mom", 7), "");
    }
}

//! Archive extraction port.
//!
//! Chat-client databases and address-book snapshots may arrive packed in a
//! tar archive. Unpacking is left to an [`ArchiveExtractor`] supplied by the
//! caller; this module only decides when one is needed.

use std::path::{Path, PathBuf};

use crate::error::{Result, ThreadpackError};

/// Unpacks an archive and locates one file inside it.
pub trait ArchiveExtractor: Send + Sync {
    /// Extracts `archive` into `destination` and returns the first extracted
    /// file named `target`, or `None` if the archive holds no such file.
    ///
    /// Implementations must be idempotent for a given `destination`.
    fn extract_and_find_first(&self, archive: &Path, destination: &Path, target: &str) -> Result<Option<PathBuf>>;
}

/// Returns `true` for `.tar`, `.tgz`, and `.tar.gz` paths.
pub fn is_archive(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    name.ends_with(".tar") || name.ends_with(".tgz") || name.ends_with(".tar.gz")
}

/// Resolves `input` to a plain file, extracting `target` from it when it is
/// an archive.
///
/// # Errors
///
/// - [`ThreadpackError::InputNotFound`] if `input` or the archived `target`
///   does not exist
/// - [`ThreadpackError::Archive`] if `input` is an archive and no extractor
///   is available
pub fn resolve_input(
    input: &Path,
    target: &str,
    destination: &Path,
    extractor: Option<&dyn ArchiveExtractor>,
) -> Result<PathBuf> {
    if !input.exists() {
        return Err(ThreadpackError::InputNotFound {
            path: input.to_path_buf(),
        });
    }
    if !is_archive(input) {
        return Ok(input.to_path_buf());
    }

    let extractor = extractor.ok_or_else(|| ThreadpackError::Archive {
        path: input.to_path_buf(),
        message: "no archive extractor configured".to_string(),
    })?;
    extractor
        .extract_and_find_first(input, destination, target)?
        .ok_or_else(|| ThreadpackError::InputNotFound {
            path: input.join(target),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    struct CopyExtractor;

    impl ArchiveExtractor for CopyExtractor {
        fn extract_and_find_first(&self, archive: &Path, destination: &Path, target: &str) -> Result<Option<PathBuf>> {
            fs::create_dir_all(destination)?;
            let out = destination.join(target);
            fs::copy(archive, &out)?;
            Ok(Some(out))
        }
    }

    struct EmptyExtractor;

    impl ArchiveExtractor for EmptyExtractor {
        fn extract_and_find_first(&self, _: &Path, _: &Path, _: &str) -> Result<Option<PathBuf>> {
            Ok(None)
        }
    }

    #[test]
    fn test_is_archive() {
        assert!(is_archive(Path::new("backup.tar")));
        assert!(is_archive(Path::new("/tmp/Backup.TAR.GZ")));
        assert!(is_archive(Path::new("x.tgz")));
        assert!(!is_archive(Path::new("main.db")));
        assert!(!is_archive(Path::new("sms.xml.gz")));
    }

    #[test]
    fn test_plain_file_passes_through() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("main.db");
        fs::write(&db, b"x").unwrap();
        assert_eq!(resolve_input(&db, "main.db", dir.path(), None).unwrap(), db);
    }

    #[test]
    fn test_missing_input() {
        let err = resolve_input(Path::new("/nope/main.db"), "main.db", Path::new("/tmp"), None).unwrap_err();
        assert!(matches!(err, ThreadpackError::InputNotFound { .. }));
    }

    #[test]
    fn test_archive_without_extractor() {
        let dir = tempfile::tempdir().unwrap();
        let tar = dir.path().join("skype.tar");
        fs::write(&tar, b"x").unwrap();
        let err = resolve_input(&tar, "main.db", dir.path(), None).unwrap_err();
        assert!(matches!(err, ThreadpackError::Archive { .. }));
    }

    #[test]
    fn test_archive_with_extractor() {
        let dir = tempfile::tempdir().unwrap();
        let tar = dir.path().join("skype.tar");
        fs::write(&tar, b"x").unwrap();
        let out = dir.path().join("out");
        let found = resolve_input(&tar, "main.db", &out, Some(&CopyExtractor)).unwrap();
        assert_eq!(found, out.join("main.db"));
    }

    #[test]
    fn test_archive_without_target() {
        let dir = tempfile::tempdir().unwrap();
        let tar = dir.path().join("skype.tar");
        fs::write(&tar, b"x").unwrap();
        let err = resolve_input(&tar, "main.db", dir.path(), Some(&EmptyExtractor)).unwrap_err();
        assert!(matches!(err, ThreadpackError::InputNotFound { .. }));
    }
}

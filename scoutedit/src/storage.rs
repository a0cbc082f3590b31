//! Whole-file text reads and writes.
//!
//! Reads pick a strategy by file size (plain read, buffered read, or memory
//! map for very large files) and decode according to [`EncodingMode`]. Writes
//! go through a temporary file in the target's directory and are renamed into
//! place, so a reader never observes a half-written file.
use memmap2::Mmap;
use std::fs::{self, File};
use std::io::{BufReader, Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{trace, warn};

use crate::config::EncodingMode;
use crate::errors::{SearchError, SearchResult};

const BUFFER_CAPACITY: usize = 65536;
pub(crate) const SMALL_FILE_THRESHOLD: u64 = 32 * 1024; // 32KB
pub(crate) const LARGE_FILE_THRESHOLD: u64 = 10 * 1024 * 1024; // 10MB

/// Strategy for reading files based on their size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReadStrategy {
    InMemory,
    Buffered,
    MemoryMapped,
}

impl ReadStrategy {
    pub(crate) fn for_file_size(size: u64) -> Self {
        if size < SMALL_FILE_THRESHOLD {
            ReadStrategy::InMemory
        } else if size < LARGE_FILE_THRESHOLD {
            ReadStrategy::Buffered
        } else {
            ReadStrategy::MemoryMapped
        }
    }
}

/// Decodes bytes into a String according to the encoding mode
pub fn decode_bytes(bytes: &[u8], path: &Path, encoding_mode: EncodingMode) -> SearchResult<String> {
    match encoding_mode {
        EncodingMode::FailFast => {
            String::from_utf8(bytes.to_vec()).map_err(|e| SearchError::encoding_error(path, e))
        }
        EncodingMode::Lossy => {
            let cow = String::from_utf8_lossy(bytes);
            if let std::borrow::Cow::Owned(_) = cow {
                warn!("Invalid UTF-8 replaced in file: {}", path.display());
            }
            Ok(cow.into_owned())
        }
    }
}

/// Reads a whole file as text.
pub fn read_text(path: &Path, encoding_mode: EncodingMode) -> SearchResult<String> {
    let strategy = match path.metadata() {
        Ok(metadata) => {
            if metadata.is_dir() {
                return Err(SearchError::not_a_file(path));
            }
            ReadStrategy::for_file_size(metadata.len())
        }
        Err(e) => return Err(SearchError::from_io(path, e)),
    };
    trace!("Reading {} using {:?}", path.display(), strategy);

    match strategy {
        ReadStrategy::InMemory => {
            let bytes = fs::read(path).map_err(|e| SearchError::from_io(path, e))?;
            decode_bytes(&bytes, path, encoding_mode)
        }
        ReadStrategy::Buffered => {
            let file = File::open(path).map_err(|e| SearchError::from_io(path, e))?;
            let mut reader = BufReader::with_capacity(BUFFER_CAPACITY, file);
            let mut bytes = Vec::new();
            reader.read_to_end(&mut bytes)?;
            decode_bytes(&bytes, path, encoding_mode)
        }
        ReadStrategy::MemoryMapped => {
            let file = File::open(path).map_err(|e| SearchError::from_io(path, e))?;
            // SAFETY: the map is read-only and dropped before this function returns
            let mmap = unsafe { Mmap::map(&file) }?;
            decode_bytes(&mmap, path, encoding_mode)
        }
    }
}

/// Replaces a file's content atomically, optionally keeping its permissions.
pub fn write_text_atomic(path: &Path, content: &str, preserve_metadata: bool) -> SearchResult<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let original_permissions = if preserve_metadata {
        fs::metadata(path).ok().map(|m| m.permissions())
    } else {
        None
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| SearchError::from_io(dir, e))?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| SearchError::from_io(path, e.error))?;

    if let Some(permissions) = original_permissions {
        fs::set_permissions(path, permissions)?;
    }
    trace!("Wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_strategies() {
        assert_eq!(ReadStrategy::for_file_size(10), ReadStrategy::InMemory);
        assert_eq!(
            ReadStrategy::for_file_size(SMALL_FILE_THRESHOLD),
            ReadStrategy::Buffered
        );
        assert_eq!(
            ReadStrategy::for_file_size(LARGE_FILE_THRESHOLD),
            ReadStrategy::MemoryMapped
        );
    }

    #[test]
    fn test_read_small_and_medium_files() {
        let dir = TempDir::new().unwrap();
        let small = dir.path().join("small.txt");
        fs::write(&small, "hello\nworld\n").unwrap();
        assert_eq!(read_text(&small, EncodingMode::Lossy).unwrap(), "hello\nworld\n");

        let medium = dir.path().join("medium.txt");
        let content = "medium test content\n".repeat(2000);
        fs::write(&medium, &content).unwrap();
        assert_eq!(read_text(&medium, EncodingMode::FailFast).unwrap(), content);
    }

    #[test]
    fn test_invalid_utf8_handling() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("binary.dat");
        fs::write(&path, [b'o', b'k', 0xff, 0xfe, b'\n']).unwrap();

        let lossy = read_text(&path, EncodingMode::Lossy).unwrap();
        assert!(lossy.starts_with("ok"));
        assert!(lossy.contains('\u{FFFD}'));

        let err = read_text(&path, EncodingMode::FailFast).unwrap_err();
        assert!(matches!(err, SearchError::EncodingError { .. }));
    }

    #[test]
    fn test_read_missing_and_directory() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            read_text(&dir.path().join("missing"), EncodingMode::Lossy),
            Err(SearchError::PathNotFound(_))
        ));
        assert!(matches!(
            read_text(dir.path(), EncodingMode::Lossy),
            Err(SearchError::NotAFile(_))
        ));
    }

    #[test]
    fn test_write_text_atomic() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.txt");
        fs::write(&path, "old").unwrap();

        write_text_atomic(&path, "new content", true).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new content");

        // No temp files left behind
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}

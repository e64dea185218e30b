//! Prior content inspection
//!
//! Looks at whatever a buffer file already holds before a store resizes it.
//! The result is diagnostic only and never becomes the live record.

use std::fs::File;
use std::io;
use std::path::Path;

use memmap2::MmapOptions;

use crate::error::{RecordError, Result};

/// Interpret `bytes` as a record: text up to the first NUL
///
/// Returns `None` when that text is empty.
pub(crate) fn record_text(bytes: &[u8]) -> Option<String> {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    if end == 0 {
        return None;
    }
    Some(String::from_utf8_lossy(&bytes[..end]).into_owned())
}

/// Map at most `limit` leading bytes of an open buffer file read-only and
/// decode its record text
pub(crate) fn peek(file: &File, limit: usize) -> io::Result<Option<String>> {
    let len = file.metadata()?.len().min(limit as u64) as usize;
    if len == 0 {
        return Ok(None);
    }

    // SAFETY: the mapping is read-only, no longer than the file, and dropped
    // before this function returns; the store holding `file` is not yet
    // mapping it.
    let mmap = unsafe { MmapOptions::new().len(len).map(file)? };
    Ok(record_text(&mmap))
}

/// Read the record text a buffer file currently holds, without resizing it
///
/// Only the first `limit` bytes are looked at. Missing or empty files yield
/// `None`. Bytes past the last saved record are residue, so the result may be
/// longer than what was last saved.
pub fn prior_record(path: &Path, limit: usize) -> Result<Option<String>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(RecordError::Open {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    Ok(peek(&file, limit)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_text_stops_at_nul() {
        assert_eq!(record_text(b"abc\0def"), Some("abc".to_string()));
        assert_eq!(record_text(b"abc"), Some("abc".to_string()));
    }

    #[test]
    fn test_record_text_empty() {
        assert_eq!(record_text(b""), None);
        assert_eq!(record_text(b"\0\0\0"), None);
    }

    #[test]
    fn test_prior_record_missing_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let result = prior_record(&temp.path().join("absent.buf"), 1000).unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn test_prior_record_reads_text() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("record.buf");
        let mut bytes = b"{\"a\":1}".to_vec();
        bytes.resize(32, 0);
        std::fs::write(&path, &bytes).unwrap();

        assert_eq!(
            prior_record(&path, 1000).unwrap(),
            Some("{\"a\":1}".to_string())
        );
    }

    #[test]
    fn test_prior_record_capped_at_limit() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("stray.buf");
        std::fs::write(&path, vec![b'x'; 50_000]).unwrap();

        let record = prior_record(&path, 100).unwrap().unwrap();

        assert_eq!(record.len(), 100);
    }

    #[test]
    fn test_peek_shorter_file_than_limit() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("short.buf");
        std::fs::write(&path, b"tiny").unwrap();
        let file = File::open(&path).unwrap();

        assert_eq!(peek(&file, 1000).unwrap(), Some("tiny".to_string()));
    }
}

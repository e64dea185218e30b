//! Journal Reader
//!
//! Reads frames back for inspection. Nothing here feeds the record store.

use std::fs;
use std::path::Path;

use crate::error::{RecordError, Result};

use super::{Frame, JournalEntry};

/// Summary of a journal's contents
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JournalStats {
    /// Number of valid entries
    pub entries: u64,

    /// Number of complete frames that failed validation
    pub corrupted: u64,

    /// Highest valid LSN, 0 when there is none
    pub last_lsn: u64,

    /// Trailing bytes that do not form a complete frame
    pub torn_tail_bytes: u64,

    /// Bytes from a frame with a damaged header to the end of the file.
    /// Frame boundaries past that point are lost.
    pub unreadable_bytes: u64,
}

impl JournalStats {
    pub fn is_clean(&self) -> bool {
        self.corrupted == 0 && self.torn_tail_bytes == 0 && self.unreadable_bytes == 0
    }
}

pub(super) struct Scan {
    pub(super) entries: Vec<JournalEntry>,
    pub(super) stats: JournalStats,
    /// Offset just past the last complete frame
    pub(super) valid_len: usize,
}

/// Walk every frame in `data`, skipping corrupted ones
///
/// Stops at a torn tail or at a frame whose header is damaged.
pub(super) fn scan(data: &[u8]) -> Scan {
    let mut entries = Vec::new();
    let mut stats = JournalStats::default();
    let mut pos = 0;

    while pos < data.len() {
        match JournalEntry::decode(&data[pos..]) {
            Frame::Entry { entry, len } => {
                stats.entries += 1;
                stats.last_lsn = stats.last_lsn.max(entry.lsn);
                entries.push(entry);
                pos += len;
            }
            Frame::Corrupt { len, reason } => {
                tracing::debug!(offset = pos, %reason, "skipping corrupted journal frame");
                stats.corrupted += 1;
                pos += len;
            }
            Frame::Damaged { reason } => {
                tracing::debug!(offset = pos, %reason, "journal frame header damaged");
                stats.unreadable_bytes = (data.len() - pos) as u64;
                return Scan {
                    entries,
                    stats,
                    valid_len: pos,
                };
            }
            Frame::Incomplete => break,
        }
    }

    stats.torn_tail_bytes = (data.len() - pos) as u64;

    Scan {
        entries,
        stats,
        valid_len: pos,
    }
}

/// Reads a journal file into memory for inspection
pub struct JournalReader {
    data: Vec<u8>,
}

impl JournalReader {
    /// Load the journal at `path`
    pub fn open(path: &Path) -> Result<Self> {
        let data = fs::read(path).map_err(|source| RecordError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self { data })
    }

    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// All valid entries in file order
    pub fn entries(&self) -> Vec<JournalEntry> {
        scan(&self.data).entries
    }

    /// Count entries and every kind of damage
    pub fn verify(&self) -> JournalStats {
        scan(&self.data).stats
    }

    /// Valid entries, or an error at the first sign of damage
    pub fn strict_entries(&self) -> Result<Vec<JournalEntry>> {
        let scanned = scan(&self.data);
        if !scanned.stats.is_clean() {
            return Err(RecordError::JournalCorruption(format!(
                "{} corrupted frames, {} torn tail bytes, {} unreadable bytes",
                scanned.stats.corrupted,
                scanned.stats.torn_tail_bytes,
                scanned.stats.unreadable_bytes
            )));
        }
        Ok(scanned.entries)
    }
}

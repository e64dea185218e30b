//! Journal writers
//!
//! The `Journal` trait is the extension point a store hands accepted
//! payloads to. Two implementations ship with the crate.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::{debug, error, warn};

use crate::config::JournalSyncStrategy;
use crate::error::{RecordError, Result};

use super::reader::scan;
use super::JournalEntry;

/// Sink for payloads accepted by a store
///
/// `append` is called before the payload is copied into the mapped region;
/// an error keeps the record unchanged.
pub trait Journal: Send {
    /// Record an accepted payload
    fn append(&mut self, payload: &[u8]) -> Result<()>;

    /// Force everything appended so far to disk
    fn sync(&mut self) -> Result<()>;

    /// Short name used in logs
    fn kind(&self) -> &'static str;
}

// =============================================================================
// Inert Journal
// =============================================================================

/// Holds the journal file open without ever touching its contents
#[derive(Debug)]
pub struct InertJournal {
    _file: File,
}

impl InertJournal {
    pub fn new(file: File) -> Self {
        Self { _file: file }
    }
}

impl Journal for InertJournal {
    fn append(&mut self, _payload: &[u8]) -> Result<()> {
        Ok(())
    }

    fn sync(&mut self) -> Result<()> {
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "inert"
    }
}

// =============================================================================
// Append Journal
// =============================================================================

/// File operations an append journal needs beyond `Read + Write + Seek`
pub trait JournalFile: Read + Write + Seek + Send {
    fn set_len(&mut self, len: u64) -> io::Result<()>;

    fn sync_data(&mut self) -> io::Result<()>;
}

impl JournalFile for File {
    fn set_len(&mut self, len: u64) -> io::Result<()> {
        File::set_len(self, len)
    }

    fn sync_data(&mut self) -> io::Result<()> {
        File::sync_data(self)
    }
}

/// Appends every payload as a checksummed, LSN-ordered frame
#[derive(Debug)]
pub struct AppendJournal<F: JournalFile = File> {
    file: F,
    next_lsn: u64,
    sync_strategy: JournalSyncStrategy,
    unsynced: usize,
}

impl AppendJournal<File> {
    /// Open or create a journal file at `path`
    pub fn open(path: &Path, sync_strategy: JournalSyncStrategy) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|source| RecordError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        Self::from_file(file, sync_strategy)
    }
}

impl<F: JournalFile> AppendJournal<F> {
    /// Take over an already opened journal file
    ///
    /// Existing frames are scanned to continue the LSN sequence. A partial
    /// frame at the tail is cut off so new frames stay parseable. A frame
    /// with a damaged header is an error and the file is left untouched.
    pub fn from_file(mut file: F, sync_strategy: JournalSyncStrategy) -> Result<Self> {
        let mut existing = Vec::new();
        file.seek(SeekFrom::Start(0))?;
        file.read_to_end(&mut existing)?;

        let scanned = scan(&existing);
        if scanned.stats.unreadable_bytes > 0 {
            return Err(RecordError::JournalCorruption(format!(
                "damaged frame header at offset {}, {} bytes after it unreadable",
                scanned.valid_len, scanned.stats.unreadable_bytes
            )));
        }
        if scanned.stats.corrupted > 0 {
            warn!(
                corrupted = scanned.stats.corrupted,
                "journal contains corrupted frames"
            );
        }
        if scanned.stats.torn_tail_bytes > 0 {
            warn!(
                bytes = scanned.stats.torn_tail_bytes,
                "truncating torn journal tail"
            );
            file.set_len(scanned.valid_len as u64)?;
        }

        file.seek(SeekFrom::End(0))?;

        let next_lsn = scanned.stats.last_lsn + 1;
        debug!(entries = scanned.stats.entries, next_lsn, "journal opened");

        Ok(Self {
            file,
            next_lsn,
            sync_strategy,
            unsynced: 0,
        })
    }

    /// LSN the next appended entry will get
    pub fn next_lsn(&self) -> u64 {
        self.next_lsn
    }

    /// Entries appended since the last fsync
    pub fn unsynced_count(&self) -> usize {
        self.unsynced
    }

    /// Write one frame, syncing if the strategy calls for it
    ///
    /// Returns whether a sync happened.
    fn write_frame(&mut self, frame: &[u8]) -> Result<bool> {
        self.file.write_all(frame)?;

        let due = match self.sync_strategy {
            JournalSyncStrategy::EveryWrite => true,
            JournalSyncStrategy::EveryNEntries { count } => self.unsynced + 1 >= count,
            JournalSyncStrategy::Os => false,
        };
        if due {
            self.file.sync_data()?;
        }
        Ok(due)
    }

    /// Cut the file back to `offset` after a failed append
    fn roll_back(&mut self, offset: u64) {
        let restored = self
            .file
            .set_len(offset)
            .and_then(|_| self.file.seek(SeekFrom::Start(offset)).map(|_| ()));
        if let Err(e) = restored {
            error!(offset, error = %e, "journal rollback failed");
        }
    }
}

impl<F: JournalFile> Journal for AppendJournal<F> {
    fn append(&mut self, payload: &[u8]) -> Result<()> {
        let frame = JournalEntry::new(self.next_lsn, payload).encode()?;
        let offset = self.file.stream_position()?;

        let synced = match self.write_frame(&frame) {
            Ok(synced) => synced,
            Err(e) => {
                self.roll_back(offset);
                return Err(e);
            }
        };

        self.next_lsn += 1;
        self.unsynced = if synced { 0 } else { self.unsynced + 1 };
        Ok(())
    }

    fn sync(&mut self) -> Result<()> {
        if self.unsynced > 0 {
            self.file.sync_data()?;
            self.unsynced = 0;
        }
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "append"
    }
}

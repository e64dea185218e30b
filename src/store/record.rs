//! Record store implementation
//!
//! One buffer file, one journal, one shared mapping.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom};
use std::path::{Path, PathBuf};

use memmap2::{MmapMut, MmapOptions};
use tracing::{debug, info, warn};

use crate::config::{JournalMode, OversizePolicy, StoreConfig};
use crate::error::{RecordError, Result};
use crate::journal::{AppendJournal, InertJournal, Journal};

use super::prior::{peek, record_text};

/// Permission bits for newly created files: rw-r--r--
#[cfg(unix)]
const FILE_MODE: u32 = 0o644;

/// What `save` did with a payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The payload is now the record
    Stored { len: usize },

    /// The payload was refused and the previous record kept
    Dropped { len: usize },
}

/// A single-record store over a memory-mapped buffer file
///
/// ## Lifecycle
/// - `open`: create/open both files, resize and map the buffer
/// - `save` / `read`: touch mapped memory only (plus the journal)
/// - `release`: unmap, then close both descriptors
///
/// Dropping the store releases the same resources implicitly; fields are
/// declared so the mapping goes before the descriptors.
///
/// ## Concurrency
/// None. Mutation needs `&mut self`; callers sharing a store across threads
/// must wrap it themselves.
pub struct RecordStore {
    /// Shared read/write mapping over the whole buffer file
    region: MmapMut,

    /// Buffer file descriptor, kept open for the mapping's lifetime
    buffer: File,

    /// Journal sink, owns the journal file descriptor
    journal: Box<dyn Journal>,

    buffer_path: PathBuf,

    /// Size of `region` in bytes
    capacity: usize,

    /// Bytes of `region` holding the current record, always < capacity
    used_len: usize,

    oversize_policy: OversizePolicy,
}

impl RecordStore {
    /// Open a store with the default config (1000 byte capacity)
    pub fn open(buffer_path: &Path, journal_path: &Path) -> Result<Self> {
        Self::open_with(buffer_path, journal_path, &StoreConfig::default())
    }

    /// Open or create a store
    ///
    /// On open:
    /// 1. Open/create the buffer file, then the journal file
    /// 2. Log any record the buffer file already holds, up to `capacity`
    ///    bytes (if enabled)
    /// 3. Resize the buffer file to exactly `capacity` bytes
    /// 4. Map it shared read/write
    ///
    /// Anything opened before a failing step is closed again on return.
    pub fn open_with(
        buffer_path: &Path,
        journal_path: &Path,
        config: &StoreConfig,
    ) -> Result<Self> {
        config.validate()?;
        let capacity = config.capacity;

        let mut buffer = open_rw(buffer_path)?;
        let journal_file = open_rw(journal_path)?;

        if config.inspect_prior_content {
            match peek(&buffer, capacity) {
                Ok(Some(prior)) => debug!(
                    path = %buffer_path.display(),
                    %prior,
                    "buffer file holds a prior record"
                ),
                Ok(None) => {}
                Err(e) => debug!(
                    path = %buffer_path.display(),
                    error = %e,
                    "could not inspect prior content"
                ),
            }
        }

        buffer
            .set_len(capacity as u64)
            .map_err(|source| RecordError::Resize {
                path: buffer_path.to_path_buf(),
                source,
            })?;
        buffer.seek(SeekFrom::Start(0))?;

        // SAFETY: the mapping covers exactly the `capacity` bytes the file was
        // just resized to. The file stays open for as long as the mapping lives
        // (both are owned by this store), and stores are single-owner, so no
        // other handle in this process resizes the file underneath it.
        let region = unsafe { MmapOptions::new().len(capacity).map_mut(&buffer) }.map_err(
            |source| RecordError::Map {
                path: buffer_path.to_path_buf(),
                source,
            },
        )?;

        let journal: Box<dyn Journal> = match config.journal_mode {
            JournalMode::Inert => Box::new(InertJournal::new(journal_file)),
            JournalMode::Append(strategy) => {
                Box::new(AppendJournal::from_file(journal_file, strategy)?)
            }
        };

        info!(
            path = %buffer_path.display(),
            capacity,
            journal = journal.kind(),
            "record store opened"
        );

        Ok(Self {
            region,
            buffer,
            journal,
            buffer_path: buffer_path.to_path_buf(),
            capacity,
            used_len: 0,
            oversize_policy: config.oversize_policy,
        })
    }

    /// Replace the current record with `payload`
    ///
    /// The payload ends at its first NUL byte, if it has one. A payload of
    /// `capacity` bytes or more is refused, as is one the journal fails to
    /// record; what a refusal returns depends on the oversize policy:
    /// - `Drop`: logged, `Ok(SaveOutcome::Dropped)`
    /// - `Reject`: the error itself
    ///
    /// Bytes past the new record's end are left as they were.
    pub fn save(&mut self, payload: &str) -> Result<SaveOutcome> {
        let bytes = payload.as_bytes();
        let bytes = match bytes.iter().position(|&b| b == 0) {
            Some(end) => &bytes[..end],
            None => bytes,
        };
        let len = bytes.len();

        if len >= self.capacity {
            return self.refuse(
                len,
                RecordError::OversizePayload {
                    len,
                    capacity: self.capacity,
                },
            );
        }

        if let Err(e) = self.journal.append(bytes) {
            return self.refuse(len, e);
        }

        self.region[..len].copy_from_slice(bytes);
        self.used_len = len;

        Ok(SaveOutcome::Stored { len })
    }

    fn refuse(&self, len: usize, err: RecordError) -> Result<SaveOutcome> {
        match self.oversize_policy {
            OversizePolicy::Drop => {
                warn!(
                    path = %self.buffer_path.display(),
                    len,
                    capacity = self.capacity,
                    error = %err,
                    "save dropped, record unchanged"
                );
                Ok(SaveOutcome::Dropped { len })
            }
            OversizePolicy::Reject => Err(err),
        }
    }

    /// The current record, or `None` if nothing has been saved
    pub fn read(&self) -> Option<String> {
        if self.used_len == 0 {
            return None;
        }
        record_text(&self.region[..self.used_len])
    }

    /// Write dirty mapped pages and pending journal frames to disk
    pub fn flush(&mut self) -> Result<()> {
        self.region.flush()?;
        self.journal.sync()
    }

    /// Unmap the region, then close the buffer and journal descriptors
    pub fn release(self) -> Result<()> {
        let RecordStore {
            region,
            buffer,
            mut journal,
            buffer_path,
            ..
        } = self;

        let synced = journal.sync();

        drop(region);
        drop(buffer);
        drop(journal);

        debug!(path = %buffer_path.display(), "record store released");
        synced
    }

    /// Swap in a different journal, returning the previous one
    pub fn replace_journal(&mut self, journal: Box<dyn Journal>) -> Box<dyn Journal> {
        std::mem::replace(&mut self.journal, journal)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Length of the current record in bytes
    pub fn used_len(&self) -> usize {
        self.used_len
    }

    pub fn is_empty(&self) -> bool {
        self.used_len == 0
    }

    pub fn buffer_path(&self) -> &Path {
        &self.buffer_path
    }

    pub fn journal_kind(&self) -> &'static str {
        self.journal.kind()
    }
}

impl fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordStore")
            .field("buffer_path", &self.buffer_path)
            .field("capacity", &self.capacity)
            .field("used_len", &self.used_len)
            .field("journal", &self.journal.kind())
            .finish()
    }
}

/// Open `path` read/write, creating it if absent
fn open_rw(path: &Path) -> Result<File> {
    let mut options = OpenOptions::new();
    options.read(true).write(true).create(true).truncate(false);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(FILE_MODE);
    }

    options.open(path).map_err(|source| RecordError::Open {
        path: path.to_path_buf(),
        source,
    })
}

//! Journal Module
//!
//! The journal file sits next to the record buffer and is reserved for
//! crash recovery. Nothing replays it into the record.
//!
//! ## Modes
//! - [`InertJournal`]: the file is opened and held, never written (default)
//! - [`AppendJournal`]: every accepted payload is appended as a frame
//!
//! Custom implementations plug in through the [`Journal`] trait.
//!
//! ## File Format (append mode)
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │ Frame 1                                             │
//! │ ┌─────────┬─────────┬──────────┬─────────┬────────┐ │
//! │ │ LSN (8) │ Len (4) │ HCRC (4) │ CRC (4) │ Data   │ │
//! │ └─────────┴─────────┴──────────┴─────────┴────────┘ │
//! ├─────────────────────────────────────────────────────┤
//! │ Frame 2 ...                                         │
//! └─────────────────────────────────────────────────────┘
//! ```
//! Integers are little-endian. `Data` is a bincode-encoded [`JournalEntry`].
//! `HCRC` covers LSN and Len; `CRC` covers LSN, Len and `Data`.
//!
//! ## Damage
//! - Partial frame at the end of the file: torn tail, cut off on open
//! - Bad `CRC`: that frame is skipped
//! - Bad `HCRC`: frame boundaries are lost from there on; opening for
//!   append fails and the file is left as is

mod entry;
mod writer;
mod reader;

pub use entry::{Frame, JournalEntry, HEADER_SIZE};
pub use writer::{AppendJournal, InertJournal, Journal, JournalFile};
pub use reader::{JournalReader, JournalStats};

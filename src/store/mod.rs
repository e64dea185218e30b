//! Store Module
//!
//! A single text record kept in a fixed-size, memory-mapped buffer file.
//!
//! ## Responsibilities
//! - Open/create the buffer and journal files
//! - Size the buffer file to exactly `capacity` bytes and map it shared
//! - Copy accepted payloads into the mapping, track the used length
//! - Unmap and close everything on release, including failed opens
//!
//! ## Buffer File Layout
//! ```text
//! 0                      used_len                         capacity
//! ┌──────────────────────┬────────────────────────────────┐
//! │ Current record       │ Residue from earlier records   │
//! └──────────────────────┴────────────────────────────────┘
//! ```
//!
//! ## Durability
//! `save` only writes into mapped memory. The OS writes dirty pages back on
//! its own schedule; call `flush` to force an msync.

mod record;
mod prior;

pub use record::{RecordStore, SaveOutcome};
pub use prior::prior_record;

//! # mmaprecord
//!
//! A persistent single-record store:
//! - One fixed-capacity record in a memory-mapped buffer file
//! - A journal file reserved for crash recovery (inert by default)
//! - Explicit `init` / `save` / `read` / `release` lifecycle
//! - Opaque 64-bit handles for callers across an FFI-style boundary
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     HandleRegistry                           │
//! │              (StoreHandle u64 → RecordStore)                 │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      RecordStore                             │
//! │                (single owner, no locking)                    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  Journal    │          │   MmapMut   │
//!   │ (reserved)  │          │ (capacity)  │
//!   └─────────────┘          └──────┬──────┘
//!                                   │
//!                                   ▼
//!                           ┌─────────────┐
//!                           │ Buffer file │
//!                           └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod journal;
pub mod store;
pub mod registry;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{RecordError, Result};
pub use config::StoreConfig;
pub use store::{RecordStore, SaveOutcome};
pub use registry::{HandleRegistry, StoreHandle};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of mmaprecord
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

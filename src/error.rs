//! Error types for mmaprecord
//!
//! Provides a unified error type for all store operations.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using RecordError
pub type Result<T> = std::result::Result<T, RecordError>;

/// Unified error type for mmaprecord operations
#[derive(Debug, Error)]
pub enum RecordError {
    // -------------------------------------------------------------------------
    // Lifecycle Errors (init)
    // -------------------------------------------------------------------------
    #[error("open {} failed: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("resizing {} failed: {source}", .path.display())]
    Resize {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("memory-mapping {} failed: {source}", .path.display())]
    Map {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // Record Errors
    // -------------------------------------------------------------------------
    #[error("payload of {len} bytes does not fit a record of capacity {capacity}")]
    OversizePayload { len: usize, capacity: usize },

    // -------------------------------------------------------------------------
    // Handle Errors
    // -------------------------------------------------------------------------
    #[error("invalid store handle: {0}")]
    InvalidHandle(u64),

    #[error("store handle {0} used after release")]
    UseAfterRelease(u64),

    // -------------------------------------------------------------------------
    // Journal Errors
    // -------------------------------------------------------------------------
    #[error("journal corruption detected: {0}")]
    JournalCorruption(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<bincode::Error> for RecordError {
    fn from(err: bincode::Error) -> Self {
        RecordError::Serialization(err.to_string())
    }
}

//! Configuration for mmaprecord
//!
//! Centralized store configuration with sensible defaults.

use crate::error::{RecordError, Result};

/// Record capacity used when none is configured (bytes)
pub const DEFAULT_CAPACITY: usize = 1000;

/// Configuration applied to every store opened with it
#[derive(Debug, Clone)]
pub struct StoreConfig {
    // -------------------------------------------------------------------------
    // Record Configuration
    // -------------------------------------------------------------------------
    /// Size of the mapped region in bytes. The stored record must stay
    /// strictly shorter than this.
    pub capacity: usize,

    /// What `save` does with a payload that does not fit
    pub oversize_policy: OversizePolicy,

    /// Log whatever record a non-empty buffer file held before `init`
    /// resized it. Purely informational.
    pub inspect_prior_content: bool,

    // -------------------------------------------------------------------------
    // Journal Configuration
    // -------------------------------------------------------------------------
    /// How the journal file is used
    pub journal_mode: JournalMode,
}

/// Handling of payloads whose length is >= capacity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OversizePolicy {
    /// Log a warning and keep the previous record (default)
    Drop,

    /// Return `RecordError::OversizePayload` to the caller
    Reject,
}

/// Journal behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalMode {
    /// File is opened and held but never written (default)
    Inert,

    /// Every accepted payload is appended as a checksummed frame
    Append(JournalSyncStrategy),
}

/// Journal sync strategy: how often to fsync appended frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalSyncStrategy {
    /// fsync after every append (safest, slowest)
    EveryWrite,

    /// fsync after N unsynced entries
    EveryNEntries { count: usize },

    /// Leave writeback to the OS; only `sync()` forces it
    Os,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            oversize_policy: OversizePolicy::Drop,
            inspect_prior_content: true,
            journal_mode: JournalMode::Inert,
        }
    }
}

impl StoreConfig {
    /// Create a new config builder
    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder::default()
    }

    /// Check the config before any file is touched
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(RecordError::Config(
                "capacity must be at least 1 byte".to_string(),
            ));
        }
        if let JournalMode::Append(JournalSyncStrategy::EveryNEntries { count: 0 }) =
            self.journal_mode
        {
            return Err(RecordError::Config(
                "journal sync interval must be at least 1 entry".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for StoreConfig
#[derive(Default)]
pub struct StoreConfigBuilder {
    config: StoreConfig,
}

impl StoreConfigBuilder {
    /// Set the record capacity (in bytes)
    pub fn capacity(mut self, bytes: usize) -> Self {
        self.config.capacity = bytes;
        self
    }

    /// Set the oversize payload policy
    pub fn oversize_policy(mut self, policy: OversizePolicy) -> Self {
        self.config.oversize_policy = policy;
        self
    }

    /// Enable or disable logging of prior buffer content on init
    pub fn inspect_prior_content(mut self, enabled: bool) -> Self {
        self.config.inspect_prior_content = enabled;
        self
    }

    /// Set the journal mode
    pub fn journal_mode(mut self, mode: JournalMode) -> Self {
        self.config.journal_mode = mode;
        self
    }

    pub fn build(self) -> StoreConfig {
        self.config
    }
}

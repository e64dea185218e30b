//! Handle Registry
//!
//! Exposes stores through opaque 64-bit handles for callers that cannot hold
//! a `RecordStore` directly (e.g. across an FFI boundary).
//!
//! ## Handle States
//! ```text
//!   never issued ──init──▶ live ──release──▶ released
//! ```
//! - never issued (including the null handle 0): `InvalidHandle`
//! - released: `UseAfterRelease`
//!
//! Handles are issued from 1 upward and never reused, so the two error
//! states can be told apart without remembering released handles.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, warn};

use crate::config::StoreConfig;
use crate::error::{RecordError, Result};
use crate::store::{RecordStore, SaveOutcome};

/// Opaque reference to a store owned by a [`HandleRegistry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StoreHandle(u64);

impl StoreHandle {
    /// Never issued by a registry
    pub const NULL: StoreHandle = StoreHandle(0);

    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_raw(self) -> u64 {
        self.0
    }

    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

/// Owns live stores and maps handles to them
///
/// Methods take `&mut self` for mutation; there is no internal locking.
pub struct HandleRegistry {
    config: StoreConfig,
    stores: HashMap<u64, RecordStore>,
    next_id: u64,
}

impl HandleRegistry {
    /// Create a registry whose stores all use `config`
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            stores: HashMap::new(),
            next_id: 1,
        }
    }

    /// Open a store and return its handle
    ///
    /// No handle is issued if opening fails.
    pub fn init(&mut self, buffer_path: &Path, journal_path: &Path) -> Result<StoreHandle> {
        let store = RecordStore::open_with(buffer_path, journal_path, &self.config)?;

        let handle = StoreHandle(self.next_id);
        self.next_id += 1;
        self.stores.insert(handle.0, store);

        debug!(handle = handle.0, "store handle issued");
        Ok(handle)
    }

    /// Save `payload` into the store behind `handle`
    ///
    /// Oversize payloads follow the store's oversize policy; handle errors
    /// are always returned.
    pub fn save(&mut self, handle: StoreHandle, payload: &str) -> Result<SaveOutcome> {
        self.get_mut(handle)?.save(payload)
    }

    /// The current record, or `None` if there is none or `handle` is not live
    pub fn read(&self, handle: StoreHandle) -> Option<String> {
        match self.get(handle) {
            Ok(store) => store.read(),
            Err(e) => {
                warn!(handle = handle.0, error = %e, "read on a non-live handle");
                None
            }
        }
    }

    /// Like `read`, but reports handle errors
    pub fn try_read(&self, handle: StoreHandle) -> Result<Option<String>> {
        Ok(self.get(handle)?.read())
    }

    /// Flush the store behind `handle` to disk
    pub fn flush(&mut self, handle: StoreHandle) -> Result<()> {
        self.get_mut(handle)?.flush()
    }

    /// Release the store behind `handle`
    ///
    /// A handle that was never issued is a no-op. Releasing twice fails with
    /// `UseAfterRelease`.
    pub fn release(&mut self, handle: StoreHandle) -> Result<()> {
        match self.get(handle) {
            Err(RecordError::InvalidHandle(_)) => return Ok(()),
            Err(e) => return Err(e),
            Ok(_) => {}
        }

        match self.stores.remove(&handle.0) {
            Some(store) => {
                debug!(handle = handle.0, "store handle released");
                store.release()
            }
            None => Err(RecordError::UseAfterRelease(handle.0)),
        }
    }

    /// Whether `handle` refers to an open store
    pub fn is_live(&self, handle: StoreHandle) -> bool {
        self.stores.contains_key(&handle.0)
    }

    /// Number of open stores
    pub fn live_count(&self) -> usize {
        self.stores.len()
    }

    fn get(&self, handle: StoreHandle) -> Result<&RecordStore> {
        self.check(handle)?;
        self.stores
            .get(&handle.0)
            .ok_or(RecordError::UseAfterRelease(handle.0))
    }

    fn get_mut(&mut self, handle: StoreHandle) -> Result<&mut RecordStore> {
        self.check(handle)?;
        self.stores
            .get_mut(&handle.0)
            .ok_or(RecordError::UseAfterRelease(handle.0))
    }

    /// Reject handles this registry never issued
    fn check(&self, handle: StoreHandle) -> Result<()> {
        if handle.is_null() || handle.0 >= self.next_id {
            return Err(RecordError::InvalidHandle(handle.0));
        }
        Ok(())
    }
}

impl Default for HandleRegistry {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

/// Release every remaining store, unmapping before closing
impl Drop for HandleRegistry {
    fn drop(&mut self) {
        for (handle, store) in self.stores.drain() {
            if let Err(e) = store.release() {
                warn!(handle, error = %e, "release during registry drop failed");
            }
        }
    }
}

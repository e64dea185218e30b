//! Tests for HandleRegistry
//!
//! These tests verify:
//! - init/save/read/release through opaque handles
//! - Null, never-issued and released handles are told apart
//! - Failed init issues no handle
//! - Handles are never reused

use std::fs;
use std::path::{Path, PathBuf};

use mmaprecord::config::{OversizePolicy, StoreConfig};
use mmaprecord::{HandleRegistry, RecordError, SaveOutcome, StoreHandle};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn paths(dir: &Path, name: &str) -> (PathBuf, PathBuf) {
    (
        dir.join(format!("{}.buf", name)),
        dir.join(format!("{}.journal", name)),
    )
}

fn setup_registry() -> (TempDir, HandleRegistry, StoreHandle) {
    let temp_dir = TempDir::new().unwrap();
    let (buffer, journal) = paths(temp_dir.path(), "record");
    let mut registry = HandleRegistry::default();
    let handle = registry.init(&buffer, &journal).unwrap();
    (temp_dir, registry, handle)
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_init_issues_live_handle() {
    let (_temp, registry, handle) = setup_registry();

    assert!(!handle.is_null());
    assert_eq!(handle.as_raw(), 1);
    assert!(registry.is_live(handle));
    assert_eq!(registry.live_count(), 1);
}

#[test]
fn test_read_fresh_handle_is_none() {
    let (_temp, registry, handle) = setup_registry();

    assert_eq!(registry.read(handle), None);
    assert_eq!(registry.try_read(handle).unwrap(), None);
}

#[test]
fn test_save_then_read() {
    let (_temp, mut registry, handle) = setup_registry();

    registry.save(handle, "{\"a\":1}").unwrap();

    assert_eq!(registry.read(handle), Some("{\"a\":1}".to_string()));
}

#[test]
fn test_oversize_save_is_soft_by_default() {
    let (_temp, mut registry, handle) = setup_registry();
    registry.save(handle, "kept").unwrap();

    let outcome = registry.save(handle, &"q".repeat(1000)).unwrap();

    assert_eq!(outcome, SaveOutcome::Dropped { len: 1000 });
    assert_eq!(registry.read(handle), Some("kept".to_string()));
}

#[test]
fn test_registry_config_applies_to_stores() {
    let temp = TempDir::new().unwrap();
    let (buffer, journal) = paths(temp.path(), "small");
    let config = StoreConfig::builder()
        .capacity(4)
        .oversize_policy(OversizePolicy::Reject)
        .build();
    let mut registry = HandleRegistry::new(config);

    let handle = registry.init(&buffer, &journal).unwrap();

    assert_eq!(fs::metadata(&buffer).unwrap().len(), 4);
    assert!(matches!(
        registry.save(handle, "four"),
        Err(RecordError::OversizePayload { len: 4, capacity: 4 })
    ));
}

#[test]
fn test_handles_are_independent() {
    let temp = TempDir::new().unwrap();
    let (buffer_a, journal_a) = paths(temp.path(), "a");
    let (buffer_b, journal_b) = paths(temp.path(), "b");
    let mut registry = HandleRegistry::default();

    let a = registry.init(&buffer_a, &journal_a).unwrap();
    let b = registry.init(&buffer_b, &journal_b).unwrap();
    registry.save(a, "alpha").unwrap();
    registry.save(b, "beta").unwrap();

    assert_ne!(a, b);
    assert_eq!(registry.read(a), Some("alpha".to_string()));
    assert_eq!(registry.read(b), Some("beta".to_string()));
}

#[test]
fn test_flush_live_handle() {
    let (temp, mut registry, handle) = setup_registry();
    registry.save(handle, "flushed").unwrap();

    registry.flush(handle).unwrap();

    let bytes = fs::read(temp.path().join("record.buf")).unwrap();
    assert_eq!(&bytes[..7], b"flushed");
}

// =============================================================================
// Handle Error Tests
// =============================================================================

#[test]
fn test_null_handle() {
    let (_temp, mut registry, _handle) = setup_registry();

    assert_eq!(registry.read(StoreHandle::NULL), None);
    assert!(matches!(
        registry.try_read(StoreHandle::NULL),
        Err(RecordError::InvalidHandle(0))
    ));
    assert!(matches!(
        registry.save(StoreHandle::NULL, "x"),
        Err(RecordError::InvalidHandle(0))
    ));
}

#[test]
fn test_never_issued_handle() {
    let (_temp, mut registry, _handle) = setup_registry();
    let bogus = StoreHandle::from_raw(42);

    assert_eq!(registry.read(bogus), None);
    assert!(matches!(
        registry.save(bogus, "x"),
        Err(RecordError::InvalidHandle(42))
    ));
    assert!(matches!(
        registry.flush(bogus),
        Err(RecordError::InvalidHandle(42))
    ));
}

#[test]
fn test_release_unknown_handle_is_noop() {
    let (_temp, mut registry, handle) = setup_registry();

    registry.release(StoreHandle::NULL).unwrap();
    registry.release(StoreHandle::from_raw(99)).unwrap();

    assert!(registry.is_live(handle));
}

#[test]
fn test_use_after_release() {
    let (_temp, mut registry, handle) = setup_registry();
    registry.save(handle, "gone").unwrap();

    registry.release(handle).unwrap();

    assert!(!registry.is_live(handle));
    assert_eq!(registry.read(handle), None);
    assert!(matches!(
        registry.try_read(handle),
        Err(RecordError::UseAfterRelease(1))
    ));
    assert!(matches!(
        registry.save(handle, "again"),
        Err(RecordError::UseAfterRelease(1))
    ));
}

#[test]
fn test_double_release_fails() {
    let (_temp, mut registry, handle) = setup_registry();

    registry.release(handle).unwrap();

    assert!(matches!(
        registry.release(handle),
        Err(RecordError::UseAfterRelease(1))
    ));
}

#[test]
fn test_failed_init_issues_no_handle() {
    let temp = TempDir::new().unwrap();
    let mut registry = HandleRegistry::default();
    let bad_buffer = temp.path().join("nope").join("record.buf");
    let (buffer, journal) = paths(temp.path(), "record");

    let err = registry.init(&bad_buffer, &journal).unwrap_err();
    assert!(matches!(err, RecordError::Open { .. }));
    assert_eq!(registry.live_count(), 0);

    let handle = registry.init(&buffer, &journal).unwrap();
    assert_eq!(handle.as_raw(), 1);
}

#[test]
fn test_handles_not_reused() {
    let (temp, mut registry, first) = setup_registry();
    let (buffer, journal) = paths(temp.path(), "record");

    registry.release(first).unwrap();
    let second = registry.init(&buffer, &journal).unwrap();

    assert_ne!(first, second);
    assert!(matches!(
        registry.save(first, "stale"),
        Err(RecordError::UseAfterRelease(_))
    ));
}

#[test]
fn test_reinit_same_paths_resizes_again() {
    let (temp, mut registry, handle) = setup_registry();
    let (buffer, journal) = paths(temp.path(), "record");
    registry.release(handle).unwrap();
    fs::OpenOptions::new()
        .write(true)
        .open(&buffer)
        .unwrap()
        .set_len(4096)
        .unwrap();

    let handle = registry.init(&buffer, &journal).unwrap();

    assert_eq!(fs::metadata(&buffer).unwrap().len(), 1000);
    assert_eq!(registry.read(handle), None);
}

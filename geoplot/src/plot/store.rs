//! Durable plot payload storage.
//!
//! A cross-session key-value side channel: every successfully fetched
//! payload is persisted, and every request consults the store before the
//! network, so warm starts avoid the network entirely. The core specifies
//! no eviction policy; the store is treated as unbounded external storage.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;

use bytes::Bytes;
use thiserror::Error;

use crate::geohash::GeohashKey;

/// Store-level errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O failure reading or writing a payload.
    #[error("plot store I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Durable key-value storage for raw plot payloads.
///
/// Implementations must tolerate concurrent readers; the loader serializes
/// writes through its event pump.
pub trait PlotStore: Send + Sync {
    /// The stored payload for a key, if present.
    fn get(&self, key: &GeohashKey) -> Option<Bytes>;

    /// Persist a payload, replacing any previous one for the key.
    fn put(&self, key: &GeohashKey, payload: Bytes) -> Result<(), StoreError>;
}

/// Filesystem-backed plot store: one `<key>.json` file per plot under a
/// root directory.
pub struct DiskPlotStore {
    dir: PathBuf,
}

impl DiskPlotStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &GeohashKey) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl PlotStore for DiskPlotStore {
    fn get(&self, key: &GeohashKey) -> Option<Bytes> {
        fs::read(self.path_for(key)).ok().map(Bytes::from)
    }

    fn put(&self, key: &GeohashKey, payload: Bytes) -> Result<(), StoreError> {
        fs::write(self.path_for(key), &payload)?;
        Ok(())
    }
}

/// In-memory plot store. Durable only for the lifetime of the process;
/// used in tests and as a session-local cache tier.
#[derive(Default)]
pub struct MemoryPlotStore {
    entries: RwLock<HashMap<GeohashKey, Bytes>>,
}

impl MemoryPlotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored payloads.
    pub fn len(&self) -> usize {
        self.entries.read().expect("plot store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PlotStore for MemoryPlotStore {
    fn get(&self, key: &GeohashKey) -> Option<Bytes> {
        self.entries
            .read()
            .expect("plot store lock poisoned")
            .get(key)
            .cloned()
    }

    fn put(&self, key: &GeohashKey, payload: Bytes) -> Result<(), StoreError> {
        self.entries
            .write()
            .expect("plot store lock poisoned")
            .insert(key.clone(), payload);
        Ok(())
    }
}

/// Store that never hits and discards writes.
///
/// Useful to measure fetch behavior without persistence, or to force
/// every request onto the network.
#[derive(Debug, Clone, Default)]
pub struct NoOpPlotStore;

impl NoOpPlotStore {
    pub fn new() -> Self {
        Self
    }
}

impl PlotStore for NoOpPlotStore {
    fn get(&self, _key: &GeohashKey) -> Option<Bytes> {
        None
    }

    fn put(&self, _key: &GeohashKey, _payload: Bytes) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> GeohashKey {
        GeohashKey::new(s).unwrap()
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryPlotStore::new();
        assert!(store.get(&key("u0cg2")).is_none());

        store.put(&key("u0cg2"), Bytes::from_static(b"payload")).unwrap();
        assert_eq!(store.get(&key("u0cg2")).unwrap(), Bytes::from_static(b"payload"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_memory_store_replaces() {
        let store = MemoryPlotStore::new();
        store.put(&key("u0cg2"), Bytes::from_static(b"old")).unwrap();
        store.put(&key("u0cg2"), Bytes::from_static(b"new")).unwrap();

        assert_eq!(store.get(&key("u0cg2")).unwrap(), Bytes::from_static(b"new"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_disk_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskPlotStore::new(dir.path()).unwrap();

        assert!(store.get(&key("u0cg2")).is_none());
        store.put(&key("u0cg2"), Bytes::from_static(b"{}")).unwrap();
        assert_eq!(store.get(&key("u0cg2")).unwrap(), Bytes::from_static(b"{}"));

        // A second store over the same directory sees the payload.
        let reopened = DiskPlotStore::new(dir.path()).unwrap();
        assert_eq!(reopened.get(&key("u0cg2")).unwrap(), Bytes::from_static(b"{}"));
    }

    #[test]
    fn test_noop_store_never_hits() {
        let store = NoOpPlotStore::new();
        store.put(&key("u0cg2"), Bytes::from_static(b"payload")).unwrap();
        assert!(store.get(&key("u0cg2")).is_none());
    }
}

//! Shared session context.
//!
//! The wanted-key set is the one piece of state shared between the
//! viewport (which recomputes it), the loader (which resolves its cells),
//! and import task conditions (which check that their cell is still on
//! screen). It is an explicit, cloneable handle owned by the session — not
//! a process-wide registry.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use crate::geohash::GeohashKey;

/// Handle to the set of keys the current viewport wants.
///
/// Clones share the same underlying set.
#[derive(Clone, Default)]
pub struct WantedKeys {
    inner: Arc<RwLock<HashSet<GeohashKey>>>,
}

impl WantedKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in the key set for a new viewport.
    pub fn replace(&self, keys: HashSet<GeohashKey>) {
        let mut inner = self.inner.write().expect("wanted keys lock poisoned");
        *inner = keys;
    }

    /// Whether a cell is currently wanted.
    pub fn contains(&self, key: &GeohashKey) -> bool {
        self.inner
            .read()
            .expect("wanted keys lock poisoned")
            .contains(key)
    }

    /// A copy of the current set.
    pub fn snapshot(&self) -> HashSet<GeohashKey> {
        self.inner
            .read()
            .expect("wanted keys lock poisoned")
            .clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().expect("wanted keys lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

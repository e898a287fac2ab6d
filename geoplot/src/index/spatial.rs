//! Geohash-keyed feature index.
//!
//! Maps grid cells to the features placed in them. Entries keep insertion
//! order and are never deduplicated: inserting the same handle twice yields
//! two entries, and avoiding that is the caller's responsibility. Coarse
//! features indexed at short keys are still found from fine cells through
//! [`SpatialIndex::lookup_upward`].

use dashmap::DashMap;

use crate::feature::FeatureHandle;
use crate::geohash::GeohashKey;

/// Cell-keyed store of feature handles.
///
/// Per-key access goes through a `DashMap`, so the API is `&self` and the
/// index can be shared between import tasks and queries.
pub struct SpatialIndex {
    entries: DashMap<GeohashKey, Vec<FeatureHandle>>,
}

impl SpatialIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Append a handle to the entry for `key`, creating the entry if absent.
    ///
    /// No deduplication: the same handle inserted twice is stored twice.
    pub fn insert(&self, key: GeohashKey, handle: FeatureHandle) {
        self.entries.entry(key).or_default().push(handle);
    }

    /// The handles indexed at exactly `key`, in insertion order.
    ///
    /// An absent key yields an empty vec, never an error.
    pub fn lookup(&self, key: &GeohashKey) -> Vec<FeatureHandle> {
        self.entries
            .get(key)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// The handles at `key` followed by those at every strict prefix of
    /// `key`, from longest to shortest.
    ///
    /// Used so coarse background features indexed at low precision are still
    /// found when querying a fine cell.
    pub fn lookup_upward(&self, key: &GeohashKey) -> Vec<FeatureHandle> {
        let mut handles = self.lookup(key);
        for prefix in key.prefixes() {
            handles.extend(self.lookup(&prefix));
        }
        handles
    }

    /// Number of cells with at least one entry.
    pub fn key_count(&self) -> usize {
        self.entries.len()
    }

    /// Total number of stored handles across all cells.
    pub fn handle_count(&self) -> usize {
        self.entries.iter().map(|entry| entry.value().len()).sum()
    }

    /// All keys currently populated.
    pub fn keys(&self) -> Vec<GeohashKey> {
        self.entries.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{NodeId, WayId};

    fn key(s: &str) -> GeohashKey {
        GeohashKey::new(s).unwrap()
    }

    fn node(id: i64) -> FeatureHandle {
        FeatureHandle::Node(NodeId(id))
    }

    fn way(id: i64) -> FeatureHandle {
        FeatureHandle::Way(WayId(id))
    }

    // =========================================================================
    // Insert and lookup
    // =========================================================================

    #[test]
    fn test_lookup_absent_is_empty() {
        let index = SpatialIndex::new();
        assert!(index.lookup(&key("u0cg2")).is_empty());
    }

    #[test]
    fn test_insert_preserves_order() {
        let index = SpatialIndex::new();
        index.insert(key("u0cg2"), node(1));
        index.insert(key("u0cg2"), way(2));
        index.insert(key("u0cg2"), node(3));

        assert_eq!(index.lookup(&key("u0cg2")), vec![node(1), way(2), node(3)]);
    }

    #[test]
    fn test_insert_does_not_dedup() {
        // Documented contract: duplicates are the caller's responsibility.
        let index = SpatialIndex::new();
        index.insert(key("u0cg2"), node(1));
        index.insert(key("u0cg2"), node(1));

        assert_eq!(index.lookup(&key("u0cg2")).len(), 2);
        assert_eq!(index.handle_count(), 2);
    }

    // =========================================================================
    // Upward lookup
    // =========================================================================

    #[test]
    fn test_lookup_upward_concatenates_prefixes() {
        let index = SpatialIndex::new();
        index.insert(key("u0cg2"), node(5));
        index.insert(key("u0c"), way(4));
        index.insert(key("u"), way(1));
        // A sibling cell must not appear
        index.insert(key("u0cg8"), node(9));

        let found = index.lookup_upward(&key("u0cg2"));
        assert_eq!(found, vec![node(5), way(4), way(1)]);
    }

    #[test]
    fn test_lookup_upward_longest_to_shortest() {
        let index = SpatialIndex::new();
        index.insert(key("u"), node(1));
        index.insert(key("u0"), node(2));
        index.insert(key("u0c"), node(3));

        let found = index.lookup_upward(&key("u0c"));
        assert_eq!(found, vec![node(3), node(2), node(1)]);
    }

    // =========================================================================
    // Counters and clear
    // =========================================================================

    #[test]
    fn test_counts_and_clear() {
        let index = SpatialIndex::new();
        index.insert(key("u0"), node(1));
        index.insert(key("u0"), node(2));
        index.insert(key("v0"), way(3));

        assert_eq!(index.key_count(), 2);
        assert_eq!(index.handle_count(), 3);

        let mut keys = index.keys();
        keys.sort();
        assert_eq!(keys, vec![key("u0"), key("v0")]);

        index.clear();
        assert_eq!(index.key_count(), 0);
        assert!(index.lookup(&key("u0")).is_empty());
    }
}

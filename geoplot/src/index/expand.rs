//! Viewport flood-fill over the cell grid.
//!
//! Starting from a center cell, walks neighbor-to-neighbor and collects
//! every cell whose bounding box intersects the query viewport. The walk is
//! iterative with an explicit queue and visited set, so dense viewports
//! cannot overflow the stack, and it stops exactly at the viewport edge:
//! cells outside never enter the result and are never recursed into.

use std::collections::{HashSet, VecDeque};

use crate::geohash::{decode, neighbors8, BoundingBox, GeohashKey};

/// The set of grid cells at `center`'s precision whose boxes intersect
/// `viewport`, reachable from `center` by neighbor adjacency.
///
/// The center cell itself is included when it intersects. Termination is
/// guaranteed: every examined key enters the visited set once, and only
/// intersecting keys are expanded further, so the walk is bounded by the
/// finite number of cells overlapping the viewport plus their border ring.
pub fn expand_bbox(center: &GeohashKey, viewport: &BoundingBox) -> HashSet<GeohashKey> {
    let mut visited: HashSet<GeohashKey> = HashSet::new();
    let mut result: HashSet<GeohashKey> = HashSet::new();
    let mut queue: VecDeque<GeohashKey> = VecDeque::new();

    visited.insert(center.clone());
    if decode(center).intersects(viewport) {
        result.insert(center.clone());
    }
    queue.push_back(center.clone());

    while let Some(key) = queue.pop_front() {
        for neighbor in neighbors8(&key) {
            if !visited.insert(neighbor.clone()) {
                continue;
            }
            if decode(&neighbor).intersects(viewport) {
                result.insert(neighbor.clone());
                queue.push_back(neighbor);
            }
        }
    }

    result
}

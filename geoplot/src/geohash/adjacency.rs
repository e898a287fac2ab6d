//! Neighbor-key arithmetic on the geohash grid.
//!
//! Adjacent cells are computed directly on the encoded key via lookup tables
//! rather than by decoding and re-encoding coordinates, so results are exact
//! at cell boundaries. Longitude wraps at the antimeridian; at the poles the
//! tables wrap to the opposite latitude edge, which callers bound away with a
//! viewport test.

use super::codec::{GeohashKey, BASE32};

/// A cardinal direction on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Top,
    Right,
    Bottom,
    Left,
}

// Neighbor tables: the character at position i of BASE32 has, in the given
// direction, the character at position i of the table. Which table applies
// alternates with key-length parity because the encoding interleaves
// longitude and latitude bits.
const NEIGHBOR_RIGHT_EVEN: &str = "bc01fg45238967deuvhjyznpkmstqrwx";
const NEIGHBOR_LEFT_EVEN: &str = "238967debc01fg45kmstqrwxuvhjyznp";
const NEIGHBOR_TOP_EVEN: &str = "p0r21436x8zb9dcf5h7kjnmqesgutwvy";
const NEIGHBOR_BOTTOM_EVEN: &str = "14365h7k9dcfesgujnmqp0r2twvyx8zb";

// Characters on a grid border in the given direction: stepping over them
// carries into the parent cell.
const BORDER_RIGHT_EVEN: &str = "bcfguvyz";
const BORDER_LEFT_EVEN: &str = "0145hjnp";
const BORDER_TOP_EVEN: &str = "prxz";
const BORDER_BOTTOM_EVEN: &str = "028b";

/// Neighbor and border tables for a direction at a given key-length parity.
fn tables(dir: Direction, odd: bool) -> (&'static str, &'static str) {
    // Odd-length keys swap the axes: right/left use the even top/bottom
    // tables and vice versa.
    match (dir, odd) {
        (Direction::Right, false) => (NEIGHBOR_RIGHT_EVEN, BORDER_RIGHT_EVEN),
        (Direction::Left, false) => (NEIGHBOR_LEFT_EVEN, BORDER_LEFT_EVEN),
        (Direction::Top, false) => (NEIGHBOR_TOP_EVEN, BORDER_TOP_EVEN),
        (Direction::Bottom, false) => (NEIGHBOR_BOTTOM_EVEN, BORDER_BOTTOM_EVEN),
        (Direction::Right, true) => (NEIGHBOR_TOP_EVEN, BORDER_TOP_EVEN),
        (Direction::Left, true) => (NEIGHBOR_BOTTOM_EVEN, BORDER_BOTTOM_EVEN),
        (Direction::Top, true) => (NEIGHBOR_RIGHT_EVEN, BORDER_RIGHT_EVEN),
        (Direction::Bottom, true) => (NEIGHBOR_LEFT_EVEN, BORDER_LEFT_EVEN),
    }
}

fn adjacent_str(key: &str, dir: Direction) -> String {
    let Some(last) = key.chars().last() else {
        // Carry ran past the coarsest level: wrap within the top-level grid.
        return String::new();
    };
    let odd = key.len() % 2 == 1;
    let (neighbors, borders) = tables(dir, odd);

    let mut base = key[..key.len() - 1].to_string();
    if borders.contains(last) {
        base = adjacent_str(&base, dir);
    }

    // The key invariant guarantees `last` appears in every neighbor table.
    let idx = neighbors
        .find(last)
        .expect("base-32 character missing from neighbor table");
    base.push(BASE32[idx] as char);
    base
}

/// The adjacent key of the same precision in the given direction.
pub fn adjacent(key: &GeohashKey, dir: Direction) -> GeohashKey {
    GeohashKey::from_validated(adjacent_str(key.as_str(), dir))
}

/// The four edge-adjacent keys, clockwise from the top: `[top, right,
/// bottom, left]`.
pub fn neighbors4(key: &GeohashKey) -> [GeohashKey; 4] {
    [
        adjacent(key, Direction::Top),
        adjacent(key, Direction::Right),
        adjacent(key, Direction::Bottom),
        adjacent(key, Direction::Left),
    ]
}

/// All eight adjacent keys, clockwise from the top: `[top, top-right,
/// right, bottom-right, bottom, bottom-left, left, top-left]`.
///
/// Diagonals are derived from the edge neighbors, so they stay exact at
/// cell corners.
pub fn neighbors8(key: &GeohashKey) -> [GeohashKey; 8] {
    let top = adjacent(key, Direction::Top);
    let right = adjacent(key, Direction::Right);
    let bottom = adjacent(key, Direction::Bottom);
    let left = adjacent(key, Direction::Left);

    let top_right = adjacent(&top, Direction::Right);
    let bottom_right = adjacent(&bottom, Direction::Right);
    let bottom_left = adjacent(&bottom, Direction::Left);
    let top_left = adjacent(&top, Direction::Left);

    [
        top,
        top_right,
        right,
        bottom_right,
        bottom,
        bottom_left,
        left,
        top_left,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geohash::codec::{decode, encode};

    fn key(s: &str) -> GeohashKey {
        GeohashKey::new(s).unwrap()
    }

    // =========================================================================
    // Single-character grid
    // =========================================================================

    #[test]
    fn test_adjacent_single_char() {
        // The precision-1 grid is 8 columns by 4 rows; 's' sits mid-grid.
        assert_eq!(adjacent(&key("s"), Direction::Top).as_str(), "u");
        assert_eq!(adjacent(&key("s"), Direction::Bottom).as_str(), "k");
        assert_eq!(adjacent(&key("s"), Direction::Right).as_str(), "t");
        assert_eq!(adjacent(&key("s"), Direction::Left).as_str(), "e");
    }

    #[test]
    fn test_adjacent_wraps_antimeridian() {
        // 'p' is the south-east corner cell; east of it wraps to '0'.
        assert_eq!(adjacent(&key("p"), Direction::Right).as_str(), "0");
        assert_eq!(adjacent(&key("0"), Direction::Left).as_str(), "p");
    }

    // =========================================================================
    // Inverse relationships
    // =========================================================================

    #[test]
    fn test_neighbors_are_inverse() {
        for (lat, lon) in [(48.1, 11.5), (-33.9, 151.2), (0.01, 0.01), (42.6, -5.6)] {
            for p in 1..=7 {
                let k = encode(lat, lon, p);
                let right = adjacent(&k, Direction::Right);
                let top = adjacent(&k, Direction::Top);
                assert_eq!(adjacent(&right, Direction::Left), k, "left(right({}))", k);
                assert_eq!(adjacent(&top, Direction::Bottom), k, "bottom(top({}))", k);
            }
        }
    }

    #[test]
    fn test_neighbor_boxes_are_contiguous() {
        let k = encode(48.1173, 11.5167, 6);
        let bbox = decode(&k);
        let right = decode(&adjacent(&k, Direction::Right));
        let top = decode(&adjacent(&k, Direction::Top));

        assert!((right.lon_min - bbox.lon_max).abs() < 1e-9);
        assert!((right.lat_min - bbox.lat_min).abs() < 1e-9);
        assert!((top.lat_min - bbox.lat_max).abs() < 1e-9);
        assert!((top.lon_min - bbox.lon_min).abs() < 1e-9);
    }

    // =========================================================================
    // Neighbor sets
    // =========================================================================

    #[test]
    fn test_neighbors4_order() {
        let k = key("s");
        let n = neighbors4(&k);
        assert_eq!(
            n.iter().map(|k| k.as_str()).collect::<Vec<_>>(),
            vec!["u", "t", "k", "e"]
        );
    }

    #[test]
    fn test_neighbors8_are_distinct_and_adjacent() {
        let k = encode(48.1173, 11.5167, 5);
        let n = neighbors8(&k);

        let mut seen = std::collections::HashSet::new();
        for neighbor in &n {
            assert_ne!(neighbor, &k);
            assert!(seen.insert(neighbor.clone()), "duplicate {}", neighbor);
            assert_eq!(neighbor.precision(), k.precision());
        }

        // Every neighbor box touches the center box.
        let bbox = decode(&k);
        for neighbor in &n {
            assert!(
                decode(neighbor).intersects(&bbox),
                "{} does not touch {}",
                neighbor,
                k
            );
        }
    }

    #[test]
    fn test_neighbors8_clockwise_from_top() {
        let k = encode(48.1173, 11.5167, 5);
        let n = neighbors8(&k);
        let center = decode(&k).center();

        // Index 0 is due north, index 2 due east, 4 due south, 6 due west.
        assert!(decode(&n[0]).center().0 > center.0);
        assert!(decode(&n[2]).center().1 > center.1);
        assert!(decode(&n[4]).center().0 < center.0);
        assert!(decode(&n[6]).center().1 < center.1);
    }
}

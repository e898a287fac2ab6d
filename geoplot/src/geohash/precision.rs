//! Extent-to-precision step tables.
//!
//! Maps the angular size of a feature or viewport to the key length whose
//! cells are just large enough to cover it. The thresholds are fixed and must
//! not be adjusted: interoperability with the existing tile grid depends on
//! every client choosing identical key lengths for identical extents.

/// Longitude-span thresholds, finest first: a span strictly below the
/// threshold selects the paired precision.
const LON_STEPS: [(f64, u8); 12] = [
    (0.000_000_335_7, 12),
    (0.000_001_341, 11),
    (0.000_010_72, 10),
    (0.000_042_91, 9),
    (0.000_343_3, 8),
    (0.001_373, 7),
    (0.010_98, 6),
    (0.043_94, 5),
    (0.351_5, 4),
    (1.406, 3),
    (11.25, 2),
    (45.0, 1),
];

/// Latitude-span thresholds, finest first.
const LAT_STEPS: [(f64, u8); 12] = [
    (0.000_000_167_6, 12),
    (0.000_001_341, 11),
    (0.000_005_364, 10),
    (0.000_042_91, 9),
    (0.000_171_6, 8),
    (0.001_373, 7),
    (0.005_493, 6),
    (0.043_94, 5),
    (0.175_7, 4),
    (1.406_25, 3),
    (5.625, 2),
    (45.0, 1),
];

fn step(span: f64, steps: &[(f64, u8); 12]) -> u8 {
    for &(threshold, precision) in steps {
        if span < threshold {
            return precision;
        }
    }
    // Spans of 45 degrees or more get the whole-planet bucket.
    0
}

/// The key length appropriate for an extent of the given angular spans.
///
/// Returns the minimum of the two per-axis precisions so the chosen cell
/// never under-covers either dimension. A result of 0 means the extent is
/// too large for any single cell; [`super::encode`] clamps it to 1.
pub fn precision_for_extent(lat_span: f64, lon_span: f64) -> u8 {
    step(lat_span, &LAT_STEPS).min(step(lon_span, &LON_STEPS))
}

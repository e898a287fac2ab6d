//! Geohash grid mathematics.
//!
//! Pure functions over base-32 grid keys: encoding and decoding, neighbor
//! arithmetic, prefix truncation, and the extent-to-precision step tables.
//! Everything here is stateless; the spatial index and loader build on it.

mod adjacency;
mod codec;
mod precision;

pub use adjacency::{adjacent, neighbors4, neighbors8, Direction};
pub use codec::{
    decode, encode, BoundingBox, GeohashError, GeohashKey, MAX_PRECISION, MIN_PRECISION,
};
pub use precision::precision_for_extent;

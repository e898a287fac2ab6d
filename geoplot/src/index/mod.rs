//! Spatial indexing and viewport expansion.

mod expand;
mod spatial;

pub use expand::expand_bbox;
pub use spatial::SpatialIndex;

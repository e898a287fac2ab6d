//! Feature domain records.
//!
//! Nodes (points) and ways (polylines) with their shared capabilities.
//! Instead of a common base type, features expose what they can do through
//! small traits: [`Tagged`] for key/value metadata and [`HasExtent`] for
//! geometry bounds. The [`FeatureStore`] owns all records; the rest of the
//! crate refers to them through [`FeatureHandle`]s.

mod handle;
mod node;
mod store;
mod way;

use std::collections::HashMap;

pub use handle::{FeatureHandle, NodeId, WayId};
pub use node::Node;
pub use store::{CoastlineChain, FeatureStore};
pub use way::Way;

use crate::geohash::BoundingBox;

/// Key/value feature metadata.
pub type TagMap = HashMap<String, String>;

/// Capability: the feature carries key/value tags.
pub trait Tagged {
    fn tags(&self) -> &TagMap;

    /// Convenience tag lookup.
    fn tag(&self, key: &str) -> Option<&str> {
        self.tags().get(key).map(String::as_str)
    }
}

/// Capability: the feature has a geographic extent.
pub trait HasExtent {
    fn extent(&self) -> BoundingBox;
}

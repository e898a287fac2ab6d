//! Point features.

use super::{HasExtent, NodeId, TagMap, Tagged};
use crate::geohash::BoundingBox;

/// A point feature with a coordinate and optional metadata.
///
/// Most nodes exist only to give ways their geometry; nodes flagged
/// `display` are independently visible and get indexed on their own.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub lat: f64,
    pub lon: f64,
    pub name: Option<String>,
    /// Whether the node is independently visible (not just way geometry).
    pub display: bool,
    pub user: Option<String>,
    pub timestamp: Option<String>,
    pub tags: TagMap,
}

impl Node {
    /// A bare geometry node at a coordinate.
    pub fn new(id: NodeId, lat: f64, lon: f64) -> Self {
        Self {
            id,
            lat,
            lon,
            name: None,
            display: false,
            user: None,
            timestamp: None,
            tags: TagMap::new(),
        }
    }
}

impl Tagged for Node {
    fn tags(&self) -> &TagMap {
        &self.tags
    }
}

impl HasExtent for Node {
    fn extent(&self) -> BoundingBox {
        BoundingBox::from_point(self.lat, self.lon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_extent_is_point() {
        let node = Node::new(NodeId(1), 48.1, 11.5);
        let extent = node.extent();
        assert_eq!(extent.lat_min, 48.1);
        assert_eq!(extent.lat_max, 48.1);
        assert_eq!(extent.lon_min, 11.5);
        assert_eq!(extent.lon_max, 11.5);
        assert_eq!(extent.area(), 0.0);
    }

    #[test]
    fn test_node_default_flags() {
        let node = Node::new(NodeId(1), 0.0, 0.0);
        assert!(!node.display);
        assert!(node.tags().is_empty());
    }
}

//! Polyline features.

use super::{HasExtent, NodeId, TagMap, Tagged, WayId};
use crate::geohash::BoundingBox;

/// A polyline feature referencing the nodes that give it geometry.
///
/// The node list is already decimated at import time; the extent is
/// computed from the kept nodes and cached here so draw-order sorting and
/// index placement never need to re-resolve geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Way {
    pub id: WayId,
    pub name: Option<String>,
    /// Ordered node references, after decimation.
    pub nodes: Vec<NodeId>,
    pub tags: TagMap,
    /// Set when a tag marks this way as part of a coastline.
    pub coastline: bool,
    pub extent: BoundingBox,
    pub user: Option<String>,
    pub timestamp: Option<String>,
}

impl Way {
    /// Whether the way forms a closed ring.
    pub fn is_closed(&self) -> bool {
        self.nodes.len() > 2 && self.nodes.first() == self.nodes.last()
    }

    /// First node of the polyline, if any.
    pub fn first_node(&self) -> Option<NodeId> {
        self.nodes.first().copied()
    }

    /// Last node of the polyline, if any.
    pub fn last_node(&self) -> Option<NodeId> {
        self.nodes.last().copied()
    }
}

impl Tagged for Way {
    fn tags(&self) -> &TagMap {
        &self.tags
    }
}

impl HasExtent for Way {
    fn extent(&self) -> BoundingBox {
        self.extent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn way_with_nodes(nodes: Vec<i64>) -> Way {
        Way {
            id: WayId(1),
            name: None,
            nodes: nodes.into_iter().map(NodeId).collect(),
            tags: TagMap::new(),
            coastline: false,
            extent: BoundingBox::from_point(0.0, 0.0),
            user: None,
            timestamp: None,
        }
    }

    #[test]
    fn test_closed_ring() {
        assert!(way_with_nodes(vec![1, 2, 3, 1]).is_closed());
        assert!(!way_with_nodes(vec![1, 2, 3]).is_closed());
        // A two-node back-and-forth is not a ring
        assert!(!way_with_nodes(vec![1, 1]).is_closed());
    }

    #[test]
    fn test_endpoints() {
        let way = way_with_nodes(vec![5, 6, 7]);
        assert_eq!(way.first_node(), Some(NodeId(5)));
        assert_eq!(way.last_node(), Some(NodeId(7)));
        assert!(way_with_nodes(vec![]).first_node().is_none());
    }
}

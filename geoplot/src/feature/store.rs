//! Feature record ownership.
//!
//! The store is the single owner of node and way records; everything else
//! (the spatial index, coastline chains, query results) refers to them by
//! handle. Interior mutability keeps the API `&self` so the store can be
//! shared between import tasks and queries.

use std::collections::HashMap;
use std::sync::RwLock;

use super::{FeatureHandle, HasExtent, Node, NodeId, Way, WayId};
use crate::geohash::BoundingBox;

/// A stitched run of coastline ways sharing endpoint nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct CoastlineChain {
    /// Ways in walk order.
    pub ways: Vec<WayId>,
    /// Whether the chain closes back on its starting node.
    pub closed: bool,
}

/// Owner of all node and way records.
pub struct FeatureStore {
    nodes: RwLock<HashMap<NodeId, Node>>,
    ways: RwLock<HashMap<WayId, Way>>,
    coastlines: RwLock<Vec<CoastlineChain>>,
}

impl FeatureStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            nodes: RwLock::new(HashMap::new()),
            ways: RwLock::new(HashMap::new()),
            coastlines: RwLock::new(Vec::new()),
        }
    }

    /// Register a node, replacing any previous record with the same id.
    pub fn insert_node(&self, node: Node) {
        let mut nodes = self.nodes.write().expect("feature store lock poisoned");
        nodes.insert(node.id, node);
    }

    /// A cloned node record, if registered.
    pub fn node(&self, id: NodeId) -> Option<Node> {
        let nodes = self.nodes.read().expect("feature store lock poisoned");
        nodes.get(&id).cloned()
    }

    /// Register a way, replacing any previous record with the same id.
    pub fn insert_way(&self, way: Way) {
        let mut ways = self.ways.write().expect("feature store lock poisoned");
        ways.insert(way.id, way);
    }

    /// A cloned way record, if registered.
    pub fn way(&self, id: WayId) -> Option<Way> {
        let ways = self.ways.read().expect("feature store lock poisoned");
        ways.get(&id).cloned()
    }

    /// Whether a way with this id is already registered.
    pub fn contains_way(&self, id: WayId) -> bool {
        let ways = self.ways.read().expect("feature store lock poisoned");
        ways.contains_key(&id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.read().expect("feature store lock poisoned").len()
    }

    pub fn way_count(&self) -> usize {
        self.ways.read().expect("feature store lock poisoned").len()
    }

    /// Cloned records of every way flagged as coastline.
    pub fn coastline_ways(&self) -> Vec<Way> {
        let ways = self.ways.read().expect("feature store lock poisoned");
        ways.values().filter(|w| w.coastline).cloned().collect()
    }

    /// Replace the stitched coastline aggregate.
    pub fn set_coastlines(&self, chains: Vec<CoastlineChain>) {
        let mut coastlines = self.coastlines.write().expect("feature store lock poisoned");
        *coastlines = chains;
    }

    /// The current stitched coastline chains.
    pub fn coastlines(&self) -> Vec<CoastlineChain> {
        self.coastlines
            .read()
            .expect("feature store lock poisoned")
            .clone()
    }

    /// The extent of the record behind a handle, if registered.
    pub fn extent_of(&self, handle: FeatureHandle) -> Option<BoundingBox> {
        match handle {
            FeatureHandle::Node(id) => self.node(id).map(|n| n.extent()),
            FeatureHandle::Way(id) => self.way(id).map(|w| w.extent()),
        }
    }
}

impl Default for FeatureStore {
    fn default() -> Self {
        Self::new()
    }
}

//! Converting raw payloads into indexed features.
//!
//! Each resolved plot becomes three dependent tasks on the scheduler:
//! parse-nodes, then parse-ways (which needs the nodes registered), then an
//! aggregate refresh (which needs the ways). When the plot belongs to a
//! cell, every task is gated on that cell still being wanted, so work for
//! cells that scrolled off screen before their data arrived is deferred —
//! and eventually reaped — instead of burning the budget.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, trace};

use super::payload::{RawNode, RawPlot, RawWay};
use crate::context::WantedKeys;
use crate::feature::{CoastlineChain, FeatureHandle, FeatureStore, Node, NodeId, TagMap, Way, WayId};
use crate::geohash::{encode, precision_for_extent, BoundingBox, GeohashKey};
use crate::index::SpatialIndex;
use crate::scheduler::{Condition, Task, TaskId, TaskScheduler};

/// Cell precision at which independently visible nodes are indexed: the
/// coarsest level, so they are found from any query via upward lookup.
const DISPLAY_NODE_PRECISION: usize = 1;

/// Importer tuning knobs.
#[derive(Debug, Clone)]
pub struct ImportConfig {
    /// Re-parse ways already registered (mirrors the loader's live mode).
    pub live: bool,

    /// Way-node decimation: keep every Nth node plus first and last. Ways
    /// with at most `2 * simplify` nodes keep everything.
    pub simplify: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            live: false,
            simplify: 1,
        }
    }
}

/// Ids of the three tasks one payload import schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportTasks {
    pub nodes: TaskId,
    pub ways: TaskId,
    pub refresh: TaskId,
}

/// Schedules payload imports and registers the resulting features.
pub struct FeatureImporter {
    store: Arc<FeatureStore>,
    index: Arc<SpatialIndex>,
    wanted: WantedKeys,
    config: ImportConfig,
}

impl FeatureImporter {
    pub fn new(
        store: Arc<FeatureStore>,
        index: Arc<SpatialIndex>,
        wanted: WantedKeys,
        config: ImportConfig,
    ) -> Self {
        Self {
            store,
            index,
            wanted,
            config,
        }
    }

    /// The gate for import tasks of a cell: runs while the cell is wanted.
    /// Imports not tied to a cell always run.
    fn condition_for(&self, key: Option<&GeohashKey>) -> Condition {
        match key {
            Some(key) => {
                let wanted = self.wanted.clone();
                let key = key.clone();
                Condition::predicate(move || wanted.contains(&key))
            }
            None => Condition::Always,
        }
    }

    /// Break a payload into the three dependent import tasks and register
    /// them with the scheduler.
    pub fn schedule(
        &self,
        scheduler: &mut TaskScheduler,
        key: Option<GeohashKey>,
        plot: RawPlot,
    ) -> ImportTasks {
        debug!(
            key = key.as_ref().map(|k| k.as_str()).unwrap_or("-"),
            nodes = plot.osm.node.len(),
            ways = plot.osm.way.len(),
            "scheduling plot import"
        );

        let store = Arc::clone(&self.store);
        let index = Arc::clone(&self.index);
        let node_task = Task::new("parse-nodes", plot.osm.node, move |raw: RawNode| {
            import_node(&store, &index, raw);
        })
        .with_condition(self.condition_for(key.as_ref()));
        let nodes = scheduler.add(node_task);

        let store = Arc::clone(&self.store);
        let index = Arc::clone(&self.index);
        let simplify = self.config.simplify.max(1);
        let live = self.config.live;
        let way_task = Task::new("parse-ways", plot.osm.way, move |raw: RawWay| {
            import_way(&store, &index, simplify, live, raw);
        })
        .with_condition(self.condition_for(key.as_ref()))
        .with_dependencies(vec![nodes]);
        let ways = scheduler.add(way_task);

        let store = Arc::clone(&self.store);
        let refresh_task = Task::new("refresh-aggregates", vec![()], move |_| {
            refresh_coastlines(&store);
        })
        .with_condition(self.condition_for(key.as_ref()))
        .with_dependencies(vec![ways]);
        let refresh = scheduler.add(refresh_task);

        ImportTasks {
            nodes,
            ways,
            refresh,
        }
    }
}

/// Convert one raw node and register it. Display nodes also land in the
/// index at the coarsest precision so they are independently queryable.
fn import_node(store: &FeatureStore, index: &SpatialIndex, raw: RawNode) {
    let node = Node {
        id: NodeId(raw.id),
        lat: raw.lat,
        lon: raw.lon,
        name: raw.name,
        display: raw.display,
        user: raw.user,
        timestamp: raw.timestamp,
        tags: TagMap::new(),
    };

    if node.display {
        index.insert(
            encode(node.lat, node.lon, DISPLAY_NODE_PRECISION),
            FeatureHandle::Node(node.id),
        );
    }
    store.insert_node(node);
}

/// Convert one raw way: resolve node references, decimate, and register
/// into the store and index.
fn import_way(store: &FeatureStore, index: &SpatialIndex, simplify: usize, live: bool, raw: RawWay) {
    let id = WayId(raw.id);
    if !live && store.contains_way(id) {
        trace!(way = %id, "way already registered, skipping");
        return;
    }

    let count = raw.nd.len();
    let mut nodes = Vec::new();
    let mut extent: Option<BoundingBox> = None;
    for (ix, nd) in raw.nd.iter().enumerate() {
        let keep =
            ix % simplify == 0 || ix == 0 || ix + 1 == count || count <= simplify * 2;
        if !keep {
            continue;
        }
        // References to nodes outside this plot resolve to nothing and are
        // dropped from the geometry.
        let Some(node) = store.node(NodeId(nd.node_ref)) else {
            continue;
        };
        match &mut extent {
            Some(bbox) => bbox.expand_to(node.lat, node.lon),
            None => extent = Some(BoundingBox::from_point(node.lat, node.lon)),
        }
        nodes.push(node.id);
    }

    let Some(extent) = extent else {
        trace!(way = %id, "way with no resolvable nodes dropped");
        return;
    };

    let mut tags = TagMap::new();
    let mut coastline = false;
    for tag in raw.tag.as_slice() {
        if tag.v == "coastline" {
            coastline = true;
        }
        tags.insert(tag.k.clone(), tag.v.clone());
    }

    let precision = precision_for_extent(extent.lat_span(), extent.lon_span());
    let (center_lat, center_lon) = extent.center();
    index.insert(
        encode(center_lat, center_lon, precision as usize),
        FeatureHandle::Way(id),
    );

    store.insert_way(Way {
        id,
        name: raw.name,
        nodes,
        tags,
        coastline,
        extent,
        user: raw.user,
        timestamp: raw.timestamp,
    });
}

/// Recompute the coastline aggregate: connect coastline ways sharing
/// endpoint nodes into maximal chains, flagging those that close on
/// themselves.
fn refresh_coastlines(store: &FeatureStore) {
    let ways = store.coastline_ways();

    let mut by_first: HashMap<NodeId, usize> = HashMap::new();
    for (ix, way) in ways.iter().enumerate() {
        if let Some(first) = way.first_node() {
            by_first.entry(first).or_insert(ix);
        }
    }

    // Ways another way continues into; chain walks start elsewhere.
    let continued: HashSet<usize> = ways
        .iter()
        .filter(|w| w.first_node() != w.last_node())
        .filter_map(|w| w.last_node().and_then(|last| by_first.get(&last)).copied())
        .collect();

    let mut used = vec![false; ways.len()];
    let mut chains = Vec::new();

    let walk = |start: usize, used: &mut Vec<bool>| -> CoastlineChain {
        let chain_head = ways[start].first_node();
        let mut chain = Vec::new();
        let mut current = start;
        loop {
            used[current] = true;
            chain.push(ways[current].id);
            match ways[current].last_node().and_then(|last| by_first.get(&last)) {
                Some(&next) if !used[next] => current = next,
                _ => break,
            }
        }
        let tail = ways[current].last_node();
        CoastlineChain {
            closed: tail.is_some()
                && tail == chain_head
                && (chain.len() > 1 || ways[start].is_closed()),
            ways: chain,
        }
    };

    // Chain heads first, then whatever remains forms loops.
    for start in 0..ways.len() {
        if !used[start] && !continued.contains(&start) {
            chains.push(walk(start, &mut used));
        }
    }
    for start in 0..ways.len() {
        if !used[start] {
            chains.push(walk(start, &mut used));
        }
    }

    debug!(ways = ways.len(), chains = chains.len(), "coastlines refreshed");
    store.set_coastlines(chains);
}

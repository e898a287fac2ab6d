//! Raw plot payload wire format.
//!
//! Plots arrive as JSON documents with an `osm` envelope holding raw node
//! and way records. Way tags may be a single object or an array; both are
//! accepted.

use serde::Deserialize;

/// A parsed raw plot document.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPlot {
    pub osm: RawOsm,
}

/// The envelope of raw feature records.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawOsm {
    #[serde(default)]
    pub node: Vec<RawNode>,
    #[serde(default)]
    pub way: Vec<RawWay>,
}

/// One raw point record.
#[derive(Debug, Clone, Deserialize)]
pub struct RawNode {
    pub id: i64,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub name: Option<String>,
    /// Independently visible nodes are flagged by the producer.
    #[serde(default)]
    pub display: bool,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// One raw polyline record.
#[derive(Debug, Clone, Deserialize)]
pub struct RawWay {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    /// Ordered node references.
    #[serde(default)]
    pub nd: Vec<RawNodeRef>,
    #[serde(default)]
    pub tag: RawTags,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Reference to a node by id.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RawNodeRef {
    #[serde(rename = "ref")]
    pub node_ref: i64,
}

/// One key/value tag.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTag {
    pub k: String,
    pub v: String,
}

/// Way tags: the wire format emits an array normally but a bare object
/// when a way has exactly one tag.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawTags {
    Many(Vec<RawTag>),
    One(RawTag),
}

impl RawTags {
    /// The tags as a uniform slice.
    pub fn as_slice(&self) -> &[RawTag] {
        match self {
            RawTags::Many(tags) => tags,
            RawTags::One(tag) => std::slice::from_ref(tag),
        }
    }
}

impl Default for RawTags {
    fn default() -> Self {
        RawTags::Many(Vec::new())
    }
}

/// Parse a raw payload document.
pub fn parse_plot(payload: &[u8]) -> Result<RawPlot, serde_json::Error> {
    serde_json::from_slice(payload)
}

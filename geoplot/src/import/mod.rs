//! Payload parsing and feature import.

mod importer;
mod payload;

pub use importer::{FeatureImporter, ImportConfig, ImportTasks};
pub use payload::{parse_plot, RawNode, RawNodeRef, RawOsm, RawPlot, RawTag, RawTags, RawWay};

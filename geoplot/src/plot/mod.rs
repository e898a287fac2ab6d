//! Plot resolution: cache, durable store, and network loader.
//!
//! A "plot" is the unit of fetch and cache, identified by a geohash key.
//! The [`PlotLoader`] owns the per-key state machine; [`PlotStore`]
//! implementations provide the durable side channel; [`PlotFetcher`]
//! implementations provide the transport.

mod fetch;
mod loader;
mod record;
mod store;

pub use fetch::{FetchError, HttpPlotFetcher, PlotFetcher};
pub use loader::{FetchEvent, LoaderConfig, PayloadSink, PlotLoader};
pub use record::{PlotRecord, PlotState};
pub use store::{DiskPlotStore, MemoryPlotStore, NoOpPlotStore, PlotStore, StoreError};

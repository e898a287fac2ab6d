//! GeoPlot — incremental loading and spatial indexing of map features.
//!
//! The library keeps an interactive viewer fed with geographic features
//! (points and polylines) it can only render a fraction of at once:
//!
//! - [`geohash`] buckets the world into variable-precision grid cells.
//! - [`index`] maps cells to feature handles and expands viewports into
//!   cell sets.
//! - [`plot`] resolves cells to raw payloads through a durable cache and a
//!   deduplicated, timeout-bounded network loader.
//! - [`scheduler`] drains import work in budgeted, round-robin ticks so
//!   the frame loop never stalls.
//! - [`import`] turns raw payloads into typed features via dependent
//!   parse tasks.
//! - [`session`] wires it all to a frame loop.
//!
//! Rendering, styling, input handling, and HTTP routing are external
//! collaborators: the core indexes and queries, nothing more.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use geoplot::config::Config;
//! use geoplot::plot::{DiskPlotStore, HttpPlotFetcher};
//! use geoplot::session::{MapSession, ViewFrame};
//!
//! let fetcher = HttpPlotFetcher::new("https://example.org/api/0.6")?;
//! let store = Arc::new(DiskPlotStore::new("plots")?);
//! let mut session = MapSession::new(Config::default(), fetcher, store)?;
//!
//! // Once per render frame:
//! session.frame(ViewFrame { x, y, zoom, lat, lon, bbox });
//! let features = session.visible_features();
//! ```

pub mod config;
pub mod context;
pub mod feature;
pub mod geohash;
pub mod import;
pub mod index;
pub mod logging;
pub mod plot;
pub mod scheduler;
pub mod session;
pub mod viewport;

/// Version of the GeoPlot library and CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

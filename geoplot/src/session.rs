//! Frame-loop facade over the core subsystems.
//!
//! A [`MapSession`] wires the viewport tracker, plot loader, importer,
//! scheduler, and spatial index together for an embedding viewer. The
//! viewer drives [`MapSession::frame`] once per render frame; everything
//! else — fetch dispatch, event pumping, import ticking — happens inside
//! that call. The session never spawns its own timer or thread beyond the
//! loader's fetch tasks.
//!
//! Control flow per frame:
//!
//! ```text
//! viewport moved? ──► recompute cells ──► update wanted keys ──► request plots
//!        │
//!        └──► pump fetch events ──► schedule imports ──► scheduler.tick()
//! ```

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, warn};

use crate::config::{Config, ConfigError};
use crate::context::WantedKeys;
use crate::feature::{FeatureHandle, FeatureStore};
use crate::geohash::{encode, precision_for_extent, BoundingBox, GeohashKey};
use crate::import::{parse_plot, FeatureImporter, ImportConfig};
use crate::index::{expand_bbox, SpatialIndex};
use crate::plot::{LoaderConfig, PayloadSink, PlotFetcher, PlotLoader, PlotStore};
use crate::scheduler::{SchedulerConfig, TaskScheduler, TickReport};
use crate::viewport::ViewportTracker;

/// Angular span heuristic tying zoom level to cell precision: the span one
/// screen-relevant feature covers at zoom 1.
const ZOOM_EXTENT_FACTOR: f64 = 0.0015;

/// One frame's view, as reported by the embedding viewer.
///
/// `x`, `y`, and `zoom` are the projection's screen-space values and are
/// only compared against previous frames; `lat`/`lon` is the view center
/// and `bbox` the geographic viewport.
#[derive(Debug, Clone, Copy)]
pub struct ViewFrame {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
    pub lat: f64,
    pub lon: f64,
    pub bbox: BoundingBox,
}

/// What one frame did.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameReport {
    /// Whether the visible key set was recomputed.
    pub refreshed: bool,
    /// Plot requests made this frame; repeats are deduplicated inside the
    /// loader.
    pub requested: usize,
    /// Fetch events committed this frame.
    pub pumped: usize,
    /// Scheduler activity this frame.
    pub tick: TickReport,
}

/// Adapter handing resolved payloads to the importer.
///
/// Malformed payloads are dropped with a warning; the plot stays `Loaded`
/// and a retry requires a fresh session or live mode.
struct ImporterSink<'a> {
    importer: &'a FeatureImporter,
    scheduler: &'a mut TaskScheduler,
}

impl PayloadSink for ImporterSink<'_> {
    fn accept(&mut self, key: GeohashKey, payload: Bytes) {
        match parse_plot(&payload) {
            Ok(plot) => {
                self.importer.schedule(self.scheduler, Some(key), plot);
            }
            Err(error) => {
                warn!(key = %key, %error, "malformed plot payload dropped");
            }
        }
    }
}

/// The core's top-level object: owns every subsystem and exposes the
/// queries the rendering collaborator consumes.
pub struct MapSession<F: PlotFetcher + 'static> {
    config: Config,
    store: Arc<FeatureStore>,
    index: Arc<SpatialIndex>,
    wanted: WantedKeys,
    viewport: ViewportTracker,
    loader: PlotLoader<F>,
    importer: FeatureImporter,
    scheduler: TaskScheduler,
    /// Viewport cells at the current precision, from the last refresh.
    current_cells: HashSet<GeohashKey>,
}

impl<F: PlotFetcher + 'static> MapSession<F> {
    /// Build a session over a transport and durable store.
    pub fn new(
        config: Config,
        fetcher: F,
        plot_store: Arc<dyn PlotStore>,
    ) -> Result<Self, ConfigError> {
        let config = config.validate()?;
        let store = Arc::new(FeatureStore::new());
        let index = Arc::new(SpatialIndex::new());
        let wanted = WantedKeys::new();

        let loader = PlotLoader::new(
            fetcher,
            plot_store,
            LoaderConfig {
                live: config.live,
                fetch_timeout: config.fetch_timeout,
            },
        );
        let importer = FeatureImporter::new(
            Arc::clone(&store),
            Arc::clone(&index),
            wanted.clone(),
            ImportConfig {
                live: config.live,
                simplify: config.simplify,
            },
        );
        let scheduler = TaskScheduler::new(SchedulerConfig {
            tick_budget: config.tick_budget,
            max_members_per_tick: None,
            stale_after_ticks: config.stale_after_ticks,
        });

        Ok(Self {
            config,
            store,
            index,
            wanted,
            viewport: ViewportTracker::new(),
            loader,
            importer,
            scheduler,
            current_cells: HashSet::new(),
        })
    }

    /// Drive one frame: refresh the key set if the view moved, resolve
    /// newly visible cells, commit fetch completions, and tick imports.
    ///
    /// Must run inside a tokio runtime (cache misses spawn fetches).
    pub fn frame(&mut self, view: ViewFrame) -> FrameReport {
        let mut report = FrameReport {
            refreshed: self.viewport.should_refresh(view.x, view.y, view.zoom),
            ..FrameReport::default()
        };

        if report.refreshed {
            report.requested = self.refresh_cells(&view);
            self.viewport.mark_refreshed(view.x, view.y, view.zoom);
        }

        let mut sink = ImporterSink {
            importer: &self.importer,
            scheduler: &mut self.scheduler,
        };
        report.pumped = self.loader.pump(&mut sink);
        report.tick = self.scheduler.tick();
        report
    }

    /// Recompute the visible cell set for a view and request its plots.
    /// Returns the number of plot requests issued.
    fn refresh_cells(&mut self, view: &ViewFrame) -> usize {
        let span = ZOOM_EXTENT_FACTOR / view.zoom.max(f64::MIN_POSITIVE);
        let precision = precision_for_extent(span, span).clamp(1, self.config.max_precision);
        let center = encode(view.lat, view.lon, precision as usize);

        let cells = expand_bbox(&center, &view.bbox);

        // The wanted set covers the cells and all their prefixes, so
        // coarse-indexed features and coarse import conditions stay live.
        let mut keys = cells.clone();
        for cell in &cells {
            keys.extend(cell.prefixes());
        }
        debug!(
            center = %center,
            precision,
            cells = cells.len(),
            keys = keys.len(),
            "viewport cells recomputed"
        );

        let mut requested = 0;
        let fetch_precision = self.config.default_precision as usize;
        for key in keys.iter().filter(|k| k.precision() == fetch_precision) {
            let mut sink = ImporterSink {
                importer: &self.importer,
                scheduler: &mut self.scheduler,
            };
            self.loader.request(key, &mut sink);
            requested += 1;
        }

        self.wanted.replace(keys);
        self.current_cells = cells;
        requested
    }

    /// The features visible in the current viewport, larger extents first
    /// so bigger polygons draw below smaller ones.
    pub fn visible_features(&self) -> Vec<FeatureHandle> {
        let store = Arc::clone(&self.store);
        self.visible_features_by(move |a, b| {
            let area = |h: &FeatureHandle| store.extent_of(*h).map(|e| e.area()).unwrap_or(0.0);
            area(b).partial_cmp(&area(a)).unwrap_or(Ordering::Equal)
        })
    }

    /// The features visible in the current viewport, re-sorted by a
    /// caller-supplied ordering.
    ///
    /// Built from the current cell set and every prefix of it: coarse
    /// background features indexed at short keys are included. Handles are
    /// not deduplicated beyond key-level uniqueness.
    pub fn visible_features_by<C>(&self, mut cmp: C) -> Vec<FeatureHandle>
    where
        C: FnMut(&FeatureHandle, &FeatureHandle) -> Ordering,
    {
        let mut keys = self.current_cells.clone();
        for cell in &self.current_cells {
            keys.extend(cell.prefixes());
        }

        let mut handles = Vec::new();
        for key in &keys {
            handles.extend(self.index.lookup(key));
        }
        handles.sort_by(|a, b| cmp(a, b));
        handles
    }

    /// Whether all requested work has settled: no pending fetches and no
    /// scheduled tasks.
    pub fn is_quiescent(&self) -> bool {
        self.scheduler.is_idle() && self.loader.pending_count() == 0
    }

    /// Abort all in-flight fetches.
    pub fn cancel_fetches(&mut self) {
        self.loader.cancel_all();
    }

    /// Force the next frame to recompute the key set.
    pub fn force_refresh(&mut self) {
        self.viewport.force_refresh();
    }

    /// The feature record owner.
    pub fn store(&self) -> &Arc<FeatureStore> {
        &self.store
    }

    /// The spatial index.
    pub fn index(&self) -> &Arc<SpatialIndex> {
        &self.index
    }

    /// The plot loader (state inspection).
    pub fn loader(&self) -> &PlotLoader<F> {
        &self.loader
    }

    /// The import scheduler (progress inspection).
    pub fn scheduler(&self) -> &TaskScheduler {
        &self.scheduler
    }

    /// The cells the current viewport covers.
    pub fn current_cells(&self) -> &HashSet<GeohashKey> {
        &self.current_cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geohash::decode;
    use crate::plot::{FetchError, MemoryPlotStore};

    /// Fetcher returning an empty plot for every cell.
    struct EmptyPlotFetcher;

    impl PlotFetcher for EmptyPlotFetcher {
        async fn fetch(&self, _key: &GeohashKey) -> Result<Bytes, FetchError> {
            Ok(Bytes::from_static(br#"{"osm": {}}"#))
        }
    }

    fn view_at(lat: f64, lon: f64, zoom: f64) -> ViewFrame {
        // A viewport half a precision-6 cell beyond the center cell on
        // every side.
        let center = encode(lat, lon, 6);
        let bbox = decode(&center);
        ViewFrame {
            x: 0.0,
            y: 0.0,
            zoom,
            lat,
            lon,
            bbox: BoundingBox {
                lon_min: bbox.lon_min - bbox.lon_span() / 2.0,
                lat_min: bbox.lat_min - bbox.lat_span() / 2.0,
                lon_max: bbox.lon_max + bbox.lon_span() / 2.0,
                lat_max: bbox.lat_max + bbox.lat_span() / 2.0,
            },
        }
    }

    #[tokio::test]
    async fn test_first_frame_requests_viewport_plots() {
        let mut session = MapSession::new(
            Config::default(),
            EmptyPlotFetcher,
            Arc::new(MemoryPlotStore::new()),
        )
        .unwrap();

        let report = session.frame(view_at(48.1173, 11.5167, 1.0));
        assert!(report.refreshed);
        assert_eq!(report.requested, 9, "center plus eight neighbors");
        assert_eq!(session.current_cells().len(), 9);
    }

    #[tokio::test]
    async fn test_static_view_does_not_refetch() {
        let mut session = MapSession::new(
            Config::default(),
            EmptyPlotFetcher,
            Arc::new(MemoryPlotStore::new()),
        )
        .unwrap();

        let view = view_at(48.1173, 11.5167, 1.0);
        session.frame(view);
        let report = session.frame(view);

        assert!(!report.refreshed);
        assert_eq!(report.requested, 0);
    }

    #[tokio::test]
    async fn test_refresh_after_big_pan_dedups_requests() {
        let mut session = MapSession::new(
            Config::default(),
            EmptyPlotFetcher,
            Arc::new(MemoryPlotStore::new()),
        )
        .unwrap();

        let mut view = view_at(48.1173, 11.5167, 1.0);
        session.frame(view);

        // Pan far in screen space but keep the same geographic viewport:
        // the key set is recomputed, yet every cell is already requested.
        view.x = 500.0;
        let report = session.frame(view);
        assert!(report.refreshed);
        assert_eq!(report.requested, 9);
        assert_eq!(session.loader().pending_count(), 9);
    }

    #[tokio::test]
    async fn test_wanted_keys_include_prefixes() {
        let mut session = MapSession::new(
            Config::default(),
            EmptyPlotFetcher,
            Arc::new(MemoryPlotStore::new()),
        )
        .unwrap();
        session.frame(view_at(48.1173, 11.5167, 1.0));

        let center = encode(48.1173, 11.5167, 6);
        assert!(session.wanted.contains(&center));
        for prefix in center.prefixes() {
            assert!(session.wanted.contains(&prefix), "missing {}", prefix);
        }
    }
}

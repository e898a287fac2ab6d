//! Integration tests for the full session pipeline.
//!
//! These tests verify the complete flow: viewport expansion, plot
//! resolution through cache and transport, scheduled imports, and the
//! visible-feature query the rendering collaborator consumes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use geoplot::config::Config;
use geoplot::geohash::{decode, encode, BoundingBox, GeohashKey};
use geoplot::plot::{FetchError, MemoryPlotStore, PlotFetcher, PlotState, PlotStore};
use geoplot::session::{MapSession, ViewFrame};

// =============================================================================
// Test Helpers
// =============================================================================

/// Every cell resolves to the same two nodes and one way connecting them.
/// The node spread puts the way's extent in the precision-6 bucket, so it
/// indexes into the viewport's own cell set.
const PLOT_PAYLOAD: &[u8] = br#"{
    "osm": {
        "node": [
            {"id": 1, "lat": 48.116, "lon": 11.514},
            {"id": 2, "lat": 48.119, "lon": 11.518}
        ],
        "way": [
            {"id": 10, "nd": [{"ref": 1}, {"ref": 2}],
             "tag": [{"k": "highway", "v": "residential"}]}
        ]
    }
}"#;

/// Fetcher that counts calls and serves the fixed payload.
struct SyntheticFetcher {
    calls: Arc<AtomicUsize>,
}

impl PlotFetcher for SyntheticFetcher {
    async fn fetch(&self, _key: &GeohashKey) -> Result<Bytes, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Bytes::from_static(PLOT_PAYLOAD))
    }
}

/// A view whose geographic viewport covers the center precision-6 cell
/// plus half of each neighbor: exactly nine cells intersect it.
fn nine_cell_view(lat: f64, lon: f64) -> ViewFrame {
    let center = encode(lat, lon, 6);
    let bbox = decode(&center);
    ViewFrame {
        x: 0.0,
        y: 0.0,
        zoom: 1.0,
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

/// Drive frames until all fetches and imports settle.
async fn drive_until_quiescent<F: PlotFetcher + 'static>(
    session: &mut MapSession<F>,
    view: ViewFrame,
) {
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(10)).await;
        session.frame(view);
        if session.is_quiescent() {
            return;
        }
    }
    panic!("session did not settle");
}

// =============================================================================
// End-to-end scenario
// =============================================================================

#[tokio::test]
async fn test_viewport_to_visible_features() {
    let calls = Arc::new(AtomicUsize::new(0));
    let store = Arc::new(MemoryPlotStore::new());
    let mut session = MapSession::new(
        Config::default(),
        SyntheticFetcher {
            calls: Arc::clone(&calls),
        },
        Arc::clone(&store) as Arc<dyn PlotStore>,
    )
    .unwrap();

    let view = nine_cell_view(48.1173, 11.5167);
    let report = session.frame(view);

    // Exactly the nine-cell footprint was requested.
    assert!(report.refreshed);
    assert_eq!(report.requested, 9);
    assert_eq!(session.current_cells().len(), 9);

    drive_until_quiescent(&mut session, view).await;

    // One fetch per cell, no more.
    assert_eq!(calls.load(Ordering::SeqCst), 9);
    assert_eq!(session.loader().loaded_count(), 9);

    // Every payload was persisted for the next session.
    assert_eq!(store.len(), 9);

    // All nine plots parsed, but the shared way registered once and the
    // shared nodes are not independently visible: exactly one Way handle.
    assert_eq!(session.store().node_count(), 2);
    assert_eq!(session.store().way_count(), 1);

    let visible = session.visible_features();
    assert_eq!(visible.len(), 1);
    assert!(visible[0].is_way());
}

#[tokio::test]
async fn test_warm_start_avoids_network() {
    let calls = Arc::new(AtomicUsize::new(0));
    let store = Arc::new(MemoryPlotStore::new());

    // First session populates the durable store.
    {
        let mut session = MapSession::new(
            Config::default(),
            SyntheticFetcher {
                calls: Arc::clone(&calls),
            },
            Arc::clone(&store) as Arc<dyn PlotStore>,
        )
        .unwrap();
        let view = nine_cell_view(48.1173, 11.5167);
        session.frame(view);
        drive_until_quiescent(&mut session, view).await;
    }
    assert_eq!(calls.load(Ordering::SeqCst), 9);

    // Second session over the same store: everything resolves from cache.
    let mut session = MapSession::new(
        Config::default(),
        SyntheticFetcher {
            calls: Arc::clone(&calls),
        },
        Arc::clone(&store) as Arc<dyn PlotStore>,
    )
    .unwrap();
    let view = nine_cell_view(48.1173, 11.5167);
    session.frame(view);
    drive_until_quiescent(&mut session, view).await;

    assert_eq!(calls.load(Ordering::SeqCst), 9, "warm start must not fetch");
    assert_eq!(session.store().way_count(), 1);
    assert_eq!(session.visible_features().len(), 1);
}

#[tokio::test]
async fn test_live_mode_refetches_despite_cache() {
    let calls = Arc::new(AtomicUsize::new(0));
    let store = Arc::new(MemoryPlotStore::new());

    // Pre-populate the store for one of the cells.
    let center = encode(48.1173, 11.5167, 6);
    store.put(&center, Bytes::from_static(PLOT_PAYLOAD)).unwrap();

    let mut session = MapSession::new(
        Config {
            live: true,
            ..Config::default()
        },
        SyntheticFetcher {
            calls: Arc::clone(&calls),
        },
        Arc::clone(&store) as Arc<dyn PlotStore>,
    )
    .unwrap();

    let view = nine_cell_view(48.1173, 11.5167);
    session.frame(view);
    drive_until_quiescent(&mut session, view).await;

    assert_eq!(calls.load(Ordering::SeqCst), 9, "live mode ignores the cache");
}

// =============================================================================
// Failure handling
// =============================================================================

/// Fetcher that always reports a network failure.
struct FailingFetcher;

impl PlotFetcher for FailingFetcher {
    async fn fetch(&self, _key: &GeohashKey) -> Result<Bytes, FetchError> {
        Err(FetchError::Http("HTTP 502".into()))
    }
}

#[tokio::test]
async fn test_failed_cells_render_nothing_and_stay_retryable() {
    let mut session = MapSession::new(
        Config::default(),
        FailingFetcher,
        Arc::new(MemoryPlotStore::new()),
    )
    .unwrap();

    let view = nine_cell_view(48.1173, 11.5167);
    session.frame(view);
    drive_until_quiescent(&mut session, view).await;

    assert_eq!(session.loader().failed_count(), 9);
    assert!(session.visible_features().is_empty());

    // Failure is not fatal and not sticky: a forced refresh issues fresh
    // requests for the failed cells.
    session.force_refresh();
    let report = session.frame(view);
    assert_eq!(report.requested, 9);
    assert_eq!(session.loader().pending_count(), 9);

    let center = encode(48.1173, 11.5167, 6);
    assert_eq!(session.loader().state(&center), Some(PlotState::Pending));
}

// =============================================================================
// Abandoned imports
// =============================================================================

/// Fetcher that serves the feature payload for a chosen cell set, after a
/// short delay, and empty plots elsewhere.
struct SlowFetcher {
    delay: Duration,
    feature_cells: std::collections::HashSet<GeohashKey>,
}

impl PlotFetcher for SlowFetcher {
    async fn fetch(&self, key: &GeohashKey) -> Result<Bytes, FetchError> {
        tokio::time::sleep(self.delay).await;
        if self.feature_cells.contains(key) {
            Ok(Bytes::from_static(PLOT_PAYLOAD))
        } else {
            Ok(Bytes::from_static(br#"{"osm": {}}"#))
        }
    }
}

#[tokio::test]
async fn test_imports_for_scrolled_away_cells_are_reaped() {
    // Only the first location's nine cells carry features.
    let first_center = encode(48.1173, 11.5167, 6);
    let mut feature_cells: std::collections::HashSet<GeohashKey> =
        geoplot::geohash::neighbors8(&first_center).into_iter().collect();
    feature_cells.insert(first_center);

    let mut session = MapSession::new(
        Config {
            stale_after_ticks: Some(3),
            ..Config::default()
        },
        SlowFetcher {
            delay: Duration::from_millis(30),
            feature_cells,
        },
        Arc::new(MemoryPlotStore::new()),
    )
    .unwrap();

    // Request cells around the first location, then scroll far away
    // before the data arrives.
    let first = nine_cell_view(48.1173, 11.5167);
    session.frame(first);

    let mut second = nine_cell_view(-33.8688, 151.2093);
    second.x = 10_000.0;
    session.frame(second);

    // The first location's payloads arrive and get scheduled, but their
    // cells are no longer wanted: the import tasks park, then get reaped.
    tokio::time::sleep(Duration::from_millis(80)).await;
    for _ in 0..10 {
        session.frame(second);
        tokio::time::sleep(Duration::from_millis(5)).await;
        if session.is_quiescent() {
            break;
        }
    }

    // No first-location features were imported, and nothing is left
    // ticking forever.
    assert_eq!(session.store().node_count(), 0);
    assert!(session.scheduler().is_idle());
}

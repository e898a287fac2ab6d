//! GeoPlot CLI — fetch-and-import smoke tool.
//!
//! Resolves the nine-cell neighborhood around a coordinate through the
//! full pipeline (durable cache, network loader, scheduled imports) and
//! reports what landed in the index.

mod error;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use error::CliError;
use geoplot::config::Config;
use geoplot::geohash::{decode, encode, BoundingBox};
use geoplot::logging::init_logging;
use geoplot::plot::{DiskPlotStore, HttpPlotFetcher};
use geoplot::session::{MapSession, ViewFrame};

#[derive(Parser)]
#[command(name = "geoplot")]
#[command(about = "Resolve and index map features around a coordinate", long_about = None)]
struct Args {
    /// Latitude in decimal degrees
    #[arg(long)]
    lat: f64,

    /// Longitude in decimal degrees
    #[arg(long)]
    lon: f64,

    /// Base URL of the plot server (serves /geohash/<key>.json)
    #[arg(long)]
    url: String,

    /// Directory for the durable plot cache
    #[arg(long, default_value = ".geoplot/plots")]
    cache_dir: String,

    /// Re-fetch every plot even when cached
    #[arg(long)]
    live: bool,

    /// Way-node decimation factor (keep every Nth node plus endpoints)
    #[arg(long, default_value = "1")]
    simplify: usize,

    /// Network fetch timeout in seconds
    #[arg(long, default_value = "120")]
    timeout_secs: u64,

    /// Give up after this many frames
    #[arg(long, default_value = "500")]
    max_frames: usize,
}

/// A viewport covering the center fetch-precision cell plus half of each
/// neighbor: the nine-cell footprint.
fn nine_cell_view(lat: f64, lon: f64, precision: u8) -> ViewFrame {
    let bbox = decode(&encode(lat, lon, precision as usize));
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

async fn run(args: Args) -> Result<(), CliError> {
    let config = Config {
        live: args.live,
        simplify: args.simplify,
        fetch_timeout: Duration::from_secs(args.timeout_secs),
        ..Config::default()
    };

    let fetcher = HttpPlotFetcher::new(&args.url).map_err(CliError::Transport)?;
    let store = Arc::new(DiskPlotStore::new(&args.cache_dir).map_err(CliError::Store)?);
    let precision = config.default_precision;
    let mut session = MapSession::new(config, fetcher, store).map_err(CliError::Config)?;

    let view = nine_cell_view(args.lat, args.lon, precision);
    info!(lat = args.lat, lon = args.lon, url = %args.url, "resolving viewport");

    let mut frames = 0;
    loop {
        let report = session.frame(view);
        frames += 1;
        if report.refreshed {
            info!(requested = report.requested, "viewport cells requested");
        }
        if session.is_quiescent() {
            break;
        }
        if frames >= args.max_frames {
            session.cancel_fetches();
            return Err(CliError::DidNotSettle { frames });
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let visible = session.visible_features();
    println!("Settled after {} frames", frames);
    println!(
        "Plots: {} loaded, {} failed",
        session.loader().loaded_count(),
        session.loader().failed_count()
    );
    println!(
        "Features: {} nodes, {} ways ({} indexed cells)",
        session.store().node_count(),
        session.store().way_count(),
        session.index().key_count()
    );
    println!("Visible in viewport: {} features", visible.len());
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let _guard = match init_logging("logs", "geoplot.log") {
        Ok(guard) => guard,
        Err(e) => CliError::LoggingInit(e).exit(),
    };

    if let Err(e) = run(args).await {
        e.exit();
    }
}

//! Plot cache and loader.
//!
//! Owns the per-key load state table and resolves cells to payloads:
//! durable store first, network second, with deduplication of repeat
//! requests both within the session (the state table) and across sessions
//! (the durable store).
//!
//! # Event flow
//!
//! Fetches are spawned tasks that report completion as typed [`FetchEvent`]s
//! over a channel; nothing mutates loader state from a callback. The owner
//! drains events with [`PlotLoader::pump`] on the cooperative loop, and each
//! event commits fully (store write, state transition, importer hand-off)
//! before the next is examined. An event for a key that is no longer
//! `Pending` is stale (the fetch already timed out or was superseded) and is
//! ignored.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use super::fetch::{FetchError, PlotFetcher};
use super::record::{PlotRecord, PlotState};
use super::store::PlotStore;
use crate::geohash::GeohashKey;

/// Completion notification from a spawned fetch.
#[derive(Debug)]
pub enum FetchEvent {
    Completed { key: GeohashKey, payload: Bytes },
    Failed { key: GeohashKey, error: FetchError },
}

/// Consumer of resolved plot payloads.
///
/// Implemented by the feature importer; kept as a trait so loader tests can
/// observe hand-offs without an importer.
pub trait PayloadSink {
    /// Take ownership of a resolved payload for a cell.
    fn accept(&mut self, key: GeohashKey, payload: Bytes);
}

/// Loader tuning knobs.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Skip durable-store reads so every request re-fetches. Writes still
    /// happen, keeping the store warm for later sessions.
    pub live: bool,

    /// Bound on each network fetch; expiry aborts the in-flight operation.
    pub fetch_timeout: Duration,
}

impl LoaderConfig {
    /// Default fetch bound.
    pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(120);
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            live: false,
            fetch_timeout: Self::DEFAULT_FETCH_TIMEOUT,
        }
    }
}

/// Session-scoped plot resolution with dedup, durable caching, timeouts,
/// and cancellation.
pub struct PlotLoader<F: PlotFetcher + 'static> {
    fetcher: Arc<F>,
    store: Arc<dyn PlotStore>,
    config: LoaderConfig,
    states: HashMap<GeohashKey, PlotState>,
    inflight: HashMap<GeohashKey, CancellationToken>,
    events_tx: mpsc::UnboundedSender<FetchEvent>,
    events_rx: mpsc::UnboundedReceiver<FetchEvent>,
}

impl<F: PlotFetcher + 'static> PlotLoader<F> {
    pub fn new(fetcher: F, store: Arc<dyn PlotStore>, config: LoaderConfig) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            fetcher: Arc::new(fetcher),
            store,
            config,
            states: HashMap::new(),
            inflight: HashMap::new(),
            events_tx,
            events_rx,
        }
    }

    /// Resolve a cell, deduplicating repeat requests.
    ///
    /// - Already `Pending` or `Loaded`: no-op; the caller is not re-notified.
    /// - `Failed`: treated as a fresh request (explicit retry).
    /// - Otherwise: durable store hit resolves synchronously through `sink`;
    ///   a miss spawns a bounded network fetch and marks the key `Pending`.
    ///
    /// Must run inside a tokio runtime: cache misses spawn the fetch task.
    pub fn request(&mut self, key: &GeohashKey, sink: &mut dyn PayloadSink) {
        match self.states.get(key) {
            Some(PlotState::Pending) | Some(PlotState::Loaded) => {
                trace!(key = %key, "plot request deduplicated");
                return;
            }
            Some(PlotState::Failed) => {
                debug!(key = %key, "retrying failed plot");
            }
            None => {}
        }

        if !self.config.live {
            if let Some(payload) = self.store.get(key) {
                debug!(key = %key, bytes = payload.len(), "plot resolved from durable store");
                self.states.insert(key.clone(), PlotState::Loaded);
                sink.accept(key.clone(), payload);
                return;
            }
        }

        self.spawn_fetch(key.clone());
        self.states.insert(key.clone(), PlotState::Pending);
    }

    fn spawn_fetch(&mut self, key: GeohashKey) {
        debug!(key = %key, "plot fetch dispatched");
        let token = CancellationToken::new();
        self.inflight.insert(key.clone(), token.clone());

        let fetcher = Arc::clone(&self.fetcher);
        let events = self.events_tx.clone();
        let timeout = self.config.fetch_timeout;

        tokio::spawn(async move {
            let outcome = tokio::select! {
                _ = token.cancelled() => Err(FetchError::Cancelled),
                fetched = tokio::time::timeout(timeout, fetcher.fetch(&key)) => {
                    match fetched {
                        Ok(result) => result,
                        // The timeout drops the fetch future, so no late
                        // completion can ever race this failure.
                        Err(_) => Err(FetchError::Timeout(timeout)),
                    }
                }
            };

            let event = match outcome {
                Ok(payload) => FetchEvent::Completed { key, payload },
                Err(error) => FetchEvent::Failed { key, error },
            };
            // The receiver only closes when the loader is dropped.
            let _ = events.send(event);
        });
    }

    /// Drain completed fetch events, committing each one fully before the
    /// next. Returns the number of events handled.
    pub fn pump(&mut self, sink: &mut dyn PayloadSink) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            handled += 1;
            match event {
                FetchEvent::Completed { key, payload } => {
                    if self.states.get(&key) != Some(&PlotState::Pending) {
                        trace!(key = %key, "stale fetch completion ignored");
                        continue;
                    }
                    if let Err(error) = self.store.put(&key, payload.clone()) {
                        // Persistence is best-effort; the session still has
                        // the payload.
                        warn!(key = %key, %error, "durable store write failed");
                    }
                    self.states.insert(key.clone(), PlotState::Loaded);
                    self.inflight.remove(&key);
                    debug!(key = %key, bytes = payload.len(), "plot loaded");
                    sink.accept(key, payload);
                }
                FetchEvent::Failed { key, error } => {
                    if self.states.get(&key) != Some(&PlotState::Pending) {
                        trace!(key = %key, "stale fetch failure ignored");
                        continue;
                    }
                    self.states.insert(key.clone(), PlotState::Failed);
                    self.inflight.remove(&key);
                    warn!(key = %key, %error, "plot fetch failed");
                }
            }
        }
        handled
    }

    /// Abort every in-flight fetch. Their records settle to `Failed` once
    /// the cancellation events are pumped.
    pub fn cancel_all(&mut self) {
        for (key, token) in self.inflight.drain() {
            debug!(key = %key, "cancelling in-flight fetch");
            token.cancel();
        }
    }

    /// The load state of a key, if it was ever requested this session.
    pub fn state(&self, key: &GeohashKey) -> Option<PlotState> {
        self.states.get(key).copied()
    }

    /// The full record of a key, if it was ever requested this session.
    pub fn record(&self, key: &GeohashKey) -> Option<PlotRecord> {
        self.states.get(key).map(|&state| PlotRecord {
            key: key.clone(),
            state,
        })
    }

    /// Keys currently awaiting a fetch.
    pub fn pending_count(&self) -> usize {
        self.states
            .values()
            .filter(|&&s| s == PlotState::Pending)
            .count()
    }

    /// Keys resolved this session.
    pub fn loaded_count(&self) -> usize {
        self.states
            .values()
            .filter(|&&s| s == PlotState::Loaded)
            .count()
    }

    /// Keys whose last fetch failed and await an explicit retry.
    pub fn failed_count(&self) -> usize {
        self.states
            .values()
            .filter(|&&s| s == PlotState::Failed)
            .count()
    }
}

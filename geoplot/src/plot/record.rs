//! Per-plot load state.

use crate::geohash::GeohashKey;

/// Load state of one requested plot.
///
/// Lifecycle: a key is `Unrequested` until its first [`request`]; the
/// request either resolves synchronously from the durable store (`Loaded`)
/// or goes `Pending` behind a network fetch, which settles it to `Loaded`
/// or `Failed`. A `Failed` key is only retried by a fresh request, which
/// starts a new `Pending` cycle; nothing resurrects the old record.
///
/// [`request`]: super::PlotLoader::request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotState {
    /// Fetch in flight.
    Pending,
    /// Payload fetched (or found in the durable store) and handed to the
    /// importer.
    Loaded,
    /// Fetch timed out or errored; waiting for an explicit retry.
    Failed,
}

/// A key together with its load state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlotRecord {
    pub key: GeohashKey,
    pub state: PlotState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_equality() {
        let key = GeohashKey::new("u0cg2").unwrap();
        let a = PlotRecord {
            key: key.clone(),
            state: PlotState::Pending,
        };
        let b = PlotRecord {
            key,
            state: PlotState::Pending,
        };
        assert_eq!(a, b);
        assert_ne!(a.state, PlotState::Failed);
    }
}

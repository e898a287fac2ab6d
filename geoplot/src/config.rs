//! Runtime configuration surface.

use std::time::Duration;

use thiserror::Error;

use crate::geohash::MAX_PRECISION;

/// Configuration errors raised at construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("simplify must be at least 1, got {0}")]
    InvalidSimplify(usize),

    #[error("precision {0} out of range 1..={max}", max = MAX_PRECISION)]
    InvalidPrecision(u8),

    #[error("default precision {default} exceeds max precision {max}")]
    PrecisionOrder { default: u8, max: u8 },
}

/// Session configuration consumed from outside the core.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Disable durable-cache reads so every request re-fetches. Writes
    /// still happen.
    pub live: bool,

    /// Way-node decimation factor: keep every Nth node plus endpoints.
    pub simplify: usize,

    /// Bound on each network fetch.
    pub fetch_timeout: Duration,

    /// Wall-clock budget per scheduler tick.
    pub tick_budget: Duration,

    /// Key length plots are fetched at.
    pub default_precision: u8,

    /// Finest key length the viewport will compute cells at.
    pub max_precision: u8,

    /// Ticks of failed condition after which an import task is reaped;
    /// `None` keeps abandoned imports parked forever.
    pub stale_after_ticks: Option<u32>,
}

impl Config {
    /// Default network fetch bound.
    pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(120);

    /// Default scheduler tick budget.
    pub const DEFAULT_TICK_BUDGET: Duration = Duration::from_millis(50);

    /// Default plot fetch precision.
    pub const DEFAULT_PRECISION: u8 = 6;

    /// Default operational precision cap. The hard grid limit is 12, but
    /// viewport cells beyond this stay practical to fetch and index.
    pub const DEFAULT_MAX_PRECISION: u8 = 8;

    /// Check invariants, returning the config for chaining.
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.simplify < 1 {
            return Err(ConfigError::InvalidSimplify(self.simplify));
        }
        for precision in [self.default_precision, self.max_precision] {
            if precision < 1 || precision as usize > MAX_PRECISION {
                return Err(ConfigError::InvalidPrecision(precision));
            }
        }
        if self.default_precision > self.max_precision {
            return Err(ConfigError::PrecisionOrder {
                default: self.default_precision,
                max: self.max_precision,
            });
        }
        Ok(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            live: false,
            simplify: 1,
            fetch_timeout: Self::DEFAULT_FETCH_TIMEOUT,
            tick_budget: Self::DEFAULT_TICK_BUDGET,
            default_precision: Self::DEFAULT_PRECISION,
            max_precision: Self::DEFAULT_MAX_PRECISION,
            stale_after_ticks: Some(600),
        }
    }
}

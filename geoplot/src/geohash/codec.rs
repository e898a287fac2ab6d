//! Base-32 geohash encoding and decoding.
//!
//! A geohash key names a rectangular grid cell by interleaving longitude and
//! latitude range halvings into a base-32 string. Any prefix of a valid key
//! is itself a valid key for a coarser cell that contains the finer one.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// The geohash base-32 alphabet (digits plus lowercase letters, minus
/// `a`, `i`, `l`, `o`).
pub const BASE32: &[u8; 32] = b"0123456789bcdefghjkmnpqrstuvwxyz";

/// Shortest allowed key length (coarsest cell).
pub const MIN_PRECISION: usize = 1;

/// Longest allowed key length (finest cell).
pub const MAX_PRECISION: usize = 12;

/// Bit masks for the five bits of one base-32 character, high bit first.
const BITS: [u32; 5] = [16, 8, 4, 2, 1];

/// Geohash-level errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeohashError {
    /// A truncation or key length outside the valid range was requested.
    #[error("invalid precision {requested} for key of length {len}")]
    InvalidPrecision { requested: usize, len: usize },

    /// A key string contained characters outside the base-32 alphabet, or
    /// had an out-of-range length.
    #[error("invalid geohash key {0:?}")]
    InvalidKey(String),
}

/// A validated geohash key.
///
/// Invariants: 1 to 12 characters, all from [`BASE32`]. Shorter keys name
/// coarser cells; every strict prefix of a key covers a superset of its area.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeohashKey(String);

impl GeohashKey {
    /// Validate and wrap a key string.
    pub fn new(key: impl Into<String>) -> Result<Self, GeohashError> {
        let key = key.into();
        if key.is_empty() || key.len() > MAX_PRECISION {
            return Err(GeohashError::InvalidKey(key));
        }
        if !key.bytes().all(|b| BASE32.contains(&b)) {
            return Err(GeohashError::InvalidKey(key));
        }
        Ok(Self(key))
    }

    /// Wrap a string already known to satisfy the key invariants.
    pub(crate) fn from_validated(key: String) -> Self {
        debug_assert!(!key.is_empty() && key.len() <= MAX_PRECISION);
        Self(key)
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The key length, which doubles as its precision level.
    pub fn precision(&self) -> usize {
        self.0.len()
    }

    /// The first `n` characters as a new key.
    ///
    /// Fails with [`GeohashError::InvalidPrecision`] when `n` is zero or
    /// exceeds the key length.
    pub fn truncate(&self, n: usize) -> Result<GeohashKey, GeohashError> {
        if n < MIN_PRECISION || n > self.0.len() {
            return Err(GeohashError::InvalidPrecision {
                requested: n,
                len: self.0.len(),
            });
        }
        Ok(Self(self.0[..n].to_string()))
    }

    /// Iterate the strict prefixes of this key, longest first.
    ///
    /// A key of length 1 yields nothing.
    pub fn prefixes(&self) -> impl Iterator<Item = GeohashKey> + '_ {
        (MIN_PRECISION..self.0.len())
            .rev()
            .map(move |n| Self(self.0[..n].to_string()))
    }
}

impl fmt::Display for GeohashKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for GeohashKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GeohashKey({})", self.0)
    }
}

impl FromStr for GeohashKey {
    type Err = GeohashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// A geographic rectangle in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub lon_min: f64,
    pub lat_min: f64,
    pub lon_max: f64,
    pub lat_max: f64,
}

impl BoundingBox {
    /// A degenerate box containing a single point.
    pub fn from_point(lat: f64, lon: f64) -> Self {
        Self {
            lon_min: lon,
            lat_min: lat,
            lon_max: lon,
            lat_max: lat,
        }
    }

    /// Whether the point lies inside this box (edges inclusive).
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.lat_min && lat <= self.lat_max && lon >= self.lon_min && lon <= self.lon_max
    }

    /// Whether the two boxes share any area (edge contact counts).
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.lon_min <= other.lon_max
            && self.lon_max >= other.lon_min
            && self.lat_min <= other.lat_max
            && self.lat_max >= other.lat_min
    }

    /// Grow the box to include the point.
    pub fn expand_to(&mut self, lat: f64, lon: f64) {
        self.lat_min = self.lat_min.min(lat);
        self.lat_max = self.lat_max.max(lat);
        self.lon_min = self.lon_min.min(lon);
        self.lon_max = self.lon_max.max(lon);
    }

    /// Height in degrees of latitude.
    pub fn lat_span(&self) -> f64 {
        self.lat_max - self.lat_min
    }

    /// Width in degrees of longitude.
    pub fn lon_span(&self) -> f64 {
        self.lon_max - self.lon_min
    }

    /// Midpoint as `(lat, lon)`.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.lat_min + self.lat_max) / 2.0,
            (self.lon_min + self.lon_max) / 2.0,
        )
    }

    /// Area in square degrees. A rough draw-order metric, not a surface area.
    pub fn area(&self) -> f64 {
        self.lat_span() * self.lon_span()
    }
}

/// Encode a coordinate into the geohash cell containing it.
///
/// Deterministic: equal inputs always produce equal keys, and a longer
/// precision produces a key prefixed by every shorter encoding of the same
/// point. `precision` is clamped into 1..=12.
pub fn encode(lat: f64, lon: f64, precision: usize) -> GeohashKey {
    let precision = precision.clamp(MIN_PRECISION, MAX_PRECISION);

    let (mut lat_min, mut lat_max) = (-90.0_f64, 90.0_f64);
    let (mut lon_min, mut lon_max) = (-180.0_f64, 180.0_f64);

    let mut key = String::with_capacity(precision);
    let mut even_bit = true;
    let mut bit = 0;
    let mut ch: u32 = 0;

    while key.len() < precision {
        if even_bit {
            let mid = (lon_min + lon_max) / 2.0;
            if lon >= mid {
                ch |= BITS[bit];
                lon_min = mid;
            } else {
                lon_max = mid;
            }
        } else {
            let mid = (lat_min + lat_max) / 2.0;
            if lat >= mid {
                ch |= BITS[bit];
                lat_min = mid;
            } else {
                lat_max = mid;
            }
        }
        even_bit = !even_bit;

        if bit < 4 {
            bit += 1;
        } else {
            key.push(BASE32[ch as usize] as char);
            bit = 0;
            ch = 0;
        }
    }

    GeohashKey::from_validated(key)
}

/// Decode a key into the bounding box of its grid cell.
///
/// Exact inverse of the encoding partition: `decode(encode(lat, lon, p))`
/// always contains `(lat, lon)`.
pub fn decode(key: &GeohashKey) -> BoundingBox {
    let (mut lat_min, mut lat_max) = (-90.0_f64, 90.0_f64);
    let (mut lon_min, mut lon_max) = (-180.0_f64, 180.0_f64);

    let mut even_bit = true;
    for b in key.as_str().bytes() {
        // Position in the alphabet is the five-bit cell refinement.
        let ch = BASE32.iter().position(|&c| c == b).unwrap_or(0) as u32;
        for mask in BITS {
            if even_bit {
                let mid = (lon_min + lon_max) / 2.0;
                if ch & mask != 0 {
                    lon_min = mid;
                } else {
                    lon_max = mid;
                }
            } else {
                let mid = (lat_min + lat_max) / 2.0;
                if ch & mask != 0 {
                    lat_min = mid;
                } else {
                    lat_max = mid;
                }
            }
            even_bit = !even_bit;
        }
    }

    BoundingBox {
        lon_min,
        lat_min,
        lon_max,
        lat_max,
    }
}

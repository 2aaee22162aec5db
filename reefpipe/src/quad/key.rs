//! Quad grid coordinates and label parsing.

use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

/// Errors from parsing or constructing quad keys.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuadKeyError {
    /// Label does not match the `L{zoom}-{x}E-{y}N` pattern
    #[error("'{0}' is not a valid quad label")]
    InvalidLabel(String),

    /// Index exceeds the grid extent for the zoom level
    #[error("quad index ({x}, {y}) out of range for zoom {zoom}")]
    IndexOutOfRange { zoom: u8, x: u32, y: u32 },
}

/// Identity of one quad on the global imagery grid.
///
/// Rendered as a label of the form `L15-0331E-1257N`: zoom level, easting
/// index (tiles east of the antimeridian) and northing index (tiles north
/// of the southern grid edge). The label uniquely determines the quad's
/// geographic footprint at a fixed tiling scheme.
///
/// # Example
///
/// ```
/// use reefpipe::quad::QuadKey;
///
/// let key: QuadKey = "L15-0331E-1257N".parse().unwrap();
/// assert_eq!(key.zoom(), 15);
/// assert_eq!(key.x(), 331);
/// assert_eq!(key.y(), 1257);
/// assert_eq!(key.label(), "L15-0331E-1257N");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuadKey {
    /// Zoom level of the tiling scheme
    zoom: u8,
    /// Easting tile index
    x: u32,
    /// Northing tile index
    y: u32,
}

fn label_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^L(\d{1,2})-(\d{4,10})E-(\d{4,10})N$").expect("valid regex"))
}

impl QuadKey {
    /// Create a key, validating the indices against the grid extent.
    ///
    /// The grid at zoom `z` has `2^z` tiles in each direction.
    pub fn new(zoom: u8, x: u32, y: u32) -> Result<Self, QuadKeyError> {
        let extent = Self::grid_extent(zoom);
        if zoom > 30 || x >= extent || y >= extent {
            return Err(QuadKeyError::IndexOutOfRange { zoom, x, y });
        }
        Ok(Self { zoom, x, y })
    }

    /// Number of tiles in each direction at the given zoom level.
    pub fn grid_extent(zoom: u8) -> u32 {
        if zoom > 30 {
            return 0;
        }
        1u32 << zoom
    }

    /// Zoom level of the tiling scheme.
    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    /// Easting tile index.
    pub fn x(&self) -> u32 {
        self.x
    }

    /// Northing tile index.
    pub fn y(&self) -> u32 {
        self.y
    }

    /// Canonical label, e.g. `L15-0331E-1257N`.
    pub fn label(&self) -> String {
        format!("L{:02}-{:04}E-{:04}N", self.zoom, self.x, self.y)
    }

    /// All in-grid keys at Chebyshev distance 1 (the 3x3 neighborhood
    /// excluding self). Edge quads have fewer than 8 neighbors.
    pub fn neighbors(&self) -> Vec<QuadKey> {
        let extent = Self::grid_extent(self.zoom);
        let mut out = Vec::with_capacity(8);
        for dy in -1i64..=1 {
            for dx in -1i64..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let nx = self.x as i64 + dx;
                let ny = self.y as i64 + dy;
                if nx < 0 || ny < 0 || nx >= extent as i64 || ny >= extent as i64 {
                    continue;
                }
                out.push(Self {
                    zoom: self.zoom,
                    x: nx as u32,
                    y: ny as u32,
                });
            }
        }
        out
    }

    /// True when `other` lies in this quad's 3x3 context neighborhood.
    ///
    /// The relation is symmetric and never holds for the quad itself.
    pub fn is_neighbor_of(&self, other: &QuadKey) -> bool {
        if self.zoom != other.zoom || self == other {
            return false;
        }
        let dx = (self.x as i64 - other.x as i64).abs();
        let dy = (self.y as i64 - other.y as i64).abs();
        dx <= 1 && dy <= 1
    }
}

impl FromStr for QuadKey {
    type Err = QuadKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = label_pattern()
            .captures(s)
            .ok_or_else(|| QuadKeyError::InvalidLabel(s.to_string()))?;
        let zoom: u8 = caps[1]
            .parse()
            .map_err(|_| QuadKeyError::InvalidLabel(s.to_string()))?;
        let x: u32 = caps[2]
            .parse()
            .map_err(|_| QuadKeyError::InvalidLabel(s.to_string()))?;
        let y: u32 = caps[3]
            .parse()
            .map_err(|_| QuadKeyError::InvalidLabel(s.to_string()))?;
        Self::new(zoom, x, y)
    }
}

impl fmt::Display for QuadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

//! North-up geo-transform arithmetic.

use super::RasterError;
use std::path::Path;

/// Affine mapping between pixel and geographic coordinates.
///
/// Wraps the GDAL 6-tuple `[origin_x, px_w, 0, origin_y, 0, px_h]` with
/// the rotation terms required to be zero: quads on the grid are strictly
/// north-up, and all offset math below relies on it. `px_h` is negative
/// (origin at the top-left).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    gt: [f64; 6],
}

impl GeoTransform {
    /// Wrap a GDAL geo-transform, rejecting rotated rasters.
    pub fn new(gt: [f64; 6], path: &Path) -> Result<Self, RasterError> {
        if gt[2] != 0.0 || gt[4] != 0.0 {
            return Err(RasterError::Rotated {
                path: path.to_path_buf(),
            });
        }
        Ok(Self { gt })
    }

    /// Build from an origin and signed pixel sizes (`pixel_height` < 0
    /// for north-up rasters).
    pub fn from_origin(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            gt: [origin_x, pixel_width, 0.0, origin_y, 0.0, pixel_height],
        }
    }

    /// The raw GDAL 6-tuple.
    pub fn to_array(self) -> [f64; 6] {
        self.gt
    }

    pub fn origin(&self) -> (f64, f64) {
        (self.gt[0], self.gt[3])
    }

    /// Signed pixel width (positive east).
    pub fn pixel_width(&self) -> f64 {
        self.gt[1]
    }

    /// Signed pixel height (negative for north-up).
    pub fn pixel_height(&self) -> f64 {
        self.gt[5]
    }

    /// Geographic coordinates of a pixel's top-left corner.
    pub fn pixel_to_geo(&self, px: f64, py: f64) -> (f64, f64) {
        (
            self.gt[0] + px * self.gt[1],
            self.gt[3] + py * self.gt[5],
        )
    }

    /// Fractional pixel position of a geographic coordinate.
    pub fn geo_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        ((x - self.gt[0]) / self.gt[1], (y - self.gt[3]) / self.gt[5])
    }

    /// Translate the origin by whole pixels (negative moves west/north).
    pub fn shifted(&self, dx_pixels: i64, dy_pixels: i64) -> Self {
        let (x, y) = self.pixel_to_geo(dx_pixels as f64, dy_pixels as f64);
        Self::from_origin(x, y, self.gt[1], self.gt[5])
    }

    /// Whole-pixel offset of `other`'s origin within this grid.
    ///
    /// Requires matching pixel sizes and an origin separation that lands
    /// on the pixel lattice (within a small tolerance), i.e. the rasters
    /// share one grid.
    pub fn pixel_offset_of(&self, other: &GeoTransform) -> Result<(i64, i64), RasterError> {
        let size_eps = 1e-9;
        if (self.pixel_width() - other.pixel_width()).abs() > size_eps
            || (self.pixel_height() - other.pixel_height()).abs() > size_eps
        {
            return Err(RasterError::GridMismatch {
                reason: format!(
                    "pixel sizes differ: ({}, {}) vs ({}, {})",
                    self.pixel_width(),
                    self.pixel_height(),
                    other.pixel_width(),
                    other.pixel_height()
                ),
            });
        }
        let (ox, oy) = other.origin();
        let (px, py) = self.geo_to_pixel(ox, oy);
        let lattice_eps = 1e-3;
        if (px - px.round()).abs() > lattice_eps || (py - py.round()).abs() > lattice_eps {
            return Err(RasterError::GridMismatch {
                reason: format!("origins off-lattice by ({:.6}, {:.6}) pixels", px, py),
            });
        }
        Ok((px.round() as i64, py.round() as i64))
    }
}

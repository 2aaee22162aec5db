//! Buffered mosaic of a focal quad and its context neighbors.
//!
//! The segmentation model slides a window whose loss "core" is smaller
//! than its input, so pixels near a quad edge need imagery from the
//! adjacent quads to be inferred from complete context. The mosaic is the
//! focal raster expanded by a pixel buffer in every direction, composited
//! with up to 8 neighbors on the shared grid, written as a scratch
//! GeoTIFF the model consumes directly.

use super::{
    geo_transform_of, read_bands_f32, write_float_bands, GeoTransform, RasterError, FLOAT_NODATA,
};
use gdal::Dataset;
use ndarray::Array3;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Geometry of a built mosaic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MosaicInfo {
    /// Geo-transform of the buffered canvas
    geo: GeoTransform,
    /// Geo-transform of the focal quad alone
    focal_geo: GeoTransform,
    /// Canvas width in pixels
    width: usize,
    /// Canvas height in pixels
    height: usize,
    /// Buffer applied on each side
    buffer_pixels: usize,
}

impl MosaicInfo {
    pub fn geo(&self) -> GeoTransform {
        self.geo
    }

    pub fn focal_geo(&self) -> GeoTransform {
        self.focal_geo
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn buffer_pixels(&self) -> usize {
        self.buffer_pixels
    }
}

/// Composite the focal raster and its neighbors into a buffered mosaic.
///
/// Only the first three bands of each source contribute; a trailing
/// alpha/mask band would otherwise pollute the model input. Pixels
/// outside the union of source coverage hold [`FLOAT_NODATA`].
///
/// An unreadable focal raster is reported as
/// [`RasterError::CorruptSource`]. An unreadable or misaligned neighbor
/// is logged and excluded, leaving the same hole a missing edge neighbor
/// would.
pub fn build_mosaic(
    focal_path: &Path,
    context_paths: &[PathBuf],
    buffer_pixels: usize,
    out_path: &Path,
) -> Result<MosaicInfo, RasterError> {
    let focal = Dataset::open(focal_path).map_err(|e| RasterError::CorruptSource {
        path: focal_path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let focal_geo = geo_transform_of(&focal, focal_path)?;
    let (fw, fh) = focal.raster_size();

    let width = fw + 2 * buffer_pixels;
    let height = fh + 2 * buffer_pixels;
    let geo = focal_geo.shifted(-(buffer_pixels as i64), -(buffer_pixels as i64));
    let mut canvas = Array3::<f32>::from_elem((3, height, width), FLOAT_NODATA);

    // Focal read failures are terminal; the quad is corrupt.
    paste(&mut canvas, geo, &focal, focal_path)?;
    for path in context_paths {
        let result = Dataset::open(path)
            .map_err(RasterError::from)
            .and_then(|ds| paste(&mut canvas, geo, &ds, path));
        if let Err(e) = result {
            warn!(neighbor = %path.display(), error = %e, "excluding unreadable context neighbor");
        }
    }

    let srs = focal.spatial_ref().ok();
    write_float_bands(out_path, canvas.view(), geo, srs.as_ref(), FLOAT_NODATA)?;
    debug!(
        mosaic = %out_path.display(),
        width, height, buffer_pixels, "mosaic written"
    );

    Ok(MosaicInfo {
        geo,
        focal_geo,
        width,
        height,
        buffer_pixels,
    })
}

/// Copy the overlapping part of a source raster onto the canvas.
fn paste(
    canvas: &mut Array3<f32>,
    canvas_geo: GeoTransform,
    ds: &Dataset,
    path: &Path,
) -> Result<(), RasterError> {
    let src_geo = geo_transform_of(ds, path)?;
    let (off_x, off_y) = canvas_geo.pixel_offset_of(&src_geo)?;
    let (sw, sh) = ds.raster_size();
    let (_, ch, cw) = canvas.dim();

    let src_r0 = (-off_y).max(0) as usize;
    let src_c0 = (-off_x).max(0) as usize;
    let dst_r0 = off_y.max(0) as usize;
    let dst_c0 = off_x.max(0) as usize;
    if src_r0 >= sh || src_c0 >= sw || dst_r0 >= ch || dst_c0 >= cw {
        return Ok(());
    }
    let rows = (sh - src_r0).min(ch - dst_r0);
    let cols = (sw - src_c0).min(cw - dst_c0);

    let band_count = ds.raster_count().max(1) as usize;
    let used = band_count.min(3);
    let band_indices: Vec<isize> = (1..=used as isize).collect();
    let source = read_bands_f32(ds, &band_indices, path)?;

    for b in 0..3 {
        // Single-band sources (e.g. panchromatic) fill all three bands
        let sb = b.min(used - 1);
        for r in 0..rows {
            for c in 0..cols {
                canvas[[b, dst_r0 + r, dst_c0 + c]] = source[[sb, src_r0 + r, src_c0 + c]];
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{open_dataset, write_byte_bands, BYTE_NODATA};
    use ndarray::Array3 as A3;
    use tempfile::TempDir;

    /// Write a 4x4 3-band tile at grid position (x, y), filled with
    /// `value`, on a unit-pixel grid where tile (x, y) spans
    /// x*4..x*4+4 east and y*4..(y+1)*4 north.
    fn write_tile(dir: &Path, name: &str, x: u32, y: u32, value: u8) -> PathBuf {
        let path = dir.join(name);
        let data = A3::from_elem((3, 4, 4), value);
        let geo = GeoTransform::from_origin((x * 4) as f64, ((y + 1) * 4) as f64, 1.0, -1.0);
        write_byte_bands(&path, data.view(), geo, None, BYTE_NODATA).unwrap();
        path
    }

    #[test]
    fn test_mosaic_composites_focal_and_east_neighbor() {
        let dir = TempDir::new().unwrap();
        let focal = write_tile(dir.path(), "focal.tif", 1, 1, 50);
        let east = write_tile(dir.path(), "east.tif", 2, 1, 90);
        let out = dir.path().join("mosaic.tif");

        let info = build_mosaic(&focal, &[east], 2, &out).unwrap();
        assert_eq!((info.width(), info.height()), (8, 8));
        assert_eq!(info.geo().origin(), (2.0, 10.0));
        assert_eq!(info.focal_geo().origin(), (4.0, 8.0));

        let ds = open_dataset(&out).unwrap();
        let canvas = read_bands_f32(&ds, &[1, 2, 3], &out).unwrap();
        // Focal occupies rows/cols 2..6
        assert_eq!(canvas[[0, 2, 2]], 50.0);
        assert_eq!(canvas[[2, 5, 5]], 50.0);
        // East neighbor fills cols 6..8 of the focal rows
        assert_eq!(canvas[[0, 3, 6]], 90.0);
        assert_eq!(canvas[[0, 3, 7]], 90.0);
        // No coverage corner stays nodata
        assert_eq!(canvas[[0, 0, 0]], FLOAT_NODATA);
        assert_eq!(canvas[[1, 7, 0]], FLOAT_NODATA);
    }

    #[test]
    fn test_fourth_band_is_excluded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rgba.tif");
        let mut data = A3::from_elem((4, 4, 4), 30u8);
        data.index_axis_mut(ndarray::Axis(0), 3).fill(0); // alpha says invalid
        let geo = GeoTransform::from_origin(4.0, 8.0, 1.0, -1.0);
        write_byte_bands(&path, data.view(), geo, None, BYTE_NODATA).unwrap();

        let out = dir.path().join("mosaic.tif");
        build_mosaic(&path, &[], 1, &out).unwrap();
        let ds = open_dataset(&out).unwrap();
        assert_eq!(ds.raster_count(), 3, "alpha band must not reach the model");
        let canvas = read_bands_f32(&ds, &[1, 2, 3], &out).unwrap();
        // RGB values pasted even where alpha is zero; masking happens later
        assert_eq!(canvas[[2, 1, 1]], 30.0);
    }

    #[test]
    fn test_corrupt_focal_is_terminal() {
        let dir = TempDir::new().unwrap();
        let focal = dir.path().join("broken.tif");
        std::fs::write(&focal, b"II*\0 garbage").unwrap();
        let out = dir.path().join("mosaic.tif");

        let err = build_mosaic(&focal, &[], 2, &out).unwrap_err();
        assert!(matches!(err, RasterError::CorruptSource { .. }));
    }

    #[test]
    fn test_corrupt_neighbor_is_excluded_not_fatal() {
        let dir = TempDir::new().unwrap();
        let focal = write_tile(dir.path(), "focal.tif", 1, 1, 50);
        let bad = dir.path().join("bad_neighbor.tif");
        std::fs::write(&bad, b"II*\0 garbage").unwrap();
        let out = dir.path().join("mosaic.tif");

        let info = build_mosaic(&focal, &[bad], 2, &out).unwrap();
        let ds = open_dataset(&out).unwrap();
        let canvas = read_bands_f32(&ds, &[1, 2, 3], &out).unwrap();
        assert_eq!(canvas[[0, 3, 3]], 50.0);
        assert_eq!(info.buffer_pixels(), 2);
    }
}

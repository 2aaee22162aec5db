//! Typed GeoTIFF read/write helpers.
//!
//! All persisted raster products are GeoTIFFs with DEFLATE compression and
//! internal tiling. Arrays are `(band, row, col)`; GDAL band numbering is
//! 1-based.

use super::{GeoTransform, RasterError};
use gdal::raster::{Buffer, RasterCreationOption};
use gdal::spatial_ref::SpatialRef;
use gdal::{Dataset, DriverManager};
use ndarray::{Array2, Array3, ArrayView3, Axis};
use std::path::Path;

/// Creation options shared by every persisted product.
const CREATION_OPTIONS: [RasterCreationOption<'static>; 2] = [
    RasterCreationOption {
        key: "COMPRESS",
        value: "DEFLATE",
    },
    RasterCreationOption {
        key: "TILED",
        value: "YES",
    },
];

/// Open a dataset for reading.
pub fn open_dataset(path: &Path) -> Result<Dataset, RasterError> {
    Ok(Dataset::open(path)?)
}

/// The dataset's geo-transform, validated north-up.
pub fn geo_transform_of(ds: &Dataset, path: &Path) -> Result<GeoTransform, RasterError> {
    GeoTransform::new(ds.geo_transform()?, path)
}

/// Read the given 1-based bands into a `(band, row, col)` float array.
pub fn read_bands_f32(
    ds: &Dataset,
    bands: &[isize],
    path: &Path,
) -> Result<Array3<f32>, RasterError> {
    let (w, h) = ds.raster_size();
    let mut out = Array3::<f32>::zeros((bands.len(), h, w));
    for (i, &band_index) in bands.iter().enumerate() {
        let band = ds.rasterband(band_index).map_err(|e| to_corrupt(path, e))?;
        let buffer: Buffer<f32> = band
            .read_as((0, 0), (w, h), (w, h), None)
            .map_err(|e| to_corrupt(path, e))?;
        let plane = Array2::from_shape_vec((h, w), buffer.data).map_err(|e| {
            RasterError::ShapeMismatch {
                reason: format!("band {} of '{}': {}", band_index, path.display(), e),
            }
        })?;
        out.index_axis_mut(Axis(0), i).assign(&plane);
    }
    Ok(out)
}

/// Read the alpha/validity band (band 4) if the dataset carries one.
///
/// Returns `None` for 3-band imagery, which has no per-pixel validity.
pub fn read_alpha_band(ds: &Dataset, path: &Path) -> Result<Option<Array2<u8>>, RasterError> {
    if ds.raster_count() < 4 {
        return Ok(None);
    }
    let (w, h) = ds.raster_size();
    let band = ds.rasterband(4).map_err(|e| to_corrupt(path, e))?;
    let buffer: Buffer<u8> = band
        .read_as((0, 0), (w, h), (w, h), None)
        .map_err(|e| to_corrupt(path, e))?;
    let plane =
        Array2::from_shape_vec((h, w), buffer.data).map_err(|e| RasterError::ShapeMismatch {
            reason: format!("alpha band of '{}': {}", path.display(), e),
        })?;
    Ok(Some(plane))
}

/// Classify a GDAL read failure on a source raster as corrupt input.
fn to_corrupt(path: &Path, e: gdal::errors::GdalError) -> RasterError {
    RasterError::CorruptSource {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

/// Write a float GeoTIFF (DEFLATE, tiled) with nodata on every band.
pub fn write_float_bands(
    path: &Path,
    data: ArrayView3<'_, f32>,
    geo: GeoTransform,
    srs: Option<&SpatialRef>,
    nodata: f32,
) -> Result<(), RasterError> {
    let (bands, h, w) = data.dim();
    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let mut ds = driver.create_with_band_type_with_options::<f32, _>(
        path,
        w as isize,
        h as isize,
        bands as isize,
        &CREATION_OPTIONS,
    )?;
    ds.set_geo_transform(&geo.to_array())?;
    if let Some(srs) = srs {
        ds.set_spatial_ref(srs)?;
    }
    for b in 0..bands {
        let plane = data.index_axis(Axis(0), b);
        let mut buffer = Buffer::new((w, h), plane.iter().copied().collect());
        let mut band = ds.rasterband((b + 1) as isize)?;
        band.set_no_data_value(Some(nodata as f64))?;
        band.write((0, 0), (w, h), &mut buffer)?;
    }
    Ok(())
}

/// Write a byte GeoTIFF (DEFLATE, tiled) with nodata on every band.
pub fn write_byte_bands(
    path: &Path,
    data: ArrayView3<'_, u8>,
    geo: GeoTransform,
    srs: Option<&SpatialRef>,
    nodata: u8,
) -> Result<(), RasterError> {
    let (bands, h, w) = data.dim();
    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let mut ds = driver.create_with_band_type_with_options::<u8, _>(
        path,
        w as isize,
        h as isize,
        bands as isize,
        &CREATION_OPTIONS,
    )?;
    ds.set_geo_transform(&geo.to_array())?;
    if let Some(srs) = srs {
        ds.set_spatial_ref(srs)?;
    }
    for b in 0..bands {
        let plane = data.index_axis(Axis(0), b);
        let mut buffer = Buffer::new((w, h), plane.iter().copied().collect());
        let mut band = ds.rasterband((b + 1) as isize)?;
        band.set_no_data_value(Some(nodata as f64))?;
        band.write((0, 0), (w, h), &mut buffer)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{BYTE_NODATA, FLOAT_NODATA};
    use ndarray::Array3;
    use tempfile::TempDir;

    #[test]
    fn test_float_write_read_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("probs.tif");
        let mut data = Array3::<f32>::zeros((2, 4, 5));
        data[[0, 0, 0]] = 0.25;
        data[[1, 3, 4]] = FLOAT_NODATA;
        let geo = GeoTransform::from_origin(100.0, 200.0, 2.0, -2.0);

        write_float_bands(&path, data.view(), geo, None, FLOAT_NODATA).unwrap();

        let ds = open_dataset(&path).unwrap();
        assert_eq!(ds.raster_size(), (5, 4));
        assert_eq!(ds.raster_count(), 2);
        let round = read_bands_f32(&ds, &[1, 2], &path).unwrap();
        assert_eq!(round, data);
        assert_eq!(geo_transform_of(&ds, &path).unwrap(), geo);
        assert_eq!(
            ds.rasterband(1).unwrap().no_data_value(),
            Some(FLOAT_NODATA as f64)
        );
    }

    #[test]
    fn test_byte_write_preserves_nodata_declaration() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("classes.tif");
        let mut data = Array3::<u8>::zeros((1, 3, 3));
        data[[0, 1, 1]] = BYTE_NODATA;
        let geo = GeoTransform::from_origin(0.0, 30.0, 10.0, -10.0);

        write_byte_bands(&path, data.view(), geo, None, BYTE_NODATA).unwrap();

        let ds = open_dataset(&path).unwrap();
        assert_eq!(
            ds.rasterband(1).unwrap().no_data_value(),
            Some(BYTE_NODATA as f64)
        );
        let round = read_bands_f32(&ds, &[1], &path).unwrap();
        assert_eq!(round[[0, 1, 1]], BYTE_NODATA as f32);
    }

    #[test]
    fn test_alpha_band_absent_on_three_band_raster() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rgb.tif");
        let data = Array3::<u8>::zeros((3, 2, 2));
        let geo = GeoTransform::from_origin(0.0, 0.0, 1.0, -1.0);
        write_byte_bands(&path, data.view(), geo, None, BYTE_NODATA).unwrap();

        let ds = open_dataset(&path).unwrap();
        assert!(read_alpha_band(&ds, &path).unwrap().is_none());
    }

    #[test]
    fn test_open_garbage_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("truncated.tif");
        std::fs::write(&path, b"II*\0 not a real tiff").unwrap();
        assert!(open_dataset(&path).is_err());
    }
}

//! Raster geometry, GeoTIFF I/O, mosaicking and post-processing.
//!
//! Everything here goes through typed APIs: GDAL datasets and bands for
//! I/O, `ndarray` for in-memory band math. There are no shell-outs to
//! command-line raster tools, so failures surface as structured errors
//! rather than parsed stderr.
//!
//! Two nodata sentinels are used consistently across the whole chain:
//! [`FLOAT_NODATA`] (−9999) for float rasters and [`BYTE_NODATA`] (255)
//! for byte products. Every transform that produces a raster re-applies
//! the appropriate sentinel; losing nodata mid-chain is the classic
//! failure mode here and is covered by the property tests in
//! [`post`].

mod classes;
mod geo;
mod gtiff;
mod mosaic;
pub mod post;

pub use classes::{ClassMapping, ClassMappingError};
pub use geo::GeoTransform;
pub use gtiff::{
    geo_transform_of, open_dataset, read_alpha_band, read_bands_f32, write_byte_bands,
    write_float_bands,
};
pub use mosaic::{build_mosaic, MosaicInfo};

use std::path::PathBuf;
use thiserror::Error;

/// Nodata sentinel for float rasters (mosaics, probability bands).
pub const FLOAT_NODATA: f32 = -9999.0;

/// Nodata sentinel for byte rasters (classification, scaled products).
pub const BYTE_NODATA: u8 = 255;

/// Errors from raster I/O and transforms.
#[derive(Debug, Error)]
pub enum RasterError {
    /// GDAL-level failure (driver, open, band read/write)
    #[error(transparent)]
    Gdal(#[from] gdal::errors::GdalError),

    /// Focal source raster cannot be opened or read; a terminal condition
    /// distinct from transient failures
    #[error("corrupt source raster '{path}': {reason}")]
    CorruptSource { path: PathBuf, reason: String },

    /// Geo-transform has rotation terms; the pipeline assumes north-up
    #[error("raster '{path}' is not north-up")]
    Rotated { path: PathBuf },

    /// Two rasters that must share a pixel grid do not
    #[error("pixel grids do not align: {reason}")]
    GridMismatch { reason: String },

    /// Band count or array shape differs from what the class mapping or
    /// caller requires
    #[error("unexpected raster shape: {reason}")]
    ShapeMismatch { reason: String },
}

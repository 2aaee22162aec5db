//! Pure raster-to-raster post-processing transforms.
//!
//! Every transform re-applies the appropriate nodata sentinel to its
//! output; the chain as a whole must never fabricate a value over a pixel
//! the source marked invalid. Arrays are `(band, row, col)` for stacks and
//! `(row, col)` for planes.

use super::{ClassMapping, RasterError, BYTE_NODATA, FLOAT_NODATA};
use ndarray::{s, Array2, Array3, ArrayView2, ArrayView3};

/// Sum fine probability bands into coarse classes.
///
/// Output bands are ordered by ascending coarse code. The per-pixel
/// probability sum is preserved exactly; nodata pixels stay nodata in
/// every output band.
pub fn aggregate_coarse(
    probs: ArrayView3<'_, f32>,
    mapping: &ClassMapping,
) -> Result<Array3<f32>, RasterError> {
    let (fine, h, w) = probs.dim();
    if fine != mapping.fine_count() {
        return Err(RasterError::ShapeMismatch {
            reason: format!(
                "{} probability bands but mapping has {} fine classes",
                fine,
                mapping.fine_count()
            ),
        });
    }
    let band_of: Vec<usize> = (0..fine)
        .map(|f| {
            let code = mapping.coarse_of(f).expect("fine index in range");
            mapping.coarse_band_index(code).expect("code in mapping")
        })
        .collect();

    let mut out = Array3::<f32>::zeros((mapping.coarse_count(), h, w));
    for r in 0..h {
        for c in 0..w {
            if probs[[0, r, c]] == FLOAT_NODATA {
                for b in 0..mapping.coarse_count() {
                    out[[b, r, c]] = FLOAT_NODATA;
                }
                continue;
            }
            for f in 0..fine {
                out[[band_of[f], r, c]] += probs[[f, r, c]];
            }
        }
    }
    Ok(out)
}

/// Per-pixel arg-max over coarse bands, emitting coarse class codes.
///
/// Ties break toward the lowest class code (bands are code-ordered and a
/// later band must be strictly greater to win). Nodata pixels map to
/// [`BYTE_NODATA`].
pub fn argmax_classify(coarse: ArrayView3<'_, f32>, mapping: &ClassMapping) -> Array2<u8> {
    let (bands, h, w) = coarse.dim();
    let codes = mapping.coarse_codes();
    debug_assert_eq!(bands, codes.len());

    let mut out = Array2::<u8>::zeros((h, w));
    for r in 0..h {
        for c in 0..w {
            if coarse[[0, r, c]] == FLOAT_NODATA {
                out[[r, c]] = BYTE_NODATA;
                continue;
            }
            let mut best = 0usize;
            for b in 1..bands {
                if coarse[[b, r, c]] > coarse[[best, r, c]] {
                    best = b;
                }
            }
            out[[r, c]] = codes[best];
        }
    }
    out
}

/// The reef-class probability band, nodata preserved.
pub fn reef_heatmap(coarse: ArrayView3<'_, f32>, mapping: &ClassMapping) -> Array2<f32> {
    coarse
        .index_axis(ndarray::Axis(0), mapping.reef_band_index())
        .to_owned()
}

/// Byte mask of reef pixels: 1 where the classification is reef, 0
/// elsewhere, nodata carried through.
pub fn reef_outline(classification: ArrayView2<'_, u8>, mapping: &ClassMapping) -> Array2<u8> {
    classification.mapv(|v| {
        if v == BYTE_NODATA {
            BYTE_NODATA
        } else if v == mapping.reef_code() {
            1
        } else {
            0
        }
    })
}

/// Whether any pixel classifies as reef.
///
/// Gates all reef product generation: most quads globally contain no reef
/// and are closed out with a `no_apply` marker instead.
pub fn contains_reef(classification: ArrayView2<'_, u8>, mapping: &ClassMapping) -> bool {
    classification.iter().any(|&v| v == mapping.reef_code())
}

/// Slice a buffered-extent stack back to the focal pixel grid.
pub fn crop_to_focal3<T: Clone>(
    stack: ArrayView3<'_, T>,
    buffer_pixels: usize,
) -> Result<Array3<T>, RasterError> {
    let (_, h, w) = stack.dim();
    if h <= 2 * buffer_pixels || w <= 2 * buffer_pixels {
        return Err(RasterError::ShapeMismatch {
            reason: format!(
                "cannot crop {} pixels from each side of a {}x{} raster",
                buffer_pixels, w, h
            ),
        });
    }
    Ok(stack
        .slice(s![
            ..,
            buffer_pixels..h - buffer_pixels,
            buffer_pixels..w - buffer_pixels
        ])
        .to_owned())
}

/// Per-pixel validity from an alpha band: zero alpha means no source data.
pub fn validity_mask(alpha: ArrayView2<'_, u8>) -> Array2<bool> {
    alpha.mapv(|a| a != 0)
}

/// Force float nodata wherever the focal source is invalid.
pub fn mask_float_bands(
    stack: &mut Array3<f32>,
    valid: &Array2<bool>,
) -> Result<(), RasterError> {
    let (bands, h, w) = stack.dim();
    if valid.dim() != (h, w) {
        return Err(RasterError::ShapeMismatch {
            reason: format!(
                "validity mask {:?} does not match raster {:?}",
                valid.dim(),
                (h, w)
            ),
        });
    }
    for b in 0..bands {
        for r in 0..h {
            for c in 0..w {
                if !valid[[r, c]] {
                    stack[[b, r, c]] = FLOAT_NODATA;
                }
            }
        }
    }
    Ok(())
}

/// Force byte nodata wherever the focal source is invalid.
pub fn mask_byte_plane(plane: &mut Array2<u8>, valid: &Array2<bool>) -> Result<(), RasterError> {
    if valid.dim() != plane.dim() {
        return Err(RasterError::ShapeMismatch {
            reason: format!(
                "validity mask {:?} does not match raster {:?}",
                valid.dim(),
                plane.dim()
            ),
        });
    }
    plane.zip_mut_with(valid, |v, &ok| {
        if !ok {
            *v = BYTE_NODATA;
        }
    });
    Ok(())
}

/// Compress probabilities (0..1) into bytes on a 0..100 scale.
///
/// Values are clamped before scaling so float rounding above 1.0 cannot
/// collide with the nodata byte.
pub fn scale_to_byte(stack: ArrayView3<'_, f32>) -> Array3<u8> {
    stack.mapv(|v| {
        if v == FLOAT_NODATA {
            BYTE_NODATA
        } else {
            (v.clamp(0.0, 1.0) * 100.0).round() as u8
        }
    })
}

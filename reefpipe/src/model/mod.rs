//! Inference model boundary.
//!
//! The pipeline never links against a deep-learning runtime. It hands the
//! model a features raster on disk and expects a per-class probability
//! raster back, through the [`InferenceModel`] trait. The production
//! implementation shells out to an external command; tests substitute a
//! pure-Rust fake.

mod external;

pub use external::ExternalCommandModel;

use std::path::Path;
use thiserror::Error;

/// Failure modes of a model application.
#[derive(Error, Debug)]
pub enum InferenceError {
    /// The model rejected the input imagery as unreadable or malformed.
    /// Distinguished from [`InferenceError::Failed`] so the caller can
    /// publish a corrupt-data marker instead of retrying forever.
    #[error("model rejected input as corrupt: {0}")]
    CorruptInput(String),

    /// The model could not run or exited abnormally.
    #[error("model application failed: {0}")]
    Failed(String),
}

/// A segmentation model applied to one features raster at a time.
///
/// Implementations must be thread-safe; the pipeline may be driven by
/// several workers sharing one model handle.
pub trait InferenceModel: Send + Sync {
    /// Number of fine-class probability bands the model emits.
    fn num_classes(&self) -> usize;

    /// Run the model on `features`, writing one float band per fine
    /// class to `probabilities`.
    fn apply(&self, features: &Path, probabilities: &Path) -> Result<(), InferenceError>;
}

//! Pipeline error taxonomy.

use crate::catalog::CatalogError;
use crate::lock::LockError;
use crate::model::InferenceError;
use crate::pipeline::ConfigError;
use crate::raster::RasterError;
use crate::store::StoreError;
use thiserror::Error;

/// Any failure while running the application pipeline.
///
/// Corrupt source imagery is the one failure class the pipeline handles
/// itself, by publishing a `data_corrupt` marker; see
/// [`PipelineError::is_corrupt_input`]. Everything else propagates to the
/// caller so a misconfigured or sick worker fails loudly instead of
/// sweeping a region into a bad state.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error(transparent)]
    Raster(#[from] RasterError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error("scratch I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Whether this failure means the quad's source imagery is bad, as
    /// opposed to the worker or its environment.
    pub fn is_corrupt_input(&self) -> bool {
        matches!(
            self,
            PipelineError::Raster(RasterError::CorruptSource { .. })
                | PipelineError::Inference(InferenceError::CorruptInput(_))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_corrupt_source_classifies_as_corrupt_input() {
        let err = PipelineError::from(RasterError::CorruptSource {
            path: PathBuf::from("q.tif"),
            reason: "truncated".to_string(),
        });
        assert!(err.is_corrupt_input());
    }

    #[test]
    fn test_model_rejection_classifies_as_corrupt_input() {
        let err = PipelineError::from(InferenceError::CorruptInput("bad tiff".to_string()));
        assert!(err.is_corrupt_input());
    }

    #[test]
    fn test_other_failures_do_not() {
        let err = PipelineError::from(InferenceError::Failed("oom".to_string()));
        assert!(!err.is_corrupt_input());
        let err = PipelineError::from(StoreError::NotFound {
            key: "k".to_string(),
        });
        assert!(!err.is_corrupt_input());
    }
}

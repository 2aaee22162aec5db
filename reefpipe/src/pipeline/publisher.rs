//! Publication of finished products to the destination store.

use super::paths::{DestLayout, ARTIFACTS};
use crate::store::{ObjectStore, StoreError};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Uploads a quad's artifact set to its versioned destination prefix.
pub struct Publisher {
    store: Arc<dyn ObjectStore>,
    layout: DestLayout,
}

impl Publisher {
    pub fn new(store: Arc<dyn ObjectStore>, layout: DestLayout) -> Self {
        Self { store, layout }
    }

    pub fn layout(&self) -> &DestLayout {
        &self.layout
    }

    /// Upload every artifact from a local output directory.
    ///
    /// Uploads replace any partial set from a crashed predecessor, so a
    /// published quad is complete as soon as its marker lands.
    pub fn publish(&self, label: &str, out_dir: &Path) -> Result<(), StoreError> {
        for artifact in ARTIFACTS {
            let key = self.layout.artifact_key(label, artifact);
            self.store.put(&out_dir.join(artifact), &key)?;
        }
        info!(quad = label, prefix = %self.layout.quad_prefix(label), "products published");
        Ok(())
    }

    /// Whether the full artifact set already exists at the destination.
    ///
    /// True with no completion marker means a predecessor crashed between
    /// publish and marking; the quad can be closed out without rework.
    pub fn artifacts_exist(&self, label: &str) -> Result<bool, StoreError> {
        for artifact in ARTIFACTS {
            if !self.store.exists(&self.layout.artifact_key(label, artifact))? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LocalStore;
    use tempfile::TempDir;

    fn publisher(root: &Path) -> Publisher {
        Publisher::new(
            Arc::new(LocalStore::new(root)),
            DestLayout::new("products", "benthic", "reefnet", "1.0.0"),
        )
    }

    #[test]
    fn test_publish_uploads_every_artifact() {
        let store_dir = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        for artifact in ARTIFACTS {
            std::fs::write(out_dir.path().join(artifact), b"tif").unwrap();
        }

        let publisher = publisher(store_dir.path());
        publisher.publish("L15-0001E-0001N", out_dir.path()).unwrap();
        assert!(publisher.artifacts_exist("L15-0001E-0001N").unwrap());
        assert!(store_dir
            .path()
            .join("products/L15-0001E-0001N/benthic/reefnet/1.0.0/reef_outline.tif")
            .exists());
    }

    #[test]
    fn test_partial_artifact_set_is_not_complete() {
        let store_dir = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        for artifact in ARTIFACTS {
            std::fs::write(out_dir.path().join(artifact), b"tif").unwrap();
        }

        let publisher = publisher(store_dir.path());
        publisher.publish("L15-0001E-0001N", out_dir.path()).unwrap();
        let heatmap = publisher
            .layout()
            .artifact_key("L15-0001E-0001N", super::super::paths::REEF_HEATMAP_TIF);
        publisher.store.delete(&heatmap).unwrap();
        assert!(!publisher.artifacts_exist("L15-0001E-0001N").unwrap());
    }

    #[test]
    fn test_missing_local_artifact_fails_publish() {
        let store_dir = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();

        let publisher = publisher(store_dir.path());
        assert!(publisher.publish("L15-0001E-0001N", out_dir.path()).is_err());
    }
}

//! Quad catalog: enumerate stored imagery and pair neighbors.
//!
//! The catalog is built fresh from a flat store listing at the start of
//! every pipeline invocation and is never persisted. Each listed quad
//! raster becomes one [`QuadBlob`] whose context holds every other listed
//! quad within Chebyshev distance 1; quads at the edge of coverage simply
//! carry fewer than 8 context entries.
//!
//! Names that do not match the quad label pattern are skipped, as is
//! anything under the reserved `test/` subtree of the source prefix.
//! Neighbor lookup is O(n) via a `(x, y)` index.

use crate::quad::{BlobRef, QuadBlob, QuadBlobBuilder, QuadBlobError, QuadKey};
use crate::store::{ObjectStore, StoreError};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors from building the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Store listing failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Internal neighbor pairing bug surfaced by the blob builder
    #[error("catalog pairing error: {0}")]
    Pairing(#[from] QuadBlobError),
}

/// One catalog pass over the source prefix.
pub struct QuadCatalog {
    blobs: Vec<QuadBlob>,
}

impl QuadCatalog {
    /// List the store and assemble one fully-paired blob per quad raster.
    pub fn from_store(store: &dyn ObjectStore, src_prefix: &str) -> Result<Self, CatalogError> {
        let listing = store.list(src_prefix)?;
        let excluded = format!("{}/test/", src_prefix.trim_end_matches('/'));

        let mut by_index: HashMap<(u32, u32), BlobRef> = HashMap::new();
        for key in listing {
            if key.starts_with(&excluded) {
                debug!(object = %key, "skipping excluded subtree");
                continue;
            }
            match parse_object_key(&key) {
                Some(quad) => {
                    if let Some(prev) = by_index.insert((quad.x(), quad.y()), BlobRef::new(quad, key)) {
                        warn!(quad = %prev.key(), "duplicate quad listing, keeping last");
                    }
                }
                None => debug!(object = %key, "skipping non-quad object"),
            }
        }

        let mut blobs = Vec::with_capacity(by_index.len());
        for focal in by_index.values() {
            let mut builder = QuadBlobBuilder::new(focal.clone());
            for neighbor_key in focal.key().neighbors() {
                if let Some(neighbor) = by_index.get(&(neighbor_key.x(), neighbor_key.y())) {
                    builder = builder.context(neighbor.clone())?;
                }
            }
            blobs.push(builder.build());
        }
        // Stable order so operators see a deterministic catalog; workers do
        // not rely on processing order.
        blobs.sort_by_key(|b| b.key());

        info!(quads = blobs.len(), prefix = src_prefix, "catalog built");
        Ok(Self { blobs })
    }

    pub fn quads(&self) -> &[QuadBlob] {
        &self.blobs
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

/// Extract the quad key from an object key like
/// `quads/L15-0331E-1257N.tif`. Returns `None` for anything else.
fn parse_object_key(object_key: &str) -> Option<QuadKey> {
    let name = object_key.rsplit('/').next()?;
    let stem = name.strip_suffix(".tif")?;
    stem.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LocalStore;
    use std::fs;
    use tempfile::TempDir;

    fn seeded_store(labels: &[&str]) -> (TempDir, LocalStore) {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::new(dir.path());
        let payload = dir.path().join("payload.tif");
        fs::write(&payload, b"tif").unwrap();
        for label in labels {
            store
                .put(&payload, &format!("quads/{}.tif", label))
                .unwrap();
        }
        (dir, store)
    }

    #[test]
    fn test_parse_object_key() {
        let key = parse_object_key("quads/L15-0331E-1257N.tif").unwrap();
        assert_eq!(key.label(), "L15-0331E-1257N");
        assert!(parse_object_key("quads/readme.txt").is_none());
        assert!(parse_object_key("quads/L15-0331E-1257N.tif.aux").is_none());
    }

    #[test]
    fn test_catalog_pairs_neighbors() {
        let (_dir, store) = seeded_store(&[
            "L15-0010E-0010N",
            "L15-0011E-0010N",
            "L15-0010E-0011N",
            "L15-0030E-0030N",
        ]);
        let catalog = QuadCatalog::from_store(&store, "quads").unwrap();
        assert_eq!(catalog.len(), 4);

        let focal = catalog
            .quads()
            .iter()
            .find(|b| b.label() == "L15-0010E-0010N")
            .unwrap();
        let context: Vec<String> = focal.context().iter().map(|c| c.key().label()).collect();
        assert_eq!(context, vec!["L15-0010E-0011N", "L15-0011E-0010N"]);

        let isolated = catalog
            .quads()
            .iter()
            .find(|b| b.label() == "L15-0030E-0030N")
            .unwrap();
        assert!(isolated.context().is_empty());
    }

    #[test]
    fn test_catalog_pairing_is_symmetric() {
        let (_dir, store) = seeded_store(&["L15-0010E-0010N", "L15-0011E-0011N"]);
        let catalog = QuadCatalog::from_store(&store, "quads").unwrap();
        for blob in catalog.quads() {
            for ctx in blob.context() {
                let other = catalog
                    .quads()
                    .iter()
                    .find(|b| b.key() == ctx.key())
                    .expect("context quad is in the catalog");
                assert!(
                    other.context().iter().any(|c| c.key() == blob.key()),
                    "{} lists {} but not vice versa",
                    blob.label(),
                    other.label()
                );
            }
        }
    }

    #[test]
    fn test_catalog_skips_test_subtree_and_junk() {
        let (_dir, store) = seeded_store(&["L15-0010E-0010N"]);
        let payload = store.root().join("payload.tif");
        store.put(&payload, "quads/test/L15-0011E-0010N.tif").unwrap();
        store.put(&payload, "quads/notes.txt").unwrap();

        let catalog = QuadCatalog::from_store(&store, "quads").unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(catalog.quads()[0].context().is_empty());
    }

    #[test]
    fn test_empty_store_is_empty_catalog() {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::new(dir.path());
        let catalog = QuadCatalog::from_store(&store, "quads").unwrap();
        assert!(catalog.is_empty());
    }
}

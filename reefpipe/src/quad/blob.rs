//! Immutable binding of a quad to its storage location and context.

use super::QuadKey;
use thiserror::Error;

/// Errors from assembling a [`QuadBlob`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuadBlobError {
    /// Context entry is not in the focal quad's 3x3 neighborhood
    #[error("{candidate} is not a context neighbor of {focal}")]
    NotANeighbor { focal: String, candidate: String },

    /// Same neighbor added twice
    #[error("duplicate context entry {0}")]
    DuplicateContext(String),
}

/// Reference to one stored quad raster: grid key plus object-store key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobRef {
    key: QuadKey,
    object_key: String,
}

impl BlobRef {
    pub fn new(key: QuadKey, object_key: impl Into<String>) -> Self {
        Self {
            key,
            object_key: object_key.into(),
        }
    }

    /// Grid identity of the referenced quad.
    pub fn key(&self) -> QuadKey {
        self.key
    }

    /// Object-store key of the raster.
    pub fn object_key(&self) -> &str {
        &self.object_key
    }
}

/// A focal quad paired with its contextual neighbors.
///
/// The context list holds every listed quad within Chebyshev distance 1 of
/// the focal quad, excluding the quad itself. Edge quads simply carry fewer
/// than 8 entries. The value is immutable; construction goes through
/// [`QuadBlobBuilder`] so the context is complete before the blob exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuadBlob {
    focal: BlobRef,
    context: Vec<BlobRef>,
}

impl QuadBlob {
    /// Grid identity of the focal quad.
    pub fn key(&self) -> QuadKey {
        self.focal.key()
    }

    /// Canonical label of the focal quad.
    pub fn label(&self) -> String {
        self.focal.key().label()
    }

    /// Object-store key of the focal raster.
    pub fn object_key(&self) -> &str {
        self.focal.object_key()
    }

    /// Contextual neighbors, at most 8.
    pub fn context(&self) -> &[BlobRef] {
        &self.context
    }
}

/// Builder assembling the full neighbor list before producing a blob.
#[derive(Debug)]
pub struct QuadBlobBuilder {
    focal: BlobRef,
    context: Vec<BlobRef>,
}

impl QuadBlobBuilder {
    pub fn new(focal: BlobRef) -> Self {
        Self {
            focal,
            context: Vec::with_capacity(8),
        }
    }

    /// Add a context neighbor.
    ///
    /// Rejects entries outside the focal 3x3 neighborhood and duplicates;
    /// both indicate a catalog bug rather than a recoverable condition.
    pub fn context(mut self, entry: BlobRef) -> Result<Self, QuadBlobError> {
        if !self.focal.key().is_neighbor_of(&entry.key()) {
            return Err(QuadBlobError::NotANeighbor {
                focal: self.focal.key().label(),
                candidate: entry.key().label(),
            });
        }
        if self.context.iter().any(|c| c.key() == entry.key()) {
            return Err(QuadBlobError::DuplicateContext(entry.key().label()));
        }
        self.context.push(entry);
        Ok(self)
    }

    pub fn build(mut self) -> QuadBlob {
        // Deterministic context order regardless of listing order
        self.context.sort_by_key(|c| c.key());
        QuadBlob {
            focal: self.focal,
            context: self.context,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(x: u32, y: u32) -> QuadKey {
        QuadKey::new(15, x, y).unwrap()
    }

    fn blob_ref(x: u32, y: u32) -> BlobRef {
        let k = key(x, y);
        BlobRef::new(k, format!("quads/{}.tif", k.label()))
    }

    #[test]
    fn test_build_with_full_context() {
        let mut builder = QuadBlobBuilder::new(blob_ref(10, 10));
        for n in key(10, 10).neighbors() {
            builder = builder.context(blob_ref(n.x(), n.y())).unwrap();
        }
        let blob = builder.build();
        assert_eq!(blob.context().len(), 8);
        assert_eq!(blob.label(), "L15-0010E-0010N");
    }

    #[test]
    fn test_rejects_non_neighbor() {
        let err = QuadBlobBuilder::new(blob_ref(10, 10))
            .context(blob_ref(13, 10))
            .unwrap_err();
        assert!(matches!(err, QuadBlobError::NotANeighbor { .. }));
    }

    #[test]
    fn test_rejects_self_as_context() {
        let err = QuadBlobBuilder::new(blob_ref(10, 10))
            .context(blob_ref(10, 10))
            .unwrap_err();
        assert!(matches!(err, QuadBlobError::NotANeighbor { .. }));
    }

    #[test]
    fn test_rejects_duplicate_context() {
        let err = QuadBlobBuilder::new(blob_ref(10, 10))
            .context(blob_ref(10, 11))
            .unwrap()
            .context(blob_ref(10, 11))
            .unwrap_err();
        assert!(matches!(err, QuadBlobError::DuplicateContext(_)));
    }

    #[test]
    fn test_context_order_is_deterministic() {
        let a = QuadBlobBuilder::new(blob_ref(10, 10))
            .context(blob_ref(9, 9))
            .unwrap()
            .context(blob_ref(11, 11))
            .unwrap()
            .build();
        let b = QuadBlobBuilder::new(blob_ref(10, 10))
            .context(blob_ref(11, 11))
            .unwrap()
            .context(blob_ref(9, 9))
            .unwrap()
            .build();
        assert_eq!(a.context(), b.context());
    }

    #[test]
    fn test_sparse_context_is_not_an_error() {
        let blob = QuadBlobBuilder::new(blob_ref(10, 10)).build();
        assert!(blob.context().is_empty());
    }
}

//! Durable object storage behind an explicit, injected context.
//!
//! Every component that touches the shared store receives an
//! [`ObjectStore`] (usually via [`StorageContext`]) by parameter. There is
//! no lazy global client or bucket singleton: the context is built once at
//! process start, which keeps initialization order explicit and lets tests
//! substitute a tempdir-backed [`LocalStore`].
//!
//! Keys are `/`-separated relative paths, e.g.
//! `quads/L15-0331E-1257N.tif`. [`LocalStore`] is the production backend
//! for SLURM clusters with a shared filesystem as well as the test backend.

mod local;

pub use local::LocalStore;

use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Errors from object-store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Requested object does not exist
    #[error("object '{key}' not found")]
    NotFound { key: String },

    /// Key escapes the store root or is otherwise malformed
    #[error("invalid object key '{key}'")]
    InvalidKey { key: String },

    /// Underlying I/O failure
    #[error("store I/O error for '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

/// Flat object storage: list, fetch, upload, markers.
///
/// Implementations must be safe to share across threads; the pipeline
/// itself is single-threaded per worker process, but tests race workers
/// against one instance.
pub trait ObjectStore: Send + Sync {
    /// List every object key under the given prefix, in unspecified order.
    ///
    /// A missing prefix is an empty listing, not an error.
    fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError>;

    /// Whether an object exists at the key.
    fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Download an object to a local path.
    fn fetch(&self, key: &str, dest: &Path) -> Result<(), StoreError>;

    /// Upload a local file to the key, replacing any existing object.
    fn put(&self, src: &Path, key: &str) -> Result<(), StoreError>;

    /// Create an empty marker object at the key. Idempotent.
    fn put_marker(&self, key: &str) -> Result<(), StoreError>;

    /// Remove the object at the key. Removing a missing object is not an
    /// error.
    fn delete(&self, key: &str) -> Result<(), StoreError>;
}

/// The storage a worker process talks to, constructed once at startup.
#[derive(Clone)]
pub struct StorageContext {
    store: Arc<dyn ObjectStore>,
    src_prefix: String,
    dest_prefix: String,
}

impl StorageContext {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        src_prefix: impl Into<String>,
        dest_prefix: impl Into<String>,
    ) -> Self {
        Self {
            store,
            src_prefix: src_prefix.into(),
            dest_prefix: dest_prefix.into(),
        }
    }

    pub fn store(&self) -> &dyn ObjectStore {
        self.store.as_ref()
    }

    pub fn store_arc(&self) -> Arc<dyn ObjectStore> {
        Arc::clone(&self.store)
    }

    /// Prefix the source imagery quads live under.
    pub fn src_prefix(&self) -> &str {
        &self.src_prefix
    }

    /// Prefix finished artifacts and markers are published under.
    pub fn dest_prefix(&self) -> &str {
        &self.dest_prefix
    }
}

impl std::fmt::Debug for StorageContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageContext")
            .field("src_prefix", &self.src_prefix)
            .field("dest_prefix", &self.dest_prefix)
            .finish_non_exhaustive()
    }
}

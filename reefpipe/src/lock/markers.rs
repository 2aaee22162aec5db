//! Durable terminal-state markers at quad-root granularity.

use crate::store::{ObjectStore, StoreError};
use std::sync::Arc;

/// Marker object recording that every artifact for a quad was uploaded.
pub const COMPLETE_MARKER: &str = "application_complete";

/// Marker object recording that the quad's source raster is unreadable.
/// The quad is skipped by all future runs until the marker is manually
/// cleared.
pub const CORRUPT_MARKER: &str = "data_corrupt";

/// Marker object recording a clean run that found no reef; nothing to
/// publish.
pub const NO_APPLY_MARKER: &str = "no_apply";

/// Externally observable terminal state of a quad, derived from markers.
///
/// The transient locked-in-progress condition lives with
/// [`LockManager`](super::LockManager), not here; markers only record
/// terminal outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuadState {
    /// No terminal marker present
    NotStarted,
    /// `application_complete` present
    Complete,
    /// `data_corrupt` present
    Corrupt,
    /// `no_apply` present
    NoApply,
}

/// Reads and writes terminal markers under the destination prefix.
///
/// All checks are idempotent existence tests, cheap enough to run before
/// any lock attempt or raster work.
#[derive(Clone)]
pub struct MarkerClient {
    store: Arc<dyn ObjectStore>,
    dest_prefix: String,
}

impl MarkerClient {
    pub fn new(store: Arc<dyn ObjectStore>, dest_prefix: impl Into<String>) -> Self {
        Self {
            store,
            dest_prefix: dest_prefix.into(),
        }
    }

    /// Store key of a marker for the quad, e.g.
    /// `outputs/L15-0331E-1257N/application_complete`.
    pub fn marker_key(&self, label: &str, marker: &str) -> String {
        format!("{}/{}/{}", self.dest_prefix, label, marker)
    }

    pub fn is_complete(&self, label: &str) -> Result<bool, StoreError> {
        self.store.exists(&self.marker_key(label, COMPLETE_MARKER))
    }

    pub fn is_corrupt(&self, label: &str) -> Result<bool, StoreError> {
        self.store.exists(&self.marker_key(label, CORRUPT_MARKER))
    }

    pub fn is_no_apply(&self, label: &str) -> Result<bool, StoreError> {
        self.store.exists(&self.marker_key(label, NO_APPLY_MARKER))
    }

    /// Terminal state of the quad, checking markers in precedence order.
    pub fn state(&self, label: &str) -> Result<QuadState, StoreError> {
        if self.is_complete(label)? {
            Ok(QuadState::Complete)
        } else if self.is_corrupt(label)? {
            Ok(QuadState::Corrupt)
        } else if self.is_no_apply(label)? {
            Ok(QuadState::NoApply)
        } else {
            Ok(QuadState::NotStarted)
        }
    }

    pub fn mark_complete(&self, label: &str) -> Result<(), StoreError> {
        self.store
            .put_marker(&self.marker_key(label, COMPLETE_MARKER))
    }

    pub fn mark_corrupt(&self, label: &str) -> Result<(), StoreError> {
        self.store
            .put_marker(&self.marker_key(label, CORRUPT_MARKER))
    }

    pub fn mark_no_apply(&self, label: &str) -> Result<(), StoreError> {
        self.store
            .put_marker(&self.marker_key(label, NO_APPLY_MARKER))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LocalStore;
    use tempfile::TempDir;

    fn client() -> (TempDir, MarkerClient) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(LocalStore::new(dir.path()));
        (dir, MarkerClient::new(store, "outputs"))
    }

    #[test]
    fn test_marker_key_layout() {
        let (_dir, client) = client();
        assert_eq!(
            client.marker_key("L15-0331E-1257N", COMPLETE_MARKER),
            "outputs/L15-0331E-1257N/application_complete"
        );
    }

    #[test]
    fn test_fresh_quad_is_not_started() {
        let (_dir, client) = client();
        assert_eq!(client.state("L15-0001E-0001N").unwrap(), QuadState::NotStarted);
        assert!(!client.is_complete("L15-0001E-0001N").unwrap());
    }

    #[test]
    fn test_each_marker_maps_to_its_state() {
        let (_dir, client) = client();
        client.mark_complete("a").unwrap();
        client.mark_corrupt("b").unwrap();
        client.mark_no_apply("c").unwrap();

        assert_eq!(client.state("a").unwrap(), QuadState::Complete);
        assert_eq!(client.state("b").unwrap(), QuadState::Corrupt);
        assert_eq!(client.state("c").unwrap(), QuadState::NoApply);
    }

    #[test]
    fn test_marking_is_idempotent() {
        let (_dir, client) = client();
        client.mark_no_apply("q").unwrap();
        client.mark_no_apply("q").unwrap();
        assert_eq!(client.state("q").unwrap(), QuadState::NoApply);
    }
}

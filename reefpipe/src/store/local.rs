//! Filesystem-rooted object store.

use super::{ObjectStore, StoreError};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Object store mapping keys to paths under a root directory.
///
/// Used in production on clusters whose workers share a filesystem, and in
/// tests over a temporary directory.
///
/// # Example
///
/// ```no_run
/// use reefpipe::store::{LocalStore, ObjectStore};
///
/// let store = LocalStore::new("/mnt/reef/store");
/// let quads = store.list("quads")?;
/// # Ok::<(), reefpipe::store::StoreError>(())
/// ```
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a key to a path under the root, rejecting traversal.
    fn resolve(&self, key: &str) -> Result<PathBuf, StoreError> {
        let rel = Path::new(key);
        let traverses = rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if key.is_empty() || traverses {
            return Err(StoreError::InvalidKey {
                key: key.to_string(),
            });
        }
        Ok(self.root.join(rel))
    }

    fn io_err(key: &str, source: std::io::Error) -> StoreError {
        StoreError::Io {
            key: key.to_string(),
            source,
        }
    }

    fn collect_keys(
        &self,
        dir: &Path,
        prefix: &str,
        out: &mut Vec<String>,
    ) -> Result<(), StoreError> {
        for entry in fs::read_dir(dir).map_err(|e| Self::io_err(prefix, e))? {
            let entry = entry.map_err(|e| Self::io_err(prefix, e))?;
            let path = entry.path();
            if path.is_dir() {
                self.collect_keys(&path, prefix, out)?;
            } else {
                let rel = path
                    .strip_prefix(&self.root)
                    .expect("entry is under the store root");
                // Keys are '/'-separated regardless of platform
                let key = rel
                    .components()
                    .filter_map(|c| c.as_os_str().to_str())
                    .collect::<Vec<_>>()
                    .join("/");
                out.push(key);
            }
        }
        Ok(())
    }
}

impl ObjectStore for LocalStore {
    fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let dir = self.resolve(prefix)?;
        let mut out = Vec::new();
        if dir.is_dir() {
            self.collect_keys(&dir, prefix, &mut out)?;
        }
        Ok(out)
    }

    fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.resolve(key)?.is_file())
    }

    fn fetch(&self, key: &str, dest: &Path) -> Result<(), StoreError> {
        let src = self.resolve(key)?;
        if !src.is_file() {
            return Err(StoreError::NotFound {
                key: key.to_string(),
            });
        }
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| Self::io_err(key, e))?;
        }
        fs::copy(&src, dest).map_err(|e| Self::io_err(key, e))?;
        Ok(())
    }

    fn put(&self, src: &Path, key: &str) -> Result<(), StoreError> {
        let dest = self.resolve(key)?;
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| Self::io_err(key, e))?;
        }
        fs::copy(src, &dest).map_err(|e| Self::io_err(key, e))?;
        Ok(())
    }

    fn put_marker(&self, key: &str) -> Result<(), StoreError> {
        let dest = self.resolve(key)?;
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| Self::io_err(key, e))?;
        }
        fs::write(&dest, b"").map_err(|e| Self::io_err(key, e))?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let path = self.resolve(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::io_err(key, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, LocalStore) {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn test_list_missing_prefix_is_empty() {
        let (_dir, store) = store();
        assert!(store.list("quads").unwrap().is_empty());
    }

    #[test]
    fn test_put_list_fetch_round_trip() {
        let (dir, store) = store();
        let local = dir.path().join("payload.bin");
        fs::write(&local, b"raster bytes").unwrap();

        store.put(&local, "quads/L15-0001E-0002N.tif").unwrap();

        let mut keys = store.list("quads").unwrap();
        keys.sort();
        assert_eq!(keys, vec!["quads/L15-0001E-0002N.tif"]);

        let fetched = dir.path().join("fetched.bin");
        store.fetch("quads/L15-0001E-0002N.tif", &fetched).unwrap();
        assert_eq!(fs::read(&fetched).unwrap(), b"raster bytes");
    }

    #[test]
    fn test_list_recurses_subtrees() {
        let (dir, store) = store();
        let local = dir.path().join("payload.bin");
        fs::write(&local, b"x").unwrap();
        store.put(&local, "quads/test/L15-0001E-0001N.tif").unwrap();
        store.put(&local, "quads/L15-0002E-0002N.tif").unwrap();

        let mut keys = store.list("quads").unwrap();
        keys.sort();
        assert_eq!(
            keys,
            vec![
                "quads/L15-0002E-0002N.tif",
                "quads/test/L15-0001E-0001N.tif"
            ]
        );
    }

    #[test]
    fn test_marker_is_empty_and_idempotent() {
        let (dir, store) = store();
        store.put_marker("out/q/application_complete").unwrap();
        store.put_marker("out/q/application_complete").unwrap();
        assert!(store.exists("out/q/application_complete").unwrap());
        assert_eq!(
            fs::read(dir.path().join("out/q/application_complete")).unwrap(),
            b""
        );
    }

    #[test]
    fn test_delete_missing_is_ok() {
        let (_dir, store) = store();
        store.delete("nope/missing").unwrap();
    }

    #[test]
    fn test_fetch_missing_is_not_found() {
        let (dir, store) = store();
        let err = store
            .fetch("quads/missing.tif", &dir.path().join("out"))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn test_traversal_keys_rejected() {
        let (_dir, store) = store();
        assert!(matches!(
            store.exists("../escape").unwrap_err(),
            StoreError::InvalidKey { .. }
        ));
        assert!(matches!(
            store.exists("").unwrap_err(),
            StoreError::InvalidKey { .. }
        ));
    }
}

use crate::error::StorageError;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;

/// Object storage write primitive. A later put to the same (bucket, path)
/// replaces the earlier bytes.
pub trait ObjectStore {
    fn put(&self, bucket: &str, path: &str, bytes: &[u8]) -> Result<(), StorageError>;
}

/// Stores objects as files under `<root>/<bucket>/<path>`.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn object_path(&self, bucket: &str, path: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(bucket).join(path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if bucket.is_empty() || path.is_empty() || escapes {
            return Err(StorageError::InvalidPath(relative.display().to_string()));
        }
        Ok(self.root.join(relative))
    }
}

impl ObjectStore for FsObjectStore {
    fn put(&self, bucket: &str, path: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let target = self.object_path(bucket, path)?;
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&target, bytes)?;
        Ok(())
    }
}

/// In-process store keyed by (bucket, path).
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: Mutex<BTreeMap<(String, String), Vec<u8>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, bucket: &str, path: &str) -> Option<Vec<u8>> {
        let guard = self.objects.lock().ok()?;
        guard.get(&(bucket.to_string(), path.to_string())).cloned()
    }

    pub fn snapshot(&self) -> BTreeMap<(String, String), Vec<u8>> {
        self.objects
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ObjectStore for MemoryObjectStore {
    fn put(&self, bucket: &str, path: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let mut guard = self
            .objects
            .lock()
            .map_err(|e| StorageError::Io(std::io::Error::other(e.to_string())))?;
        guard.insert((bucket.to_string(), path.to_string()), bytes.to_vec());
        Ok(())
    }
}

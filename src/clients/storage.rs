//! Object-store collaborator.
//!
//! The sync connector writes message batches into a bucket; the parser
//! reads them and the cleanup handler empties the bucket at teardown.
//! `FsObjectStore` maps buckets to directories under a configured root.
//! `MemoryObjectStore` backs tests.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::StorageError;

/// Read/list/delete access to named buckets of objects.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Read an object's full body.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError>;

    /// List every key in a bucket.
    async fn list_keys(&self, bucket: &str) -> Result<Vec<String>, StorageError>;

    /// Delete a single object.
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StorageError>;
}

// ── Filesystem-backed store ─────────────────────────────────────────

/// Object store over a local directory tree: `<root>/<bucket>/<key>`.
/// Keys may contain `/` and map to nested directories.
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn object_path(&self, bucket: &str, key: &str) -> PathBuf {
        self.root.join(bucket).join(key)
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.object_path(bucket, key);
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StorageError::ObjectNotFound {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list_keys(&self, bucket: &str) -> Result<Vec<String>, StorageError> {
        let base = self.root.join(bucket);
        if !base.exists() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        let mut pending = vec![base.clone()];
        while let Some(dir) = pending.pop() {
            let mut entries = fs::read_dir(&dir).await.map_err(|e| {
                StorageError::ListFailed {
                    bucket: bucket.to_string(),
                    reason: e.to_string(),
                }
            })?;
            while let Some(entry) = entries.next_entry().await.map_err(|e| {
                StorageError::ListFailed {
                    bucket: bucket.to_string(),
                    reason: e.to_string(),
                }
            })? {
                let path = entry.path();
                if path.is_dir() {
                    pending.push(path);
                } else if let Ok(relative) = path.strip_prefix(&base) {
                    keys.push(relative.to_string_lossy().replace('\\', "/"));
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        let path = self.object_path(bucket, key);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StorageError::ObjectNotFound {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }
}

// ── In-memory store ─────────────────────────────────────────────────

/// In-memory object store for tests and local wiring.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<(String, String), Vec<u8>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object (test setup).
    pub async fn put_object(&self, bucket: &str, key: &str, body: impl Into<Vec<u8>>) {
        let mut objects = self.objects.write().await;
        objects.insert((bucket.to_string(), key.to_string()), body.into());
    }

    /// Number of objects in a bucket.
    pub async fn object_count(&self, bucket: &str) -> usize {
        let objects = self.objects.read().await;
        objects.keys().filter(|(b, _)| b == bucket).count()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        let objects = self.objects.read().await;
        objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| StorageError::ObjectNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }

    async fn list_keys(&self, bucket: &str) -> Result<Vec<String>, StorageError> {
        let objects = self.objects.read().await;
        let mut keys: Vec<String> = objects
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        let mut objects = self.objects.write().await;
        objects
            .remove(&(bucket.to_string(), key.to_string()))
            .map(|_| {
                debug!(bucket, key, "Deleted object");
            })
            .ok_or_else(|| StorageError::ObjectNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }
}

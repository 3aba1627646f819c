//! Filesystem Mirror Backend
//!
//! One file per key under a root directory, written via `tokio::fs`. This is
//! the durable backend: mirrored entries survive process restarts, which is
//! the point of opting into the mirror at all. Keys are percent-encoded into
//! file names so separators and other path-hostile characters round-trip.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;

use super::{MirrorBackend, MirrorBackendStats};
use crate::error::{Error, Result};

/// Filesystem-backed mirror
pub struct FsMirrorBackend {
    /// Directory holding one file per mirrored key
    root: PathBuf,
    /// Statistics (object count and bytes seeded from disk at construction)
    object_count: AtomicU64,
    total_bytes: AtomicU64,
    reads: AtomicU64,
    writes: AtomicU64,
    deletes: AtomicU64,
}

impl FsMirrorBackend {
    /// Open (or create) a mirror rooted at `root`, seeding statistics from
    /// whatever entries already exist on disk.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;

        let mut object_count = 0u64;
        let mut total_bytes = 0u64;
        for dir_entry in std::fs::read_dir(&root)? {
            let metadata = dir_entry?.metadata()?;
            if metadata.is_file() {
                object_count += 1;
                total_bytes += metadata.len();
            }
        }

        Ok(Self {
            root,
            object_count: AtomicU64::new(object_count),
            total_bytes: AtomicU64::new(total_bytes),
            reads: AtomicU64::new(0),
            writes: AtomicU64::new(0),
            deletes: AtomicU64::new(0),
        })
    }

    /// Mirror root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(urlencoding::encode(key).into_owned())
    }

    fn file_name_to_key(name: &std::ffi::OsStr) -> Result<String> {
        let name = name
            .to_str()
            .ok_or_else(|| Error::InvalidMirrorKey(name.to_string_lossy().into_owned()))?;
        let decoded = urlencoding::decode(name)
            .map_err(|_| Error::InvalidMirrorKey(name.to_string()))?;
        Ok(decoded.into_owned())
    }
}

#[async_trait]
impl MirrorBackend for FsMirrorBackend {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        self.reads.fetch_add(1, Ordering::Relaxed);

        match tokio::fs::read(self.path_for(key)).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, key: &str, data: Bytes) -> Result<()> {
        self.writes.fetch_add(1, Ordering::Relaxed);

        let path = self.path_for(key);
        let old_size = tokio::fs::metadata(&path).await.ok().map(|m| m.len());

        tokio::fs::write(&path, &data).await?;

        let size = data.len() as u64;
        match old_size {
            Some(old) => {
                if size > old {
                    self.total_bytes.fetch_add(size - old, Ordering::Relaxed);
                } else {
                    self.total_bytes.fetch_sub(old - size, Ordering::Relaxed);
                }
            }
            None => {
                self.object_count.fetch_add(1, Ordering::Relaxed);
                self.total_bytes.fetch_add(size, Ordering::Relaxed);
            }
        }

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.deletes.fetch_add(1, Ordering::Relaxed);

        let path = self.path_for(key);
        let old_size = tokio::fs::metadata(&path).await.ok().map(|m| m.len());

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                self.object_count.fetch_sub(1, Ordering::Relaxed);
                if let Some(old) = old_size {
                    self.total_bytes.fetch_sub(old, Ordering::Relaxed);
                }
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        self.reads.fetch_add(1, Ordering::Relaxed);

        let mut keys = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.root).await?;
        while let Some(dir_entry) = dir.next_entry().await? {
            if !dir_entry.file_type().await?.is_file() {
                continue;
            }
            let key = Self::file_name_to_key(&dir_entry.file_name())?;
            if key.starts_with(prefix) {
                keys.push(key);
            }
        }
        Ok(keys)
    }

    fn stats(&self) -> MirrorBackendStats {
        MirrorBackendStats {
            object_count: self.object_count.load(Ordering::Relaxed),
            total_bytes: self.total_bytes.load(Ordering::Relaxed),
            reads: self.reads.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

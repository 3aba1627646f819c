//! In-Memory Mirror Backend
//!
//! DashMap-backed mirror for tests and ephemeral use. Useful for exercising
//! the promotion path without touching disk; offers no durability.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;

use super::{MirrorBackend, MirrorBackendStats};
use crate::error::Result;

/// In-memory mirror backend
pub struct InMemoryMirrorBackend {
    /// Namespaced key -> serialized entry
    storage: DashMap<String, Bytes>,
    /// Statistics
    object_count: AtomicU64,
    total_bytes: AtomicU64,
    reads: AtomicU64,
    writes: AtomicU64,
    deletes: AtomicU64,
}

impl Default for InMemoryMirrorBackend {
    fn default() -> Self {
        Self {
            storage: DashMap::new(),
            object_count: AtomicU64::new(0),
            total_bytes: AtomicU64::new(0),
            reads: AtomicU64::new(0),
            writes: AtomicU64::new(0),
            deletes: AtomicU64::new(0),
        }
    }
}

impl InMemoryMirrorBackend {
    /// Create a new in-memory backend
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MirrorBackend for InMemoryMirrorBackend {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        Ok(self.storage.get(key).map(|data| data.clone()))
    }

    async fn put(&self, key: &str, data: Bytes) -> Result<()> {
        self.writes.fetch_add(1, Ordering::Relaxed);

        let size = data.len() as u64;
        let old = self.storage.insert(key.to_string(), data);

        if let Some(old_data) = old {
            // Update size delta
            let old_size = old_data.len() as u64;
            if size > old_size {
                self.total_bytes
                    .fetch_add(size - old_size, Ordering::Relaxed);
            } else {
                self.total_bytes
                    .fetch_sub(old_size - size, Ordering::Relaxed);
            }
        } else {
            self.object_count.fetch_add(1, Ordering::Relaxed);
            self.total_bytes.fetch_add(size, Ordering::Relaxed);
        }

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.deletes.fetch_add(1, Ordering::Relaxed);

        if let Some((_, data)) = self.storage.remove(key) {
            self.object_count.fetch_sub(1, Ordering::Relaxed);
            self.total_bytes
                .fetch_sub(data.len() as u64, Ordering::Relaxed);
            return Ok(true);
        }
        Ok(false)
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        Ok(self
            .storage
            .iter()
            .filter(|item| item.key().starts_with(prefix))
            .map(|item| item.key().clone())
            .collect())
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

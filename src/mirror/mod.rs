//! Persisted Mirror - Slower Secondary Tier
//!
//! A pluggable key-value backend holding serialized copies of cache entries.
//! The mirror is never authoritative: memory is written first and consulted
//! first, and wins on conflict. Backends store opaque bytes under fully
//! namespaced keys (`"cache_" + original_key`) so a shared store can host
//! unrelated data alongside this cache's entries.
//!
//! # Design
//!
//! - Async I/O so slow backends never block the in-memory path
//! - No transactions: last writer wins, no atomicity across mirror + memory

mod fs;
mod memory;

pub use fs::FsMirrorBackend;
pub use memory::InMemoryMirrorBackend;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;
use crate::MIRROR_KEY_PREFIX;

/// Persisted mirror backend
#[async_trait]
pub trait MirrorBackend: Send + Sync {
    /// Read the bytes stored under a namespaced key
    async fn get(&self, key: &str) -> Result<Option<Bytes>>;

    /// Write bytes under a namespaced key
    async fn put(&self, key: &str, data: Bytes) -> Result<()>;

    /// Delete a namespaced key; returns whether anything was removed
    async fn delete(&self, key: &str) -> Result<bool>;

    /// All stored keys starting with `prefix`
    async fn keys(&self, prefix: &str) -> Result<Vec<String>>;

    /// Backend operation statistics
    fn stats(&self) -> MirrorBackendStats;
}

/// Mirror backend statistics
#[derive(Debug, Clone, Default)]
pub struct MirrorBackendStats {
    /// Total objects stored
    pub object_count: u64,
    /// Total bytes stored
    pub total_bytes: u64,
    /// Read operations
    pub reads: u64,
    /// Write operations
    pub writes: u64,
    /// Delete operations
    pub deletes: u64,
}

/// Namespaced mirror key for a cache key
pub fn mirror_key(key: &str) -> String {
    format!("{MIRROR_KEY_PREFIX}{key}")
}

/// Cache key for a namespaced mirror key, if it belongs to this cache
pub fn cache_key(mirror_key: &str) -> Option<&str> {
    mirror_key.strip_prefix(MIRROR_KEY_PREFIX)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mirror_key_roundtrip() {
        let namespaced = mirror_key("readings:2024-01-01");
        assert_eq!(namespaced, "cache_readings:2024-01-01");
        assert_eq!(cache_key(&namespaced), Some("readings:2024-01-01"));
    }

    #[test]
    fn test_cache_key_rejects_foreign_entries() {
        assert_eq!(cache_key("session_abc"), None);
        assert_eq!(cache_key("cache"), None);
    }
}

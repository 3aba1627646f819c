//! TTL Cache Manager - Unified Two-Tier Cache
//!
//! Ties the authoritative in-memory store to the optional persisted mirror.
//! Lookups go memory-first; a live mirror hit is promoted back into memory so
//! subsequent lookups are fast. A miss is a valid return, never an error, and
//! mirror I/O failures are logged and swallowed: the cache is an optional
//! optimization over recomputation, so "value not found" is always safe.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::clock::{Clock, SystemClock};
use crate::entry::CacheEntry;
use crate::mirror::{cache_key, mirror_key, InMemoryMirrorBackend, MirrorBackend};
use crate::store::{MemoryStore, StoreStats};
use crate::{DEFAULT_CAPACITY, DEFAULT_TTL, MIRROR_KEY_PREFIX};

/// Cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Soft upper bound on in-memory entry count
    pub capacity: usize,
    /// TTL applied when a set carries none
    pub default_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            default_ttl: DEFAULT_TTL,
        }
    }
}

/// Per-operation options for `set` (and the memoization wrapper)
#[derive(Debug, Clone, Default)]
pub struct CacheOptions {
    /// TTL for this entry; the cache default applies when `None`
    pub ttl: Option<Duration>,
    /// Also write/read the persisted mirror
    pub use_mirror: bool,
    /// Capacity bound for this call's eviction check only
    pub capacity: Option<usize>,
}

/// Cache statistics snapshot
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Entries currently held in memory
    pub memory_entries: usize,
    /// Entries this cache owns in the mirror namespace
    pub mirror_entries: usize,
    /// Deduplicated union of memory and mirror key sets (diagnostics only)
    pub total_distinct_keys: usize,
    /// Memory store counters
    pub memory: StoreStats,
}

/// Two-tier TTL cache
pub struct TtlCache<T> {
    /// Authoritative in-memory store
    store: MemoryStore<T>,
    /// Optional persisted mirror; per-operation flags are no-ops without one
    mirror: Option<Arc<dyn MirrorBackend>>,
    /// Time source
    clock: Arc<dyn Clock>,
}

impl<T> TtlCache<T> {
    /// Memory-only cache with the given configuration
    pub fn new(config: CacheConfig) -> Self {
        Self::with_parts(config, None, Arc::new(SystemClock))
    }

    /// Cache backed by the given mirror
    pub fn with_mirror(config: CacheConfig, mirror: Arc<dyn MirrorBackend>) -> Self {
        Self::with_parts(config, Some(mirror), Arc::new(SystemClock))
    }

    /// Default configuration with an in-memory mirror (for tests and
    /// ephemeral use)
    pub fn in_memory() -> Self {
        Self::with_mirror(
            CacheConfig::default(),
            Arc::new(InMemoryMirrorBackend::new()),
        )
    }

    /// Fully explicit constructor; the injectable clock makes TTL behavior
    /// deterministic under test
    pub fn with_parts(
        config: CacheConfig,
        mirror: Option<Arc<dyn MirrorBackend>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store: MemoryStore::new(config.capacity, config.default_ttl),
            mirror,
            clock,
        }
    }

    /// The in-memory store (synchronous counters and occupancy)
    pub fn store(&self) -> &MemoryStore<T> {
        &self.store
    }

    /// Mirror backend statistics, when a mirror is configured
    pub fn mirror_stats(&self) -> Option<crate::mirror::MirrorBackendStats> {
        self.mirror.as_ref().map(|m| m.stats())
    }

    fn now(&self) -> u64 {
        self.clock.now_millis()
    }
}

impl<T> TtlCache<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync,
{
    /// Insert or overwrite an entry.
    ///
    /// Memory is written first and is authoritative. With
    /// `options.use_mirror`, a serialized copy also goes to the mirror under
    /// the namespaced key; mirror failures are logged and swallowed.
    pub async fn set(&self, key: &str, value: T, options: CacheOptions) {
        let now = self.now();
        let ttl = options.ttl.unwrap_or_else(|| self.store.default_ttl());
        let entry = CacheEntry::new(value, now, ttl);

        let mirror_copy = if options.use_mirror && self.mirror.is_some() {
            Some(entry.clone())
        } else {
            None
        };

        if let Some(evicted) = self.store.insert_entry(key, entry, now, options.capacity) {
            tracing::debug!(key, evicted = %evicted, "evicted oldest entry to hold capacity bound");
        }

        if let (Some(entry), Some(mirror)) = (mirror_copy, self.mirror.as_ref()) {
            match serde_json::to_vec(&entry) {
                Ok(encoded) => {
                    if let Err(e) = mirror.put(&mirror_key(key), encoded.into()).await {
                        tracing::warn!(key, error = %e, "mirror write failed; entry is memory-only");
                    }
                }
                Err(e) => {
                    tracing::warn!(key, error = %e, "entry not serializable; entry is memory-only");
                }
            }
        }
    }

    /// Look up a live value, memory first.
    ///
    /// On a memory miss with `use_mirror`, a live mirror entry is promoted
    /// into memory (original timestamps kept) and returned; an expired mirror
    /// entry is deleted from the mirror. Mirror failures read as a miss.
    pub async fn get(&self, key: &str, use_mirror: bool) -> Option<T> {
        let now = self.now();

        if let Some(value) = self.store.get(key, now) {
            return Some(value);
        }

        if !use_mirror {
            return None;
        }
        let mirror = self.mirror.as_ref()?;

        let namespaced = mirror_key(key);
        let data = match mirror.get(&namespaced).await {
            Ok(Some(data)) => data,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(key, error = %e, "mirror read failed; treating as miss");
                return None;
            }
        };

        let entry: CacheEntry<T> = match serde_json::from_slice(&data) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(key, error = %e, "mirror entry undecodable; treating as miss");
                return None;
            }
        };

        if entry.is_expired(now) {
            if let Err(e) = mirror.delete(&namespaced).await {
                tracing::warn!(key, error = %e, "failed to delete expired mirror entry");
            }
            return None;
        }

        tracing::debug!(key, "promoting mirror hit into memory");
        let value = entry.value.clone();
        self.store.insert_entry(key, entry, now, None);
        Some(value)
    }

    /// Whether a live value exists; defined as `get(...).is_some()`
    pub async fn has(&self, key: &str, use_mirror: bool) -> bool {
        self.get(key, use_mirror).await.is_some()
    }

    /// Remove an entry. Idempotent; absent keys are a no-op, not an error.
    pub async fn delete(&self, key: &str, use_mirror: bool) {
        self.store.remove(key);

        if use_mirror {
            if let Some(mirror) = self.mirror.as_ref() {
                if let Err(e) = mirror.delete(&mirror_key(key)).await {
                    tracing::warn!(key, error = %e, "mirror delete failed");
                }
            }
        }
    }

    /// Empty the memory store; with `use_mirror`, also remove every mirror
    /// key in this cache's namespace, leaving unrelated mirror entries alone.
    pub async fn clear(&self, use_mirror: bool) {
        self.store.clear();

        if !use_mirror {
            return;
        }
        let Some(mirror) = self.mirror.as_ref() else {
            return;
        };

        let keys = match mirror.keys(MIRROR_KEY_PREFIX).await {
            Ok(keys) => keys,
            Err(e) => {
                tracing::warn!(error = %e, "mirror clear failed to enumerate keys");
                return;
            }
        };
        for key in keys {
            if let Err(e) = mirror.delete(&key).await {
                tracing::warn!(key = %key, error = %e, "mirror clear failed to delete key");
            }
        }
    }

    /// Read-only statistics: memory and mirror occupancy plus the
    /// deduplicated union of both key sets. Diagnostics only, never used for
    /// correctness decisions.
    pub async fn stats(&self) -> CacheStats {
        let memory_keys = self.store.keys();

        let mirror_keys = match self.mirror.as_ref() {
            Some(mirror) => match mirror.keys(MIRROR_KEY_PREFIX).await {
                Ok(keys) => keys,
                Err(e) => {
                    tracing::warn!(error = %e, "mirror stats enumeration failed");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        let mut distinct: HashSet<&str> = memory_keys.iter().map(String::as_str).collect();
        for key in &mirror_keys {
            if let Some(stripped) = cache_key(key) {
                distinct.insert(stripped);
            }
        }

        CacheStats {
            memory_entries: memory_keys.len(),
            mirror_entries: mirror_keys.len(),
            total_distinct_keys: distinct.len(),
            memory: self.store.stats(),
        }
    }

    /// Return the cached value for `key`, or run `f`, cache its result under
    /// `key` with `options`, and return it. Errors from `f` propagate
    /// unchanged and are never cached.
    pub async fn get_or_compute<E, Fut, F>(
        &self,
        key: &str,
        options: CacheOptions,
        f: F,
    ) -> std::result::Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = std::result::Result<T, E>>,
    {
        if let Some(value) = self.get(key, options.use_mirror).await {
            return Ok(value);
        }

        let value = f().await?;
        self.set(key, value.clone(), options).await;
        Ok(value)
    }
}

impl<T> std::fmt::Debug for TtlCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("store", &self.store)
            .field("has_mirror", &self.mirror.is_some())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

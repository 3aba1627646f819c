//! In-Memory Store
//!
//! The authoritative tier: a mutex-guarded map of string keys to
//! [`CacheEntry`] values with a soft capacity bound.
//!
//! # Design
//!
//! - Every insert runs a full expiry sweep, so the map never accumulates dead
//!   entries between writes and no background timer is needed.
//! - When an insert leaves the map over capacity, exactly one entry is
//!   evicted: the globally oldest by insertion time, ties broken by the
//!   lexicographically smallest key. A soft bound, not a drain.
//! - Eviction is oldest-by-write, not LRU: reads never touch `inserted_at`.
//! - O(n) sweep and eviction scans are acceptable because n is bounded by the
//!   capacity (tens to low hundreds of entries).
//!
//! Callers supply `now` explicitly; the store holds no clock of its own.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use crate::entry::CacheEntry;

/// In-memory key-value store with TTL expiry and bounded size
pub struct MemoryStore<T> {
    /// Key-value storage
    entries: Mutex<HashMap<String, CacheEntry<T>>>,
    /// Soft upper bound on entry count
    capacity: usize,
    /// TTL applied when an insert carries none
    default_ttl: Duration,
    /// Hit count
    hits: AtomicU64,
    /// Miss count (expired reads count as misses)
    misses: AtomicU64,
    /// Capacity evictions
    evictions: AtomicU64,
    /// Entries removed because their TTL lapsed
    expirations: AtomicU64,
}

impl<T> MemoryStore<T> {
    /// Create a store with the given soft capacity and default TTL
    pub fn new(capacity: usize, default_ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity,
            default_ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            expirations: AtomicU64::new(0),
        }
    }

    /// Insert or overwrite an entry.
    ///
    /// Overwriting resets both value and expiry window; the previous TTL has
    /// no further effect. Runs the expiry sweep and, if the map is left over
    /// `capacity_override.unwrap_or(self.capacity)`, evicts the single oldest
    /// entry. Returns the evicted key, if any.
    pub fn insert(
        &self,
        key: impl Into<String>,
        value: T,
        ttl: Option<Duration>,
        now: u64,
        capacity_override: Option<usize>,
    ) -> Option<String> {
        let entry = CacheEntry::new(value, now, ttl.unwrap_or(self.default_ttl));
        self.insert_entry(key, entry, now, capacity_override)
    }

    /// Insert a pre-built entry, keeping its timestamps.
    ///
    /// Used for promoting mirror hits back into memory; runs the same sweep
    /// and eviction maintenance as a caller insert so the bound holds on
    /// either path.
    pub fn insert_entry(
        &self,
        key: impl Into<String>,
        entry: CacheEntry<T>,
        now: u64,
        capacity_override: Option<usize>,
    ) -> Option<String> {
        let capacity = capacity_override.unwrap_or(self.capacity);
        let mut entries = self.entries.lock();

        entries.insert(key.into(), entry);

        // Expiry sweep: drop every dead entry in one pass
        let before = entries.len();
        entries.retain(|_, e| !e.is_expired(now));
        let swept = before - entries.len();
        if swept > 0 {
            self.expirations.fetch_add(swept as u64, Ordering::Relaxed);
        }

        // Soft bound: at most one eviction per insert
        if entries.len() > capacity {
            if let Some(victim) = Self::oldest_key(&entries) {
                entries.remove(&victim);
                self.evictions.fetch_add(1, Ordering::Relaxed);
                return Some(victim);
            }
        }

        None
    }

    /// Key with the minimum `inserted_at`; ties resolve to the
    /// lexicographically smallest key so eviction is deterministic.
    fn oldest_key(entries: &HashMap<String, CacheEntry<T>>) -> Option<String> {
        entries
            .iter()
            .min_by(|(ka, a), (kb, b)| {
                a.inserted_at
                    .cmp(&b.inserted_at)
                    .then_with(|| ka.as_str().cmp(kb.as_str()))
            })
            .map(|(k, _)| k.clone())
    }

    /// Remove an entry unconditionally. Idempotent: absent keys are a no-op.
    pub fn remove(&self, key: &str) -> Option<CacheEntry<T>> {
        self.entries.lock().remove(key)
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Live-or-not entry count (expired entries linger until the next
    /// sweep or read, so this may briefly include dead entries)
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the store holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Snapshot of all stored keys
    pub fn keys(&self) -> Vec<String> {
        self.entries.lock().keys().cloned().collect()
    }

    /// Soft capacity bound
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// TTL applied when an insert carries none
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Hit count
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Miss count
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Capacity eviction count
    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    /// TTL expiration count
    pub fn expirations(&self) -> u64 {
        self.expirations.load(Ordering::Relaxed)
    }

    /// Hit ratio (0.0 - 1.0)
    pub fn hit_ratio(&self) -> f64 {
        let hits = self.hits() as f64;
        let total = hits + self.misses() as f64;
        if total == 0.0 {
            0.0
        } else {
            hits / total
        }
    }

    /// Counter and occupancy snapshot
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            entries: self.len(),
            capacity: self.capacity,
            hits: self.hits(),
            misses: self.misses(),
            evictions: self.evictions(),
            expirations: self.expirations(),
            hit_ratio: self.hit_ratio(),
        }
    }
}

impl<T: Clone> MemoryStore<T> {
    /// Look up a live value. Expired entries are removed on sight and count
    /// as misses; a miss is a valid return, never an error.
    pub fn get(&self, key: &str, now: u64) -> Option<T> {
        let mut entries = self.entries.lock();

        match entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key);
                self.expirations.fetch_add(1, Ordering::Relaxed);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.value.clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Full entry (value plus timestamps) if live; same removal and counting
    /// behavior as [`get`](Self::get)
    pub fn get_entry(&self, key: &str, now: u64) -> Option<CacheEntry<T>> {
        let mut entries = self.entries.lock();

        match entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key);
                self.expirations.fetch_add(1, Ordering::Relaxed);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }
}

impl<T> std::fmt::Debug for MemoryStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("entries", &self.len())
            .field("capacity", &self.capacity)
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}

/// Store statistics snapshot
#[derive(Debug, Clone)]
pub struct StoreStats {
    /// Current entry count
    pub entries: usize,
    /// Soft capacity bound
    pub capacity: usize,
    /// Hit count
    pub hits: u64,
    /// Miss count
    pub misses: u64,
    /// Capacity eviction count
    pub evictions: u64,
    /// TTL expiration count
    pub expirations: u64,
    /// Hit ratio (0.0 - 1.0)
    pub hit_ratio: f64,
}

// =============================================================================
// Tests
// =============================================================================

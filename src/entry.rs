//! Cache Entry Type
//!
//! A value paired with its insertion and expiry instants. The same struct is
//! the on-wire envelope for the persisted mirror, so the timestamps are epoch
//! milliseconds and the type derives serde.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A cached value with its expiry window
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheEntry<T> {
    /// The cached payload (opaque to the cache)
    pub value: T,
    /// Epoch milliseconds of insertion or last overwrite
    pub inserted_at: u64,
    /// Epoch milliseconds at which the entry becomes logically absent
    pub expires_at: u64,
}

impl<T> CacheEntry<T> {
    /// Create an entry inserted at `now` that expires after `ttl`.
    ///
    /// A zero TTL yields an entry that is already expired at `now`.
    pub fn new(value: T, now: u64, ttl: Duration) -> Self {
        let ttl_millis = ttl.as_millis().min(u128::from(u64::MAX)) as u64;
        Self {
            value,
            inserted_at: now,
            expires_at: now.saturating_add(ttl_millis),
        }
    }

    /// Whether the entry is logically absent at `now`
    #[inline]
    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.expires_at
    }

    /// Milliseconds of life remaining at `now` (zero once expired)
    #[inline]
    pub fn remaining_millis(&self, now: u64) -> u64 {
        self.expires_at.saturating_sub(now)
    }
}

// =============================================================================
// Tests
// =============================================================================

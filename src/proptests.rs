//! Property-Based Tests for the Memory Store
//!
//! Uses proptest to verify TTL and eviction behavior across a wide range of
//! inputs.
//!
//! # Test Properties
//!
//! 1. **TTL Correctness**: a value set at `t` with ttl is present for reads
//!    strictly before `t + ttl` and absent from `t + ttl` on
//! 2. **Size Bound**: the store never exceeds its capacity after any insert
//! 3. **Eviction Target**: when eviction fires it removes the entry with the
//!    minimum insertion time
//! 4. **Overwrite Reset**: the second write's window fully replaces the first

#![cfg(test)]

use std::time::Duration;

use proptest::prelude::*;

use crate::store::MemoryStore;

// =============================================================================
// Property Strategies
// =============================================================================

/// Strategy for TTLs from zero to one minute in milliseconds.
fn ttl_strategy() -> impl Strategy<Value = u64> {
    0u64..60_000
}

/// Strategy for read offsets covering both sides of typical TTL windows.
fn offset_strategy() -> impl Strategy<Value = u64> {
    0u64..120_000
}

/// Strategy for small key sets with duplicates likely.
fn key_strategy() -> impl Strategy<Value = String> {
    (0u32..20).prop_map(|n| format!("key-{n}"))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: present iff the read happens strictly inside the TTL window.
    #[test]
    fn prop_ttl_presence(ttl in ttl_strategy(), offset in offset_strategy()) {
        let store = MemoryStore::new(16, Duration::from_secs(300));
        store.insert("k", 1u8, Some(Duration::from_millis(ttl)), 1_000, None);

        let read_at = 1_000 + offset;
        let got = store.get("k", read_at);

        if offset < ttl {
            prop_assert_eq!(got, Some(1u8));
        } else {
            prop_assert_eq!(got, None);
        }
    }

    /// Property: after any insert sequence the store holds at most
    /// `capacity + 1` entries (one insert can overshoot the soft bound by
    /// at most the entry it just added before evicting exactly one).
    #[test]
    fn prop_size_soft_bound(
        keys in prop::collection::vec(key_strategy(), 1..60),
        capacity in 1usize..8,
    ) {
        let store = MemoryStore::new(capacity, Duration::from_secs(300));

        for (i, key) in keys.iter().enumerate() {
            store.insert(
                key.clone(),
                i as u32,
                Some(Duration::from_secs(60)),
                i as u64,
                None,
            );
            prop_assert!(store.len() <= capacity + 1);
        }

        // With distinct insertion instants, the bound is exact
        prop_assert!(store.len() <= capacity.max(1) + 1);
    }

    /// Property: the evicted entry is always the oldest-by-insertion among
    /// those live at the moment of eviction.
    #[test]
    fn prop_eviction_removes_minimum_inserted_at(extra in 1u64..10) {
        let store = MemoryStore::new(3, Duration::from_secs(300));

        store.insert("old", 0u8, Some(Duration::from_secs(600)), 100, None);
        store.insert("mid", 1u8, Some(Duration::from_secs(600)), 200, None);
        store.insert("new", 2u8, Some(Duration::from_secs(600)), 300, None);

        let evicted = store.insert(
            "overflow",
            3u8,
            Some(Duration::from_secs(600)),
            300 + extra,
            None,
        );

        prop_assert_eq!(evicted, Some("old".to_string()));
        prop_assert_eq!(store.get("mid", 400), Some(1u8));
        prop_assert_eq!(store.get("new", 400), Some(2u8));
        prop_assert_eq!(store.get("overflow", 400), Some(3u8));
    }

    /// Property: an overwrite's window replaces the original entirely; the
    /// first TTL has no further effect in either direction.
    #[test]
    fn prop_overwrite_resets_window(
        first_ttl in ttl_strategy(),
        second_ttl in 1u64..60_000,
        gap in 0u64..30_000,
        offset in offset_strategy(),
    ) {
        let store = MemoryStore::new(16, Duration::from_secs(300));
        store.insert("k", 1u8, Some(Duration::from_millis(first_ttl)), 0, None);
        store.insert("k", 2u8, Some(Duration::from_millis(second_ttl)), gap, None);

        let read_at = gap + offset;
        let got = store.get("k", read_at);

        if offset < second_ttl {
            prop_assert_eq!(got, Some(2u8));
        } else {
            prop_assert_eq!(got, None);
        }
    }
}

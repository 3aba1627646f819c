//! TierCache - Two-Tier TTL Key-Value Cache
//!
//! An in-memory TTL cache with a soft capacity bound and an optional persisted
//! mirror for cross-restart survival, plus an async memoization wrapper.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         TtlCache<T>                              │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  Memory Store (authoritative)   │  Persisted Mirror (optional)   │
//! │  ┌──────────────────────────┐   │  ┌──────────────────────────┐  │
//! │  │ Mutex<HashMap>           │   │  │ MirrorBackend (trait)    │  │
//! │  │ TTL sweep on every set   │   │  │ - InMemoryMirrorBackend  │  │
//! │  │ Oldest-entry eviction    │   │  │ - FsMirrorBackend        │  │
//! │  └──────────────────────────┘   │  └──────────────────────────┘  │
//! │              │                  │              │                 │
//! │              └───── promote on mirror hit ─────┘                 │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lookups always consult the memory store first. The mirror is consulted
//! only on a memory miss, and a live mirror hit is promoted back into memory.
//! Mirror I/O failures are logged and swallowed; the memory path is always
//! the fallback of record.
//!
//! # Modules
//!
//! - [`cache`] - The [`TtlCache`] manager tying both tiers together
//! - [`clock`] - Injectable time source for deterministic TTL testing
//! - [`entry`] - Cache entry type with insertion/expiry timestamps
//! - [`error`] - Error types
//! - [`memo`] - Async memoization wrapper
//! - [`mirror`] - Persisted mirror backend trait and implementations
//! - [`store`] - In-memory store with sweep and eviction
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use tiercache::{CacheOptions, TtlCache};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let cache: TtlCache<u64> = TtlCache::in_memory();
//! let opts = CacheOptions {
//!     ttl: Some(Duration::from_secs(1)),
//!     ..Default::default()
//! };
//! cache.set("answer", 42, opts).await;
//! assert_eq!(cache.get("answer", false).await, Some(42));
//! # }
//! ```

pub mod cache;
pub mod clock;
pub mod entry;
pub mod error;
pub mod memo;
pub mod mirror;
pub mod store;

mod proptests;

// Re-export commonly used types
pub use cache::{CacheConfig, CacheOptions, CacheStats, TtlCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use error::{Error, Result};
pub use memo::{memoize, Memoized};
pub use mirror::{
    FsMirrorBackend, InMemoryMirrorBackend, MirrorBackend, MirrorBackendStats,
};
pub use store::{MemoryStore, StoreStats};

use std::time::Duration;

/// Default soft capacity bound for the memory store
pub const DEFAULT_CAPACITY: usize = 100;

/// Default TTL applied when a set carries no explicit TTL (five minutes)
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Fixed prefix distinguishing this cache's entries inside a shared mirror
/// namespace. `clear` and stats enumerate only keys carrying it.
pub const MIRROR_KEY_PREFIX: &str = "cache_";

// =============================================================================
// Tests
// =============================================================================

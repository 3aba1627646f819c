//! Async Memoization Wrapper
//!
//! Wraps an async function and a caller-supplied key generator so repeated
//! calls whose arguments map to the same key reuse the cached result within
//! its TTL instead of recomputing.
//!
//! The key generator must be deterministic and collision-free for the
//! argument space the caller cares about; the wrapper does not validate this.
//!
//! Concurrent calls for the same key are NOT deduplicated: two callers
//! arriving before the first computation resolves will both invoke the inner
//! function, and the later completion wins the cache slot (per-key
//! last-write-wins). Callers needing at-most-once execution per key should
//! front this with an in-flight map of pending computations.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cache::{CacheOptions, TtlCache};

/// A cache-checked async function
///
/// Built by [`memoize`]. `call` has the same signature as the wrapped
/// function and returns its errors unchanged; errors are never cached.
pub struct Memoized<T, F, K> {
    cache: Arc<TtlCache<T>>,
    func: F,
    key_fn: K,
    options: CacheOptions,
}

/// Wrap `func` so its results are cached in `cache` under keys produced by
/// `key_fn`, with `options` governing TTL and mirror use.
pub fn memoize<T, F, K>(
    cache: Arc<TtlCache<T>>,
    func: F,
    key_fn: K,
    options: CacheOptions,
) -> Memoized<T, F, K> {
    Memoized {
        cache,
        func,
        key_fn,
        options,
    }
}

impl<T, F, K> Memoized<T, F, K>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync,
{
    /// Invoke the wrapped function through the cache.
    ///
    /// A live cached value for the generated key is returned without calling
    /// the inner function; otherwise the inner function runs, its success is
    /// cached, and the value is returned.
    pub async fn call<A, Fut, E>(&self, args: &A) -> std::result::Result<T, E>
    where
        F: Fn(&A) -> Fut,
        Fut: std::future::Future<Output = std::result::Result<T, E>>,
        K: Fn(&A) -> String,
    {
        let key = (self.key_fn)(args);

        if let Some(value) = self.cache.get(&key, self.options.use_mirror).await {
            return Ok(value);
        }

        let value = (self.func)(args).await?;
        self.cache.set(&key, value.clone(), self.options.clone()).await;
        Ok(value)
    }

    /// The cache this wrapper reads through
    pub fn cache(&self) -> &Arc<TtlCache<T>> {
        &self.cache
    }
}

// =============================================================================
// Tests
// =============================================================================

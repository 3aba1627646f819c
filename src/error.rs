//! Error types for the cache and its mirror backends

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in cache mirror operations.
///
/// A cache miss is never an error; it is signaled by `None`/`false` returns.
/// These variants surface only from direct [`MirrorBackend`] use — the
/// [`TtlCache`] manager catches them, logs at `warn`, and degrades to
/// memory-only behavior.
///
/// [`MirrorBackend`]: crate::mirror::MirrorBackend
/// [`TtlCache`]: crate::cache::TtlCache
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error from a persisted backend
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Entry envelope failed to serialize or deserialize
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Mirror backend rejected or could not complete an operation
    #[error("Mirror backend error: {0}")]
    Mirror(String),

    /// Mirror key did not carry a decodable name
    #[error("Invalid mirror key: {0}")]
    InvalidMirrorKey(String),
}

// =============================================================================
// Tests
// =============================================================================

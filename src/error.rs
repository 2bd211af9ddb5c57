use thiserror::Error;

/// Errors returned by [`SieveCache`](crate::SieveCache) operations.
///
/// None of them leave the cache in an inconsistent state: an operation that
/// fails has not mutated anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SieveError {
    /// The requested key is not present in the cache.
    #[error("key not found")]
    KeyNotFound,

    /// An eviction was requested while the cache holds no entries.
    #[error("cache is empty")]
    EmptyCache,

    /// A zero capacity was rejected by [`SieveCache::try_new`](crate::SieveCache::try_new).
    #[error("capacity should be greater than 0")]
    InvalidCapacity,
}

/// Syntactic sugar for `Result<T, SieveError>`.
pub type Result<T, E = SieveError> = std::result::Result<T, E>;

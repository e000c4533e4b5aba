//! Error types for the Redis store.
//!
//! All errors convert into [`StoreError`] for uniform handling at the
//! cache facade.

use apicache::StoreError;
use redis::RedisError;

/// Error type for Redis store operations.
///
/// Wraps errors from the underlying [`redis`] crate: connection failures,
/// protocol errors, authentication failures, and command errors. Appears
/// when building the store from an invalid URL or on any operation once
/// the server is unreachable (the connection is established lazily).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An error from the underlying Redis client.
    #[error("redis store error: {0}")]
    Redis(#[from] RedisError),
}

impl From<Error> for StoreError {
    fn from(error: Error) -> Self {
        Self::ConnectionError(Box::new(error))
    }
}

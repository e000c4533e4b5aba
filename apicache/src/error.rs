//! Error types.
//!
//! Three distinct failure groups per the facade contract: store failures
//! propagate as-is, corrupted entries are hard codec errors (never silent
//! misses), and configuration problems fail fast at construction. A cache
//! miss is a first-class `Ok(None)`, not an error.

use thiserror::Error;
use tokio::task::JoinError;

/// Errors from the payload codec pipeline.
///
/// On the read path every variant means the stored entry is corrupted or
/// was written by an incompatible version; corruption is deliberately
/// distinct from a cache miss so callers get visibility into it.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Stored text is not valid base64.
    #[error("invalid base64 in stored entry: {0}")]
    Base64(#[from] base64::DecodeError),
    /// Compressed bytes could not be decompressed.
    #[error("decompression failed: {0}")]
    Decompress(#[source] std::io::Error),
    /// Compression of an outgoing payload failed.
    #[error("compression failed: {0}")]
    Compress(#[source] std::io::Error),
    /// Decompressed bytes are not valid UTF-8.
    #[error("stored entry is not valid utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    /// The entry table is not valid JSON, or serialization failed.
    #[error("malformed entry table: {0}")]
    Json(#[from] serde_json::Error),
    /// The entry table holds no entries.
    #[error("entry table is empty")]
    EmptyTable,
    /// A container slot referenced a table entry that does not exist.
    #[error("reference to missing entry {0}")]
    ReferenceOutOfRange(usize),
    /// A container slot held a string that is not a table index.
    #[error("invalid entry reference {0:?}")]
    InvalidReference(String),
    /// A container appeared inline inside another table entry.
    #[error("nested container in entry table")]
    NestedEntry,
    /// A node id did not belong to the payload being encoded.
    #[error("payload references missing node {0}")]
    DanglingNode(usize),
    /// The payload contains a cycle and cannot be exported as a tree.
    #[error("cyclic payload cannot be represented as a tree")]
    CyclicPayload,
}

/// Configuration validation errors, raised at construction time rather
/// than at first use.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The default expiration must be a positive duration.
    #[error("expiration must be a positive duration")]
    ZeroExpiration,
}

/// Errors from the underlying key-value store.
///
/// Store failures are never swallowed and never retried internally; the
/// cache has no knowledge of retry-safety for a given request.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store-internal state or computation error.
    ///
    /// Any error not related to network interaction.
    #[error(transparent)]
    InternalError(Box<dyn std::error::Error + Send>),
    /// Network interaction error.
    #[error(transparent)]
    ConnectionError(Box<dyn std::error::Error + Send>),
}

/// Facade-level error covering everything `get_cache`/`set_cache` can
/// surface.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The store call failed; propagated as-is.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// A stored entry is corrupted, or an outgoing payload could not be
    /// encoded.
    #[error("codec failure: {0}")]
    Codec(#[from] CodecError),
    /// An explicit ttl of zero was supplied.
    #[error("ttl must be a positive duration")]
    InvalidTtl,
    /// The offloaded codec task did not complete.
    #[error("offloaded codec task failed: {0}")]
    Offload(#[from] JoinError),
}

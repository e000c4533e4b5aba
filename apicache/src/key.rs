//! Cache key type and key-building algorithms.
//!
//! A key is a deterministic function of the request descriptor and the
//! configured prefix: the same request always maps to the same key, across
//! process restarts. The built-in algorithm lives in
//! [`default_key_builder`]; callers can replace it per HTTP method by
//! registering a [`KeyBuilder`] in the configuration.

use std::fmt;
use std::sync::Arc;

use crate::request::RequestDescriptor;

/// A deterministic string identifying one cacheable request's stored
/// response.
///
/// Keys produced by [`default_key_builder`] are entirely lower-case; keys
/// produced by caller-supplied builders are used verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Wraps an already-built key string.
    pub fn new(key: impl Into<String>) -> Self {
        CacheKey(key.into())
    }

    /// Borrows the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the key, returning the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CacheKey {
    fn from(key: String) -> Self {
        CacheKey(key)
    }
}

impl From<&str> for CacheKey {
    fn from(key: &str) -> Self {
        CacheKey(key.to_owned())
    }
}

/// A pluggable key-building strategy.
///
/// Invoked with the request descriptor and the configured prefix, and
/// fully responsible for the key it returns - the facade applies no
/// further transformation, not even lower-casing.
pub type KeyBuilder = Arc<dyn Fn(&RequestDescriptor, &str) -> CacheKey + Send + Sync>;

/// The built-in key algorithm.
///
/// Query parameters are flattened by concatenating each name immediately
/// followed by its value, in encounter order, with no separators anywhere.
/// The key is `{prefix}{METHOD}__{path without leading slash}__{flattened}`,
/// lower-cased. Pure and infallible; an empty query mapping and an empty
/// prefix are valid and simply produce a shorter key.
///
/// The separator-free flattening cannot distinguish `{a: "bc"}` from
/// `{ab: "c"}`. This is kept as-is for key compatibility with existing
/// deployments; callers needing stronger canonicalization should register
/// their own builder.
///
/// # Example
///
/// ```
/// use apicache::{Method, RequestDescriptor, default_key_builder};
///
/// let request = RequestDescriptor::new(Method::Get, "/langage/SGML/infos");
/// let key = default_key_builder(&request, "");
/// assert_eq!(key.as_str(), "get__langage/sgml/infos__");
/// ```
pub fn default_key_builder(request: &RequestDescriptor, prefix: &str) -> CacheKey {
    let mut flattened = String::new();
    for (name, value) in request.query_pairs() {
        flattened.push_str(name);
        flattened.push_str(value);
    }
    let path = request.path().strip_prefix('/').unwrap_or(request.path());
    let key = format!("{prefix}{}__{path}__{flattened}", request.method());
    CacheKey::new(key.to_lowercase())
}

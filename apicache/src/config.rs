//! Cache configuration and its builder.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::ConfigError;
use crate::key::{CacheKey, KeyBuilder};
use crate::request::{Method, RequestDescriptor};

/// Default entry lifetime: fifteen days.
const DEFAULT_EXPIRATION: Duration = Duration::from_millis(1000 * 60 * 60 * 24 * 15);

/// Immutable configuration for [`ApiCache`](crate::ApiCache).
///
/// Built once via [`CacheConfig::builder`], merging caller settings over
/// the built-in defaults, and never mutated afterwards.
#[derive(Clone)]
pub struct CacheConfig {
    expiration: Duration,
    prefix: String,
    key_builders: HashMap<Method, KeyBuilder>,
}

impl CacheConfig {
    /// Creates a builder seeded with the defaults.
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::new()
    }

    /// Default TTL applied when `set_cache` is called without one.
    pub fn expiration(&self) -> Duration {
        self.expiration
    }

    /// Prefix prepended to every generated key.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The override key builder registered for `method`, if any.
    pub fn key_builder(&self, method: Method) -> Option<&KeyBuilder> {
        self.key_builders.get(&method)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            expiration: DEFAULT_EXPIRATION,
            prefix: String::new(),
            key_builders: HashMap::new(),
        }
    }
}

impl fmt::Debug for CacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheConfig")
            .field("expiration", &self.expiration)
            .field("prefix", &self.prefix)
            .field("key_builders", &self.key_builders.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Builder for [`CacheConfig`].
///
/// ```
/// use apicache::{CacheConfig, CacheKey, Method};
///
/// let config = CacheConfig::builder()
///     .expiration_ms(86_400_000)
///     .prefix("api:")
///     .key_builder(Method::Post, |request, prefix| {
///         CacheKey::new(format!("{prefix}post:{}", request.path()))
///     })
///     .build()
///     .unwrap();
/// assert_eq!(config.prefix(), "api:");
/// ```
pub struct CacheConfigBuilder {
    expiration: Duration,
    prefix: String,
    key_builders: HashMap<Method, KeyBuilder>,
}

impl CacheConfigBuilder {
    fn new() -> Self {
        CacheConfigBuilder {
            expiration: DEFAULT_EXPIRATION,
            prefix: String::new(),
            key_builders: HashMap::new(),
        }
    }

    /// Sets the default TTL, in milliseconds.
    pub fn expiration_ms(mut self, millis: u64) -> Self {
        self.expiration = Duration::from_millis(millis);
        self
    }

    /// Sets the default TTL.
    pub fn expiration(mut self, expiration: Duration) -> Self {
        self.expiration = expiration;
        self
    }

    /// Sets the key prefix.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Replaces the whole per-method override mapping.
    ///
    /// Merge is shallow: the supplied mapping stands on its own, methods
    /// absent from it fall back to the default algorithm.
    pub fn key_builders(mut self, builders: HashMap<Method, KeyBuilder>) -> Self {
        self.key_builders = builders;
        self
    }

    /// Registers an override key builder for a single method.
    pub fn key_builder<F>(mut self, method: Method, builder: F) -> Self
    where
        F: Fn(&RequestDescriptor, &str) -> CacheKey + Send + Sync + 'static,
    {
        self.key_builders.insert(method, Arc::new(builder));
        self
    }

    /// Validates the settings and builds the configuration.
    pub fn build(self) -> Result<CacheConfig, ConfigError> {
        if self.expiration.is_zero() {
            return Err(ConfigError::ZeroExpiration);
        }
        Ok(CacheConfig {
            expiration: self.expiration,
            prefix: self.prefix,
            key_builders: self.key_builders,
        })
    }
}

impl Default for CacheConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//! The cache facade.

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use crate::codec;
use crate::config::CacheConfig;
use crate::error::{CacheError, CodecError};
use crate::key::{CacheKey, default_key_builder};
use crate::request::RequestDescriptor;
use crate::store::{SetStatus, Store, WriteFlag};
use crate::value::Payload;

/// Request-scoped response cache over an injected [`Store`].
///
/// The facade holds only the store handle and an immutable
/// [`CacheConfig`], so one instance is safe to share and invoke
/// concurrently. Concurrent `set_cache` calls for the same key race at
/// the store with last-write-wins semantics; a `get_cache` during an
/// in-flight write observes either the old value or a miss, never a
/// partial write. The store connection's lifecycle stays with the caller.
///
/// # Example
///
/// ```no_run
/// use apicache::{ApiCache, CacheConfig, Method, RequestDescriptor};
/// use serde_json::json;
/// # async fn example(store: impl apicache::Store) -> Result<(), apicache::CacheError> {
/// let cache = ApiCache::with_defaults(store);
/// let request = RequestDescriptor::new(Method::Get, "/users/42");
/// cache.set_json(&request, &json!({"name": "ada"}), None).await?;
/// let cached: Option<serde_json::Value> = cache.get_json(&request).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ApiCache<S> {
    store: S,
    config: CacheConfig,
}

impl<S> ApiCache<S>
where
    S: Store,
{
    /// Creates a facade over `store` with `config`.
    pub fn new(store: S, config: CacheConfig) -> Self {
        ApiCache { store, config }
    }

    /// Creates a facade with the default configuration.
    pub fn with_defaults(store: S) -> Self {
        ApiCache::new(store, CacheConfig::default())
    }

    /// The active configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Resolves the cache key for `request`.
    ///
    /// An override registered for the request's method takes full
    /// responsibility for the key; its result is used verbatim, without
    /// the lower-casing the default builder applies.
    pub fn build_key(&self, request: &RequestDescriptor) -> CacheKey {
        match self.config.key_builder(request.method()) {
            Some(builder) => builder(request, self.config.prefix()),
            None => default_key_builder(request, self.config.prefix()),
        }
    }

    /// Retrieves the cached payload for `request`.
    ///
    /// A store miss (absent or empty entry) is `Ok(None)` and never
    /// touches the codec. A present but undecodable entry is a
    /// [`CacheError::Codec`], since it points at store or version
    /// corruption the caller needs to see.
    pub async fn get_cache(
        &self,
        request: &RequestDescriptor,
    ) -> Result<Option<Payload>, CacheError> {
        let key = self.build_key(request);
        let raw = self.store.get(&key).await?;
        let Some(raw) = raw.filter(|raw| !raw.is_empty()) else {
            debug!(key = %key, "cache miss");
            return Ok(None);
        };
        // Decompression is CPU-bound; keep it off the async executor.
        let payload = tokio::task::spawn_blocking(move || codec::decode(&raw)).await??;
        debug!(key = %key, "cache hit");
        Ok(Some(payload))
    }

    /// Stores `payload` for `request`.
    ///
    /// Without an explicit `ttl` the configured expiration applies; an
    /// explicit zero ttl is rejected. The entry is written with the
    /// store's expire-in-N-milliseconds flag, and the returned boolean
    /// reflects the store's acknowledgement.
    pub async fn set_cache(
        &self,
        request: &RequestDescriptor,
        payload: &Payload,
        ttl: Option<Duration>,
    ) -> Result<bool, CacheError> {
        let ttl = ttl.unwrap_or_else(|| self.config.expiration());
        if ttl.is_zero() {
            return Err(CacheError::InvalidTtl);
        }
        let key = self.build_key(request);
        let payload = payload.clone();
        let encoded = tokio::task::spawn_blocking(move || codec::encode(&payload)).await??;
        trace!(key = %key, bytes = encoded.len(), "cache write");
        let status = self
            .store
            .set(&key, encoded, WriteFlag::ExpireInMs, ttl.as_millis() as u64)
            .await?;
        Ok(status == SetStatus::Written)
    }

    /// Retrieves and deserializes a tree-shaped cached value.
    ///
    /// Convenience over [`ApiCache::get_cache`] for values without shared
    /// sub-structure.
    pub async fn get_json<T>(&self, request: &RequestDescriptor) -> Result<Option<T>, CacheError>
    where
        T: DeserializeOwned,
    {
        match self.get_cache(request).await? {
            Some(payload) => {
                let value = payload.to_json()?;
                let typed = serde_json::from_value(value).map_err(CodecError::Json)?;
                Ok(Some(typed))
            }
            None => Ok(None),
        }
    }

    /// Serializes and stores a tree-shaped value.
    pub async fn set_json<T>(
        &self,
        request: &RequestDescriptor,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<bool, CacheError>
    where
        T: Serialize,
    {
        let value = serde_json::to_value(value).map_err(CodecError::Json)?;
        let payload = Payload::from_json(&value);
        self.set_cache(request, &payload, ttl).await
    }
}

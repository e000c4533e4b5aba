//! Redis implementation of the store adapter.

use apicache::{CacheKey, SetStatus, Store, StoreResult, WriteFlag};
use async_trait::async_trait;
use redis::{Client, aio::ConnectionManager};
use tokio::sync::OnceCell;
use tracing::trace;

use crate::error::Error;

/// Redis-backed [`Store`] based on the redis-rs crate.
///
/// The client is created eagerly from the connection URL; the managed
/// connection is established on first use via [`ConnectionManager`] and
/// reconnects on failure.
///
/// # Examples
///
/// ```no_run
/// use apicache_redis::RedisStore;
///
/// let store = RedisStore::builder()
///     .server("redis://127.0.0.1/")
///     .build()
///     .unwrap();
/// ```
///
/// [`ConnectionManager`]: redis::aio::ConnectionManager
#[derive(Clone)]
pub struct RedisStore {
    client: Client,
    connection: OnceCell<ConnectionManager>,
}

impl RedisStore {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn builder() -> RedisStoreBuilder {
        RedisStoreBuilder::default()
    }

    /// Lazily obtains the shared connection manager.
    async fn connection(&self) -> Result<&ConnectionManager, Error> {
        self.connection
            .get_or_try_init(|| {
                trace!("initialize new redis connection manager");
                self.client.get_connection_manager()
            })
            .await
            .map_err(Error::from)
    }
}

/// Builder for [`RedisStore`].
pub struct RedisStoreBuilder {
    connection_info: String,
}

impl Default for RedisStoreBuilder {
    fn default() -> Self {
        Self {
            connection_info: "redis://127.0.0.1/".to_owned(),
        }
    }
}

impl RedisStoreBuilder {
    /// Sets connection info (host, port, database, etc.).
    pub fn server(mut self, connection_info: impl Into<String>) -> Self {
        self.connection_info = connection_info.into();
        self
    }

    /// Creates the store; fails on a malformed connection URL.
    pub fn build(self) -> Result<RedisStore, Error> {
        Ok(RedisStore {
            client: Client::open(self.connection_info)?,
            connection: OnceCell::new(),
        })
    }
}

#[async_trait]
impl Store for RedisStore {
    async fn get(&self, key: &CacheKey) -> StoreResult<Option<String>> {
        let mut con = self.connection().await?.clone();
        let value: Option<String> = redis::cmd("GET")
            .arg(key.as_str())
            .query_async(&mut con)
            .await
            .map_err(Error::from)?;
        Ok(value)
    }

    async fn set(
        &self,
        key: &CacheKey,
        value: String,
        flag: WriteFlag,
        millis: u64,
    ) -> StoreResult<SetStatus> {
        let mut con = self.connection().await?.clone();
        let mut cmd = redis::cmd("SET");
        cmd.arg(key.as_str()).arg(value);
        match flag {
            WriteFlag::ExpireInMs => {
                cmd.arg("PX").arg(millis);
            }
            WriteFlag::TimestampMs => {
                cmd.arg("PXAT").arg(millis);
            }
            WriteFlag::WriteIfExists => {
                cmd.arg("XX");
            }
            WriteFlag::WriteIfNotExists => {
                cmd.arg("NX");
            }
        }

        // SET replies OK, or nil when a conditional write is skipped.
        let reply: Option<String> = cmd.query_async(&mut con).await.map_err(Error::from)?;
        Ok(match reply.as_deref() {
            Some("OK") => SetStatus::Written,
            _ => SetStatus::Skipped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_rejects_malformed_url() {
        let result = RedisStore::builder().server("not-a-valid-url").build();
        assert!(result.is_err());
    }
}

//! Store adapter contract.
//!
//! The cache consumes an external key-value store through this trait and
//! owns nothing about it: connection lifecycle, atomicity of a single
//! write, and entry expiry all belong to the store. The cache holds only
//! the injected handle.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::key::CacheKey;

/// Convenience alias for store operation results.
pub type StoreResult<T> = Result<T, StoreError>;

/// Write modifiers understood by Redis-like stores.
///
/// Only [`WriteFlag::ExpireInMs`] is issued by the cache itself; the
/// remaining modifiers are part of the store contract for callers driving
/// the adapter directly. The conditional flags ignore the millisecond
/// argument of [`Store::set`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteFlag {
    /// Expire the entry the given number of milliseconds from now.
    ExpireInMs,
    /// Expire the entry at an absolute millisecond timestamp.
    TimestampMs,
    /// Write only if the key already exists.
    WriteIfExists,
    /// Write only if the key does not exist.
    WriteIfNotExists,
}

/// Outcome of a store write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetStatus {
    /// The store acknowledged the write.
    Written,
    /// A conditional write was not performed.
    Skipped,
}

/// Adapter over the external key-value store.
///
/// Implementations must tolerate concurrent calls; the cache provides no
/// mutual exclusion, and concurrent writers for one key race with
/// last-write-wins semantics at the store.
#[async_trait]
pub trait Store: Send + Sync {
    /// Reads the raw entry stored under `key`, if any.
    async fn get(&self, key: &CacheKey) -> StoreResult<Option<String>>;

    /// Writes `value` under `key` with the given write modifier.
    async fn set(
        &self,
        key: &CacheKey,
        value: String,
        flag: WriteFlag,
        millis: u64,
    ) -> StoreResult<SetStatus>;
}

#[async_trait]
impl Store for &dyn Store {
    async fn get(&self, key: &CacheKey) -> StoreResult<Option<String>> {
        (*self).get(key).await
    }

    async fn set(
        &self,
        key: &CacheKey,
        value: String,
        flag: WriteFlag,
        millis: u64,
    ) -> StoreResult<SetStatus> {
        (*self).set(key, value, flag, millis).await
    }
}

#[async_trait]
impl Store for Box<dyn Store> {
    async fn get(&self, key: &CacheKey) -> StoreResult<Option<String>> {
        (**self).get(key).await
    }

    async fn set(
        &self,
        key: &CacheKey,
        value: String,
        flag: WriteFlag,
        millis: u64,
    ) -> StoreResult<SetStatus> {
        (**self).set(key, value, flag, millis).await
    }
}

#[async_trait]
impl Store for Arc<dyn Store + Send + 'static> {
    async fn get(&self, key: &CacheKey) -> StoreResult<Option<String>> {
        (**self).get(key).await
    }

    async fn set(
        &self,
        key: &CacheKey,
        value: String,
        flag: WriteFlag,
        millis: u64,
    ) -> StoreResult<SetStatus> {
        (**self).set(key, value, flag, millis).await
    }
}

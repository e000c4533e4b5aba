//! Redis store adapter for `apicache`.
//!
//! Provides [`RedisStore`], an implementation of the
//! [`Store`](apicache::Store) trait over the redis-rs crate.

mod error;
mod store;

pub use error::Error;
pub use store::{RedisStore, RedisStoreBuilder};

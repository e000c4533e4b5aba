#![warn(missing_docs)]
//! # apicache
//!
//! Request-scoped response cache for HTTP services.
//!
//! Given a description of an inbound request and a key-value store, the
//! [`ApiCache`] facade derives a deterministic cache key and stores or
//! retrieves an arbitrary JSON-shaped payload under that key with a
//! time-to-live. It sits between a router and a store such as Redis and
//! avoids recomputing idempotent request/response pairs.
//!
//! ## Architecture
//!
//! - [`RequestDescriptor`] - the request data a key is derived from
//! - [`default_key_builder`] - the built-in key algorithm, overridable
//!   per HTTP method through [`CacheConfig`]
//! - [`Payload`] - a reference-preserving JSON-shaped value graph
//! - [`codec`] - the serialize/compress/base64 pipeline and its inverse
//! - [`Store`] - the adapter trait a key-value store implements
//! - [`ApiCache`] - the facade composing all of the above
//!
//! The facade decides nothing about *when* to cache - that stays with the
//! calling middleware - and performs no invalidation beyond the TTL the
//! store enforces.

pub mod cache;
pub mod codec;
pub mod config;
pub mod error;
pub mod key;
pub mod request;
pub mod store;
pub mod value;

pub use cache::ApiCache;
pub use config::{CacheConfig, CacheConfigBuilder};
pub use error::{CacheError, CodecError, ConfigError, StoreError};
pub use key::{CacheKey, KeyBuilder, default_key_builder};
pub use request::{Method, RequestDescriptor};
pub use store::{SetStatus, Store, StoreResult, WriteFlag};
pub use value::{Node, NodeId, Payload};

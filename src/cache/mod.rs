//! Persistent response cache.
//!
//! This module knows nothing about the remote API. It provides:
//! - A key-value storage abstraction with SQLite and in-memory backends
//! - Deterministic, order-independent cache keys
//! - A namespaced cache store with a global TTL and prefix-scoped clearing

mod key;
mod storage;
mod store;

pub use key::{canonical_json, QueryKey};
pub use storage::{KeyValueStorage, MemoryStorage, SqliteStorage};
pub use store::{CacheStore, CACHE_PREFIX, DEFAULT_TTL_HOURS};

//! Namespaced, time-bounded JSON cache over a key-value storage.

use chrono::{Duration, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use super::key::QueryKey;
use super::storage::KeyValueStorage;

/// Prefix reserved for cache entries in the shared storage.
pub const CACHE_PREFIX: &str = "damon_cache_";

/// Default number of hours an entry stays fresh.
pub const DEFAULT_TTL_HOURS: i64 = 24;

/// What is persisted under `CACHE_PREFIX + key`.
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry<T> {
  data: T,
  /// Milliseconds since the Unix epoch at write time
  timestamp: i64,
}

/// Read-through cache storage.
///
/// Every failure of the underlying storage is logged and absorbed: a read that
/// fails is a miss, a write that fails is dropped.
pub struct CacheStore<S: KeyValueStorage> {
  storage: Arc<S>,
  ttl: Duration,
}

impl<S: KeyValueStorage> CacheStore<S> {
  pub fn new(storage: Arc<S>) -> Self {
    Self {
      storage,
      ttl: Duration::hours(DEFAULT_TTL_HOURS),
    }
  }

  /// Set how long entries stay fresh.
  pub fn with_ttl(mut self, ttl: Duration) -> Self {
    self.ttl = ttl;
    self
  }

  pub fn ttl(&self) -> Duration {
    self.ttl
  }

  fn storage_key(key: &QueryKey) -> String {
    format!("{}{}", CACHE_PREFIX, key)
  }

  /// Return the cached payload for `key` if present and fresh.
  ///
  /// Entries that cannot be decoded are removed. Stale entries are left in place
  /// for the next successful fetch to overwrite.
  pub fn get<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
    let storage_key = Self::storage_key(key);

    let raw = match self.storage.get_item(&storage_key) {
      Ok(Some(raw)) => raw,
      Ok(None) => return None,
      Err(e) => {
        warn!(key = %key, error = %e, "cache read failed");
        return None;
      }
    };

    let entry: CacheEntry<Value> = match serde_json::from_str(&raw) {
      Ok(entry) => entry,
      Err(e) => {
        self.discard_corrupt(&storage_key, &e);
        return None;
      }
    };

    let Some(age_ms) = Utc::now().timestamp_millis().checked_sub(entry.timestamp) else {
      self.discard_corrupt(&storage_key, &"timestamp out of range");
      return None;
    };
    if age_ms >= self.ttl.num_milliseconds() {
      debug!(key = %key, age_ms, "cache entry stale");
      return None;
    }

    match serde_json::from_value(entry.data) {
      Ok(payload) => {
        debug!(key = %key, "cache hit");
        Some(payload)
      }
      Err(e) => {
        self.discard_corrupt(&storage_key, &e);
        None
      }
    }
  }

  fn discard_corrupt(&self, storage_key: &str, err: &dyn fmt::Display) {
    warn!(key = storage_key, error = %err, "discarding corrupt cache entry");
    if let Err(e) = self.storage.remove_item(storage_key) {
      warn!(key = storage_key, error = %e, "failed to remove corrupt cache entry");
    }
  }

  /// Store `payload` under `key`, stamped with the current time.
  pub fn set<T: Serialize>(&self, key: &QueryKey, payload: &T) {
    let entry = CacheEntry {
      data: payload,
      timestamp: Utc::now().timestamp_millis(),
    };

    let json = match serde_json::to_string(&entry) {
      Ok(json) => json,
      Err(e) => {
        warn!(key = %key, error = %e, "cache serialization failed");
        return;
      }
    };

    if let Err(e) = self.storage.set_item(&Self::storage_key(key), &json) {
      warn!(key = %key, error = %e, "cache storage failed");
    }
  }

  /// Remove every cache entry. Keys outside the namespace are untouched.
  ///
  /// Returns the number of entries removed.
  pub fn clear_all(&self) -> usize {
    self.remove_where(|_| true)
  }

  /// Remove cache entries whose logical key starts with `prefix`.
  pub fn clear_matching(&self, prefix: &str) -> usize {
    self.remove_where(|logical| logical.starts_with(prefix))
  }

  fn remove_where(&self, matches: impl Fn(&str) -> bool) -> usize {
    let keys = match self.storage.keys() {
      Ok(keys) => keys,
      Err(e) => {
        warn!(error = %e, "cache clear failed to list keys");
        return 0;
      }
    };

    let mut removed = 0;
    for key in keys {
      let Some(logical) = key.strip_prefix(CACHE_PREFIX) else {
        continue;
      };
      if !matches(logical) {
        continue;
      }
      match self.storage.remove_item(&key) {
        Ok(()) => removed += 1,
        Err(e) => warn!(key = %key, error = %e, "cache entry removal failed"),
      }
    }

    debug!(removed, "cache entries cleared");
    removed
  }
}

impl<S: KeyValueStorage> Clone for CacheStore<S> {
  fn clone(&self) -> Self {
    Self {
      storage: Arc::clone(&self.storage),
      ttl: self.ttl,
    }
  }
}

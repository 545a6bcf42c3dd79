//! Cache key derivation.
//!
//! A key is the operation name followed by the canonical JSON form of its
//! parameters, e.g. `listProjects_{"category":"Residential"}`. Canonical means
//! object keys are sorted at every depth, so two parameter objects that differ
//! only in insertion order produce the same key.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// Logical identity of one cacheable request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(String);

impl QueryKey {
  /// Build a key from an operation name and its parameters.
  pub fn new(action: &str, params: &Value) -> Self {
    Self(format!("{}_{}", action, canonical_json(params)))
  }

  /// Build a key from any serializable parameter struct.
  pub fn from_params<P: Serialize>(action: &str, params: &P) -> serde_json::Result<Self> {
    Ok(Self::new(action, &serde_json::to_value(params)?))
  }

  /// Prefix shared by every key of `action`.
  pub fn family(action: &str) -> String {
    format!("{}_", action)
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for QueryKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Serialize `value` with object keys sorted recursively.
pub fn canonical_json(value: &Value) -> String {
  canonicalize(value).to_string()
}

fn canonicalize(value: &Value) -> Value {
  match value {
    Value::Object(map) => {
      let mut entries: Vec<(&String, &Value)> = map.iter().collect();
      entries.sort_by(|a, b| a.0.cmp(b.0));

      // Insert in sorted order so the result is sorted even when serde_json
      // preserves insertion order.
      let mut sorted = Map::with_capacity(entries.len());
      for (k, v) in entries {
        sorted.insert(k.clone(), canonicalize(v));
      }
      Value::Object(sorted)
    }
    Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
    other => other.clone(),
  }
}

//! Key-value storage trait and its SQLite and in-memory implementations.

use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::StorageError;

pub type Result<T> = std::result::Result<T, StorageError>;

/// Durable string-to-string storage shared by the cache and the session.
///
/// Keys are flat; namespacing is up to the callers.
pub trait KeyValueStorage: Send + Sync {
  /// Read the value stored under `key`.
  fn get_item(&self, key: &str) -> Result<Option<String>>;

  /// Store `value` under `key`, replacing any previous value.
  fn set_item(&self, key: &str, value: &str) -> Result<()>;

  /// Remove `key`. Removing a missing key is not an error.
  fn remove_item(&self, key: &str) -> Result<()>;

  /// List every key currently stored.
  fn keys(&self) -> Result<Vec<String>>;
}

/// SQLite-based storage implementation.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
}

impl SqliteStorage {
  /// Open the storage at the default location.
  pub fn open() -> Result<Self> {
    let path = Self::default_path()?;
    Self::open_at(&path)
  }

  /// Open or create the storage file at `path`.
  pub fn open_at(path: &Path) -> Result<Self> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(path)?;
    Self::with_connection(conn)
  }

  /// Storage that lives only as long as the process.
  pub fn in_memory() -> Result<Self> {
    Self::with_connection(Connection::open_in_memory()?)
  }

  fn with_connection(conn: Connection) -> Result<Self> {
    conn.execute_batch(SCHEMA)?;
    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  /// Get the default database path.
  pub fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| {
        std::io::Error::new(
          std::io::ErrorKind::NotFound,
          "could not determine data directory",
        )
      })?;

    Ok(data_dir.join("damon").join("storage.db"))
  }

  fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
    self.conn.lock().map_err(|_| StorageError::Poisoned)
  }
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS kv_store (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

impl KeyValueStorage for SqliteStorage {
  fn get_item(&self, key: &str) -> Result<Option<String>> {
    let conn = self.lock()?;
    let value = conn
      .query_row(
        "SELECT value FROM kv_store WHERE key = ?",
        params![key],
        |row| row.get(0),
      )
      .optional()?;
    Ok(value)
  }

  fn set_item(&self, key: &str, value: &str) -> Result<()> {
    let conn = self.lock()?;
    conn.execute(
      "INSERT OR REPLACE INTO kv_store (key, value) VALUES (?, ?)",
      params![key, value],
    )?;
    Ok(())
  }

  fn remove_item(&self, key: &str) -> Result<()> {
    let conn = self.lock()?;
    conn.execute("DELETE FROM kv_store WHERE key = ?", params![key])?;
    Ok(())
  }

  fn keys(&self) -> Result<Vec<String>> {
    let conn = self.lock()?;
    let mut stmt = conn.prepare("SELECT key FROM kv_store ORDER BY key")?;
    let keys = stmt
      .query_map([], |row| row.get(0))?
      .collect::<std::result::Result<Vec<String>, _>>()?;
    Ok(keys)
  }
}

/// Process-local storage, optionally bounded by a byte quota.
///
/// The quota counts key and value bytes of everything stored, like a browser's
/// local storage does.
#[derive(Default)]
pub struct MemoryStorage {
  items: Mutex<BTreeMap<String, String>>,
  quota: Option<usize>,
}

impl MemoryStorage {
  pub fn new() -> Self {
    Self::default()
  }

  /// Storage that rejects writes once `quota` bytes would be exceeded.
  pub fn with_quota(quota: usize) -> Self {
    Self {
      items: Mutex::new(BTreeMap::new()),
      quota: Some(quota),
    }
  }

  fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
    self.items.lock().map_err(|_| StorageError::Poisoned)
  }
}

impl KeyValueStorage for MemoryStorage {
  fn get_item(&self, key: &str) -> Result<Option<String>> {
    Ok(self.lock()?.get(key).cloned())
  }

  fn set_item(&self, key: &str, value: &str) -> Result<()> {
    let mut items = self.lock()?;

    if let Some(quota) = self.quota {
      let others: usize = items
        .iter()
        .filter(|(k, _)| k.as_str() != key)
        .map(|(k, v)| k.len() + v.len())
        .sum();
      let needed = others + key.len() + value.len();
      if needed > quota {
        return Err(StorageError::QuotaExceeded { needed, quota });
      }
    }

    items.insert(key.to_string(), value.to_string());
    Ok(())
  }

  fn remove_item(&self, key: &str) -> Result<()> {
    self.lock()?.remove(key);
    Ok(())
  }

  fn keys(&self) -> Result<Vec<String>> {
    Ok(self.lock()?.keys().cloned().collect())
  }
}

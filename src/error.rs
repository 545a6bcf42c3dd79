//! Error types for storage and the remote API.

use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;

/// Failure of the local key-value storage.
///
/// The cache absorbs these; only session handling ever surfaces them.
#[derive(Error, Debug)]
pub enum StorageError {
  #[error("sqlite: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("io: {0}")]
  Io(#[from] std::io::Error),

  /// Writing the value would exceed the configured storage quota
  #[error("storage quota exceeded: {needed} bytes needed, {quota} bytes allowed")]
  QuotaExceeded { needed: usize, quota: usize },

  #[error("storage lock poisoned")]
  Poisoned,
}

/// Failure of a call against the remote endpoint.
#[derive(Error, Debug)]
pub enum ApiError {
  #[error("request timed out after {0:?}")]
  Timeout(Duration),

  #[error("transport error: {0}")]
  Transport(#[source] reqwest::Error),

  /// Non-success HTTP status from the endpoint
  #[error("HTTP {status}: {body}")]
  Http { status: u16, body: String },

  /// Envelope with `status: "error"`; carries the server message
  #[error("{0}")]
  Server(String),

  #[error("invalid response: {0}")]
  Decode(#[from] serde_json::Error),

  #[error("not logged in")]
  NotAuthenticated,

  #[error("session expired at {0}")]
  AuthExpired(DateTime<Utc>),

  #[error("local storage: {0}")]
  Storage(#[from] StorageError),
}

impl ApiError {
  /// Whether re-authenticating could fix this error.
  pub fn needs_login(&self) -> bool {
    matches!(self, ApiError::NotAuthenticated | ApiError::AuthExpired(_))
  }
}

impl From<reqwest::Error> for ApiError {
  fn from(err: reqwest::Error) -> Self {
    ApiError::Transport(err)
  }
}

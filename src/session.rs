//! Login session persisted next to the cache.
//!
//! The token and its expiry live under unprefixed keys, so cache invalidation
//! never touches them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::cache::KeyValueStorage;
use crate::error::{ApiError, StorageError};

pub const TOKEN_KEY: &str = "auth_token";
pub const EXPIRES_AT_KEY: &str = "auth_expires_at";

/// Login response from the remote endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
  pub token: String,
  /// RFC 3339 timestamp after which the token is rejected
  #[serde(rename = "expiresAt")]
  pub expires_at: String,
}

/// Outcome of inspecting the stored session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
  Anonymous,
  Active {
    token: String,
    expires_at: Option<DateTime<Utc>>,
  },
  Expired {
    expired_at: DateTime<Utc>,
  },
}

pub struct Session<S: KeyValueStorage> {
  storage: Arc<S>,
}

impl<S: KeyValueStorage> Session<S> {
  pub fn new(storage: Arc<S>) -> Self {
    Self { storage }
  }

  /// Persist a fresh login.
  pub fn save(&self, auth: &AuthSession) -> Result<(), StorageError> {
    self.storage.set_item(TOKEN_KEY, &auth.token)?;
    self.storage.set_item(EXPIRES_AT_KEY, &auth.expires_at)?;
    Ok(())
  }

  /// Forget the stored session.
  pub fn clear(&self) -> Result<(), StorageError> {
    self.storage.remove_item(TOKEN_KEY)?;
    self.storage.remove_item(EXPIRES_AT_KEY)?;
    Ok(())
  }

  /// Inspect the stored session as of `now` without changing it.
  ///
  /// An expiry that does not parse never expires the session.
  pub fn state_at(&self, now: DateTime<Utc>) -> Result<SessionState, StorageError> {
    let Some(token) = self.storage.get_item(TOKEN_KEY)? else {
      return Ok(SessionState::Anonymous);
    };

    let expires_at = match self.storage.get_item(EXPIRES_AT_KEY)? {
      Some(raw) => match DateTime::parse_from_rfc3339(&raw) {
        Ok(at) => Some(at.with_timezone(&Utc)),
        Err(e) => {
          warn!(value = %raw, error = %e, "ignoring unparseable session expiry");
          None
        }
      },
      None => None,
    };

    match expires_at {
      Some(at) if now > at => Ok(SessionState::Expired { expired_at: at }),
      _ => Ok(SessionState::Active { token, expires_at }),
    }
  }

  /// Check the stored session once at startup, logging out if it expired.
  pub fn restore(&self) -> Result<SessionState, StorageError> {
    let state = self.state_at(Utc::now())?;
    if let SessionState::Expired { expired_at } = &state {
      info!(%expired_at, "session expired, logging out");
      self.clear()?;
    }
    Ok(state)
  }

  /// Token for an authenticated call.
  pub fn token(&self) -> Result<String, ApiError> {
    match self.state_at(Utc::now())? {
      SessionState::Active { token, .. } => Ok(token),
      SessionState::Anonymous => Err(ApiError::NotAuthenticated),
      SessionState::Expired { expired_at } => {
        self.clear()?;
        Err(ApiError::AuthExpired(expired_at))
      }
    }
  }
}

impl<S: KeyValueStorage> Clone for Session<S> {
  fn clone(&self) -> Self {
    Self {
      storage: Arc::clone(&self.storage),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::MemoryStorage;
  use chrono::Duration;

  fn session() -> (Session<MemoryStorage>, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    (Session::new(Arc::clone(&storage)), storage)
  }

  fn auth(expires_at: DateTime<Utc>) -> AuthSession {
    AuthSession {
      token: "tok".to_string(),
      expires_at: expires_at.to_rfc3339(),
    }
  }

  #[test]
  fn test_anonymous_without_token() {
    let (session, _) = session();
    assert_eq!(session.restore().unwrap(), SessionState::Anonymous);
    assert!(matches!(session.token(), Err(ApiError::NotAuthenticated)));
  }

  #[test]
  fn test_saved_session_is_active() {
    let (session, _) = session();
    session.save(&auth(Utc::now() + Duration::hours(1))).unwrap();

    assert!(matches!(
      session.restore().unwrap(),
      SessionState::Active { .. }
    ));
    assert_eq!(session.token().unwrap(), "tok");
  }

  #[test]
  fn test_restore_clears_expired_session() {
    let (session, storage) = session();
    session.save(&auth(Utc::now() - Duration::minutes(1))).unwrap();

    assert!(matches!(
      session.restore().unwrap(),
      SessionState::Expired { .. }
    ));
    assert_eq!(storage.get_item(TOKEN_KEY).unwrap(), None);
    assert_eq!(storage.get_item(EXPIRES_AT_KEY).unwrap(), None);
  }

  #[test]
  fn test_token_reports_expiry_as_typed_error() {
    let (session, _) = session();
    session.save(&auth(Utc::now() - Duration::minutes(1))).unwrap();

    let err = session.token().unwrap_err();
    assert!(matches!(err, ApiError::AuthExpired(_)));
    assert!(err.needs_login());
    // The expired token is gone afterwards
    assert!(matches!(session.token(), Err(ApiError::NotAuthenticated)));
  }

  #[test]
  fn test_unparseable_expiry_keeps_session() {
    let (session, storage) = session();
    storage.set_item(TOKEN_KEY, "tok").unwrap();
    storage.set_item(EXPIRES_AT_KEY, "tomorrow-ish").unwrap();

    assert_eq!(
      session.restore().unwrap(),
      SessionState::Active {
        token: "tok".to_string(),
        expires_at: None
      }
    );
  }

  #[test]
  fn test_auth_session_wire_format() {
    let parsed: AuthSession =
      serde_json::from_str(r#"{"token":"t","expiresAt":"2030-01-01T00:00:00Z"}"#).unwrap();
    assert_eq!(parsed.token, "t");
    assert_eq!(parsed.expires_at, "2030-01-01T00:00:00Z");
  }
}

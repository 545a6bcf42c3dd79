//! Response envelope of the portfolio endpoint.
//!
//! Every response is `{"status": "success", "data": ...}` or
//! `{"status": "error", "error": "..."}`; some error paths use `message` instead.

use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;

use crate::error::ApiError;

const FALLBACK_ERROR: &str = "API Error";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Status {
  Success,
  Error,
}

#[derive(Debug, Deserialize)]
struct Envelope {
  status: Status,
  #[serde(default)]
  data: Value,
  error: Option<String>,
  message: Option<String>,
}

/// Decode a response body and return its `data` as `T`.
///
/// A success without `data` decodes from `null`.
pub fn unwrap_envelope<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
  let envelope: Envelope = serde_json::from_str(body)?;

  match envelope.status {
    Status::Success => Ok(serde_json::from_value(envelope.data)?),
    Status::Error => Err(ApiError::Server(
      envelope
        .error
        .or(envelope.message)
        .unwrap_or_else(|| FALLBACK_ERROR.to_string()),
    )),
  }
}

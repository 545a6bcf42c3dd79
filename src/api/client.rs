use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::envelope::unwrap_envelope;
use crate::error::ApiError;

/// HTTP client for the single portfolio endpoint.
///
/// Knows nothing about caching or sessions; every call is one POST.
#[derive(Clone)]
pub struct RemoteClient {
  http: reqwest::Client,
  endpoint: Url,
  timeout: Duration,
}

impl RemoteClient {
  pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, ApiError> {
    let http = reqwest::Client::builder().timeout(timeout).build()?;

    Ok(Self {
      http,
      endpoint,
      timeout,
    })
  }

  pub fn endpoint(&self) -> &Url {
    &self.endpoint
  }

  /// Invoke `action` with `fields` merged into the request body.
  ///
  /// The body goes out as `text/plain` so the hosted backend accepts it without
  /// a CORS preflight.
  pub async fn call<T: DeserializeOwned>(
    &self,
    action: &str,
    mut fields: Map<String, Value>,
  ) -> Result<T, ApiError> {
    fields.insert("action".to_string(), Value::String(action.to_string()));
    let body = serde_json::to_string(&fields)?;

    debug!(action, "sending request");

    let response = self
      .http
      .post(self.endpoint.clone())
      .header(CONTENT_TYPE, "text/plain;charset=utf-8")
      .body(body)
      .send()
      .await
      .map_err(|e| self.classify(e))?;

    let status = response.status();
    let text = response.text().await.map_err(|e| self.classify(e))?;

    if !status.is_success() {
      return Err(ApiError::Http {
        status: status.as_u16(),
        body: text,
      });
    }

    unwrap_envelope(&text)
  }

  fn classify(&self, err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
      ApiError::Timeout(self.timeout)
    } else {
      ApiError::Transport(err)
    }
  }
}

/// Turn a JSON object into request fields. Non-objects contribute nothing.
pub(crate) fn into_fields(value: Value) -> Map<String, Value> {
  match value {
    Value::Object(map) => map,
    _ => Map::new(),
  }
}

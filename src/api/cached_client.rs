//! Portfolio client with a read-through cache and write invalidation.

use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, info};

use crate::cache::{CacheStore, KeyValueStorage, QueryKey, SqliteStorage};
use crate::config::Config;
use crate::error::ApiError;
use crate::session::{AuthSession, Session};

use super::action::{Invalidation, MutateAction, QueryAction};
use super::client::{into_fields, RemoteClient};
use super::types::{Catalog, CreatedProject, FilePayload, Project, ProjectFilters, UploadResponse};

/// Portfolio client with transparent caching.
///
/// Queries are answered from the cache while fresh and fetched otherwise.
/// Mutations always go to the network and, once they succeed, discard cached
/// queries. Concurrent identical queries are not deduplicated.
pub struct PortfolioClient<S: KeyValueStorage> {
  inner: RemoteClient,
  cache: CacheStore<S>,
  session: Session<S>,
  invalidation: Invalidation,
}

impl PortfolioClient<SqliteStorage> {
  /// Create a client backed by the on-disk storage named in `config`.
  pub fn open(config: &Config) -> color_eyre::Result<Self> {
    let storage = match &config.cache.path {
      Some(path) => SqliteStorage::open_at(path)?,
      None => SqliteStorage::open()?,
    };
    let storage = Arc::new(storage);

    let inner = RemoteClient::new(config.api.endpoint()?, config.api.timeout())?;
    let cache = CacheStore::new(Arc::clone(&storage)).with_ttl(config.cache.ttl()?);

    Ok(
      Self::new(inner, cache, Session::new(storage))
        .with_invalidation(config.cache.invalidation),
    )
  }
}

impl<S: KeyValueStorage> PortfolioClient<S> {
  pub fn new(inner: RemoteClient, cache: CacheStore<S>, session: Session<S>) -> Self {
    Self {
      inner,
      cache,
      session,
      invalidation: Invalidation::All,
    }
  }

  pub fn with_invalidation(mut self, invalidation: Invalidation) -> Self {
    self.invalidation = invalidation;
    self
  }

  pub fn cache(&self) -> &CacheStore<S> {
    &self.cache
  }

  pub fn session(&self) -> &Session<S> {
    &self.session
  }

  /// Run a query, serving a fresh cached result unless `force_refresh` is set.
  ///
  /// The unwrapped `data` is cached as received, then decoded into `T`.
  pub async fn query<T: DeserializeOwned>(
    &self,
    action: QueryAction,
    params: Map<String, Value>,
    force_refresh: bool,
  ) -> Result<T, ApiError> {
    let key = QueryKey::new(action.as_str(), &Value::Object(params.clone()));

    if !force_refresh {
      if let Some(hit) = self.cache.get::<T>(&key) {
        return Ok(hit);
      }
    }
    debug!(%key, force_refresh, "fetching from network");

    let data: Value = self.inner.call(action.as_str(), params).await?;
    let decoded: T = serde_json::from_value(data.clone())?;
    self.cache.set(&key, &data);

    Ok(decoded)
  }

  /// Run an authenticated mutation and invalidate the cache if it succeeds.
  ///
  /// Fails with [`ApiError::NotAuthenticated`] or [`ApiError::AuthExpired`]
  /// before touching the network when there is no usable session.
  pub async fn mutate<T: DeserializeOwned>(
    &self,
    action: MutateAction,
    mut params: Map<String, Value>,
  ) -> Result<T, ApiError> {
    let token = self.session.token()?;
    params.insert("token".to_string(), Value::String(token));

    // The write has landed once the envelope reports success, whatever shape
    // `data` has, so invalidate before decoding.
    let data: Value = self.inner.call(action.as_str(), params).await?;
    self.invalidate(action);

    Ok(serde_json::from_value(data)?)
  }

  fn invalidate(&self, action: MutateAction) {
    let removed = match self.invalidation {
      Invalidation::All => self.cache.clear_all(),
      Invalidation::Scoped => action
        .affects()
        .iter()
        .map(|query| self.cache.clear_matching(&QueryKey::family(query.as_str())))
        .sum::<usize>(),
    };
    info!(action = action.as_str(), removed, "cache invalidated");
  }

  /// List projects matching `filters`.
  pub async fn list_projects(
    &self,
    filters: &ProjectFilters,
    force_refresh: bool,
  ) -> Result<Vec<Project>, ApiError> {
    let params = into_fields(serde_json::to_value(filters)?);
    self
      .query(QueryAction::ListProjects, params, force_refresh)
      .await
  }

  /// Get a single project by id.
  pub async fn get_project(&self, id: &str, force_refresh: bool) -> Result<Project, ApiError> {
    self
      .query(QueryAction::GetProject, into_fields(json!({ "id": id })), force_refresh)
      .await
  }

  /// List the downloadable catalogs.
  pub async fn list_catalogs(&self, force_refresh: bool) -> Result<Vec<Catalog>, ApiError> {
    self
      .query(QueryAction::ListCatalogs, Map::new(), force_refresh)
      .await
  }

  /// Log in and persist the session.
  ///
  /// Never cached, and leaves cached data alone: only the session changes.
  pub async fn login(&self, username: &str, password: &str) -> Result<AuthSession, ApiError> {
    let auth: AuthSession = self
      .inner
      .call(
        "login",
        into_fields(json!({ "username": username, "password": password })),
      )
      .await?;

    self.session.save(&auth)?;
    info!(expires_at = %auth.expires_at, "logged in");
    Ok(auth)
  }

  /// Forget the session. Cached data is public and stays.
  pub fn logout(&self) -> Result<(), ApiError> {
    self.session.clear()?;
    Ok(())
  }

  pub async fn create_project(&self, project: &Project) -> Result<CreatedProject, ApiError> {
    self
      .mutate(
        MutateAction::CreateProject,
        into_fields(json!({ "payload": project })),
      )
      .await
  }

  pub async fn update_project(&self, id: &str, project: &Project) -> Result<Value, ApiError> {
    self
      .mutate(
        MutateAction::UpdateProject,
        into_fields(json!({ "id": id, "payload": project })),
      )
      .await
  }

  pub async fn delete_project(&self, id: &str) -> Result<Value, ApiError> {
    self
      .mutate(MutateAction::DeleteProject, into_fields(json!({ "id": id })))
      .await
  }

  pub async fn upload_project_images(
    &self,
    id: &str,
    files: &[FilePayload],
  ) -> Result<UploadResponse, ApiError> {
    self
      .mutate(
        MutateAction::UploadProjectImages,
        into_fields(json!({ "id": id, "files": files })),
      )
      .await
  }

  pub async fn upload_catalog(&self, file: &FilePayload) -> Result<Value, ApiError> {
    self
      .mutate(MutateAction::UploadCatalog, into_fields(json!({ "file": file })))
      .await
  }

  pub async fn delete_catalog(&self, id: &str) -> Result<Value, ApiError> {
    self
      .mutate(MutateAction::DeleteCatalog, into_fields(json!({ "id": id })))
      .await
  }
}

impl<S: KeyValueStorage> Clone for PortfolioClient<S> {
  fn clone(&self) -> Self {
    Self {
      inner: self.inner.clone(),
      cache: self.cache.clone(),
      session: self.session.clone(),
      invalidation: self.invalidation,
    }
  }
}

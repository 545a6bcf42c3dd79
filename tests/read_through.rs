use chrono::{Duration as ChronoDuration, Utc};
use httpmock::MockServer;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use damon::api::types::{Category, Project, ProjectFilters};
use damon::api::{Invalidation, PortfolioClient, QueryAction, RemoteClient};
use damon::cache::{CacheStore, KeyValueStorage, MemoryStorage, QueryKey};
use damon::error::ApiError;
use damon::session::{AuthSession, Session, TOKEN_KEY};

const PROJECTS: &str = r#"{"status":"success","data":[
  {"id":"p1","title":"Villa","category":"Residential","system_type":"VRF"}
]}"#;

fn client_for(url: &str, storage: Arc<MemoryStorage>) -> PortfolioClient<MemoryStorage> {
  client_with_timeout(url, storage, Duration::from_secs(5))
}

fn client_with_timeout(
  url: &str,
  storage: Arc<MemoryStorage>,
  timeout: Duration,
) -> PortfolioClient<MemoryStorage> {
  let remote = RemoteClient::new(Url::parse(url).unwrap(), timeout).unwrap();
  PortfolioClient::new(
    remote,
    CacheStore::new(Arc::clone(&storage)),
    Session::new(storage),
  )
}

fn log_in(client: &PortfolioClient<MemoryStorage>) {
  client
    .session()
    .save(&AuthSession {
      token: "admin-token".to_string(),
      expires_at: (Utc::now() + ChronoDuration::hours(1)).to_rfc3339(),
    })
    .unwrap();
}

fn residential() -> ProjectFilters {
  ProjectFilters {
    category: Some(Category::Residential),
    ..Default::default()
  }
}

fn params(pairs: &[(&str, Value)]) -> Map<String, Value> {
  pairs
    .iter()
    .map(|(k, v)| (k.to_string(), v.clone()))
    .collect()
}

#[tokio::test]
async fn test_query_hits_cache_until_a_mutation_succeeds() {
  let server = MockServer::start_async().await;
  let mock = server
    .mock_async(|when, then| {
      when.method("POST").path("/");
      then.status(200).body(PROJECTS);
    })
    .await;
  let client = client_for(&server.base_url(), Arc::new(MemoryStorage::new()));
  log_in(&client);

  let first = client.list_projects(&residential(), false).await.unwrap();
  assert_eq!(first[0].id, "p1");
  mock.assert_hits_async(1).await;

  let second = client.list_projects(&residential(), false).await.unwrap();
  assert_eq!(second, first);
  mock.assert_hits_async(1).await;

  client.delete_project("p1").await.unwrap();
  mock.assert_hits_async(2).await;

  client.list_projects(&residential(), false).await.unwrap();
  mock.assert_hits_async(3).await;
}

#[tokio::test]
async fn test_parameter_order_does_not_change_the_key() {
  let server = MockServer::start_async().await;
  let mock = server
    .mock_async(|when, then| {
      when.method("POST").path("/");
      then.status(200).body(r#"{"status":"success","data":[]}"#);
    })
    .await;
  let client = client_for(&server.base_url(), Arc::new(MemoryStorage::new()));

  let _: Value = client
    .query(
      QueryAction::ListProjects,
      params(&[("a", json!(1)), ("b", json!(2))]),
      false,
    )
    .await
    .unwrap();
  let _: Value = client
    .query(
      QueryAction::ListProjects,
      params(&[("b", json!(2)), ("a", json!(1))]),
      false,
    )
    .await
    .unwrap();

  mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_different_filters_never_cross_hit() {
  let server = MockServer::start_async().await;
  let mock = server
    .mock_async(|when, then| {
      when.method("POST").path("/");
      then.status(200).body(r#"{"status":"success","data":[]}"#);
    })
    .await;
  let client = client_for(&server.base_url(), Arc::new(MemoryStorage::new()));

  let commercial = ProjectFilters {
    category: Some(Category::Commercial),
    ..Default::default()
  };
  client.list_projects(&residential(), false).await.unwrap();
  client.list_projects(&commercial, false).await.unwrap();

  mock.assert_hits_async(2).await;
}

#[tokio::test]
async fn test_force_refresh_bypasses_fresh_entry() {
  let server = MockServer::start_async().await;
  let mock = server
    .mock_async(|when, then| {
      when.method("POST").path("/");
      then.status(200).body(r#"{"status":"success","data":[]}"#);
    })
    .await;
  let client = client_for(&server.base_url(), Arc::new(MemoryStorage::new()));

  client.list_catalogs(false).await.unwrap();
  client.list_catalogs(true).await.unwrap();
  client.list_catalogs(false).await.unwrap();

  mock.assert_hits_async(2).await;
}

#[tokio::test]
async fn test_failed_mutation_keeps_cache() {
  let server = MockServer::start_async().await;
  let list = server
    .mock_async(|when, then| {
      when.method("POST").path("/");
      then.status(200).body(PROJECTS);
    })
    .await;
  let client = client_for(&server.base_url(), Arc::new(MemoryStorage::new()));
  log_in(&client);

  client.list_projects(&residential(), false).await.unwrap();
  list.delete_async().await;

  let failure = server
    .mock_async(|when, then| {
      when.method("POST").path("/");
      then
        .status(200)
        .body(r#"{"status":"error","error":"Project not found"}"#);
    })
    .await;

  let err = client.delete_project("missing").await.unwrap_err();
  assert!(matches!(err, ApiError::Server(ref m) if m == "Project not found"));

  // Served from cache: the failing mock sees only the delete
  client.list_projects(&residential(), false).await.unwrap();
  failure.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_accepted_mutation_with_unexpected_data_still_invalidates() {
  let server = MockServer::start_async().await;
  let list = server
    .mock_async(|when, then| {
      when.method("POST").path("/");
      then.status(200).body(PROJECTS);
    })
    .await;
  let client = client_for(&server.base_url(), Arc::new(MemoryStorage::new()));
  log_in(&client);

  client.list_projects(&residential(), false).await.unwrap();
  list.delete_async().await;

  server
    .mock_async(|when, then| {
      when.method("POST").path("/");
      then
        .status(200)
        .body(r#"{"status":"success","data":{"ok":true}}"#);
    })
    .await;

  let err = client.upload_project_images("p1", &[]).await.unwrap_err();
  assert!(matches!(err, ApiError::Decode(_)));

  let key = QueryKey::new("listProjects", &json!({"category": "Residential"}));
  assert!(client.cache().get::<Value>(&key).is_none());
}

#[tokio::test]
async fn test_query_request_carries_action_and_params() {
  let server = MockServer::start_async().await;
  let mock = server
    .mock_async(|when, then| {
      when
        .method("POST")
        .path("/")
        .header("content-type", "text/plain;charset=utf-8")
        .json_body_includes(r#"{"action":"listProjects","category":"Residential"}"#);
      then.status(200).body(PROJECTS);
    })
    .await;
  let client = client_for(&server.base_url(), Arc::new(MemoryStorage::new()));

  client.list_projects(&residential(), false).await.unwrap();

  mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_mutation_request_carries_token_id_and_payload() {
  let server = MockServer::start_async().await;
  let mock = server
    .mock_async(|when, then| {
      when
        .method("POST")
        .path("/")
        .header("content-type", "text/plain;charset=utf-8")
        .json_body_includes(
          r#"{"action":"updateProject","token":"admin-token","id":"p1","payload":{"title":"Villa"}}"#,
        );
      then
        .status(200)
        .body(r#"{"status":"success","data":{"updated":true}}"#);
    })
    .await;
  let client = client_for(&server.base_url(), Arc::new(MemoryStorage::new()));
  log_in(&client);

  let project: Project = serde_json::from_value(json!({
    "title": "Villa",
    "category": "Residential",
    "system_type": "VRF"
  }))
  .unwrap();
  client.update_project("p1", &project).await.unwrap();

  mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_login_does_not_clear_cache() {
  let server = MockServer::start_async().await;
  let list = server
    .mock_async(|when, then| {
      when.method("POST").path("/");
      then.status(200).body(PROJECTS);
    })
    .await;
  let storage = Arc::new(MemoryStorage::new());
  let client = client_for(&server.base_url(), Arc::clone(&storage));

  client.list_projects(&residential(), false).await.unwrap();
  list.delete_async().await;

  server
    .mock_async(|when, then| {
      when.method("POST").path("/");
      then.status(200).body(
        r#"{"status":"success","data":{"token":"fresh","expiresAt":"2099-01-01T00:00:00Z"}}"#,
      );
    })
    .await;

  let auth = client.login("admin", "secret").await.unwrap();
  assert_eq!(auth.token, "fresh");
  assert_eq!(
    storage.get_item(TOKEN_KEY).unwrap().as_deref(),
    Some("fresh")
  );

  let key = QueryKey::new("listProjects", &json!({"category": "Residential"}));
  assert!(client.cache().get::<Value>(&key).is_some());
}

#[tokio::test]
async fn test_invalidation_preserves_session() {
  let server = MockServer::start_async().await;
  server
    .mock_async(|when, then| {
      when.method("POST").path("/");
      then.status(200).body(r#"{"status":"success","data":[]}"#);
    })
    .await;
  let storage = Arc::new(MemoryStorage::new());
  let client = client_for(&server.base_url(), Arc::clone(&storage));
  log_in(&client);

  client.list_catalogs(false).await.unwrap();
  client.delete_catalog("c1").await.unwrap();

  assert_eq!(storage.keys().unwrap().len(), 2);
  assert_eq!(client.session().token().unwrap(), "admin-token");
}

#[tokio::test]
async fn test_scoped_invalidation_keeps_unrelated_entries() {
  let server = MockServer::start_async().await;
  server
    .mock_async(|when, then| {
      when.method("POST").path("/");
      then.status(200).body(r#"{"status":"success","data":[]}"#);
    })
    .await;
  let client = client_for(&server.base_url(), Arc::new(MemoryStorage::new()))
    .with_invalidation(Invalidation::Scoped);
  log_in(&client);

  client.list_projects(&residential(), false).await.unwrap();
  client.list_catalogs(false).await.unwrap();
  client.delete_project("p1").await.unwrap();

  let projects = QueryKey::new("listProjects", &json!({"category": "Residential"}));
  let catalogs = QueryKey::new("listCatalogs", &json!({}));
  assert!(client.cache().get::<Value>(&projects).is_none());
  assert!(client.cache().get::<Value>(&catalogs).is_some());
}

#[tokio::test]
async fn test_storage_failure_does_not_fail_query() {
  let server = MockServer::start_async().await;
  let mock = server
    .mock_async(|when, then| {
      when.method("POST").path("/");
      then.status(200).body(PROJECTS);
    })
    .await;
  let client = client_for(&server.base_url(), Arc::new(MemoryStorage::with_quota(0)));

  let projects = client.list_projects(&residential(), false).await.unwrap();
  assert_eq!(projects.len(), 1);

  // Nothing could be cached, so the next call goes out again
  client.list_projects(&residential(), false).await.unwrap();
  mock.assert_hits_async(2).await;
}

#[tokio::test]
async fn test_corrupt_entry_is_refetched() {
  let server = MockServer::start_async().await;
  let mock = server
    .mock_async(|when, then| {
      when.method("POST").path("/");
      then.status(200).body(PROJECTS);
    })
    .await;
  let storage = Arc::new(MemoryStorage::new());
  storage
    .set_item(r#"damon_cache_listProjects_{"category":"Residential"}"#, "{oops")
    .unwrap();
  let client = client_for(&server.base_url(), storage);

  let projects = client.list_projects(&residential(), false).await.unwrap();
  assert_eq!(projects[0].title, "Villa");
  mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_mutation_without_session_never_reaches_network() {
  let server = MockServer::start_async().await;
  let mock = server
    .mock_async(|when, then| {
      when.method("POST").path("/");
      then.status(200).body(r#"{"status":"success","data":null}"#);
    })
    .await;
  let client = client_for(&server.base_url(), Arc::new(MemoryStorage::new()));

  let err = client.delete_catalog("c1").await.unwrap_err();
  assert!(matches!(err, ApiError::NotAuthenticated));
  mock.assert_hits_async(0).await;
}

#[tokio::test]
async fn test_expired_session_is_a_typed_error() {
  let server = MockServer::start_async().await;
  let mock = server
    .mock_async(|when, then| {
      when.method("POST").path("/");
      then.status(200).body(r#"{"status":"success","data":null}"#);
    })
    .await;
  let client = client_for(&server.base_url(), Arc::new(MemoryStorage::new()));
  client
    .session()
    .save(&AuthSession {
      token: "old".to_string(),
      expires_at: (Utc::now() - ChronoDuration::minutes(5)).to_rfc3339(),
    })
    .unwrap();

  let err = client.delete_project("p1").await.unwrap_err();
  assert!(matches!(err, ApiError::AuthExpired(_)));
  assert!(err.needs_login());
  mock.assert_hits_async(0).await;
}

#[tokio::test]
async fn test_http_error_status_is_surfaced_and_not_cached() {
  let server = MockServer::start_async().await;
  server
    .mock_async(|when, then| {
      when.method("POST").path("/");
      then.status(503).body("backend warming up");
    })
    .await;
  let storage = Arc::new(MemoryStorage::new());
  let client = client_for(&server.base_url(), Arc::clone(&storage));

  let err = client.list_catalogs(false).await.unwrap_err();
  assert!(matches!(err, ApiError::Http { status: 503, .. }));
  assert!(storage.keys().unwrap().is_empty());
}

#[tokio::test]
async fn test_timeout_is_a_network_error() {
  let server = MockServer::start_async().await;
  server
    .mock_async(|when, then| {
      when.method("POST").path("/");
      then
        .status(200)
        .delay(Duration::from_millis(500))
        .body(r#"{"status":"success","data":[]}"#);
    })
    .await;
  let storage = Arc::new(MemoryStorage::new());
  let client = client_with_timeout(
    &server.base_url(),
    Arc::clone(&storage),
    Duration::from_millis(50),
  );

  let err = client.list_catalogs(false).await.unwrap_err();
  assert!(matches!(err, ApiError::Timeout(_)));
  assert!(storage.keys().unwrap().is_empty());
}

#[tokio::test]
async fn test_unreachable_endpoint_is_transport_error() {
  let storage = Arc::new(MemoryStorage::new());
  let client = client_for("http://127.0.0.1:1/", Arc::clone(&storage));

  let err = client.list_projects(&residential(), false).await.unwrap_err();
  assert!(matches!(err, ApiError::Transport(_)));
  assert!(storage.keys().unwrap().is_empty());
}

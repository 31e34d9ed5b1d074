//! Datasource client behaviour against an in-memory platform
//!
//! `FakePlatform` implements `Transport` and keeps datasources in a map, so
//! the tests exercise real request paths, envelopes and status codes without
//! a network.

use async_trait::async_trait;
use dsctl::client::{DatasourceClient, DynamicConfigRequest, TestFailureKind, TestReport};
use dsctl::error::DatasourceError;
use dsctl::model::{
    ConnectorConfig, DatasourceDraft, DatasourceType, MongoConfig, ServerParams, SqlConfig,
};
use dsctl::transport::{ApiRequest, ApiResponse, Method, Transport, TransportError};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const ORG: &str = "org-1";
const APP: &str = "app-1";

#[derive(Default)]
struct PlatformState {
    next_id: usize,
    datasources: HashMap<String, Value>,
    structure_cache: HashMap<String, Value>,
}

/// In-memory stand-in for the platform's datasource API
#[derive(Default)]
struct FakePlatform {
    state: Mutex<PlatformState>,
    structure_probes: AtomicUsize,
}

impl FakePlatform {
    fn handle(&self, request: ApiRequest) -> ApiResponse {
        let (path, query) = match request.path.split_once('?') {
            Some((path, query)) => (path, query),
            None => (request.path.as_str(), ""),
        };
        let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();

        match (request.method, segments.as_slice()) {
            (Method::Post, ["v1", "datasources"]) => {
                self.create(request.body.unwrap_or_default())
            }
            (Method::Post, ["v1", "datasources", "test"]) => ApiResponse::ok(Value::Null),
            (Method::Get, ["v1", "datasources", "listByOrg"]) => {
                self.list(query_param(query, "orgId"))
            }
            (Method::Get, ["v1", "datasources", "listByApp"]) => {
                // Every app of the fake belongs to the one organization
                if query_param(query, "appId").as_deref() == Some(APP) {
                    self.list(Some(ORG.to_string()))
                } else {
                    ApiResponse::error(404, "app not found")
                }
            }
            (Method::Put, ["v1", "datasources", id]) => {
                self.update(id, request.body.unwrap_or_default())
            }
            (Method::Delete, ["v1", "datasources", id]) => self.delete(id),
            (Method::Get, ["v1", "datasources", id, "structure"]) => {
                self.structure(id, query_param(query, "ignoreCache").as_deref() == Some("true"))
            }
            (Method::Post, ["v1", "datasources", "getPluginDynamicConfig"]) => {
                let plugin = request.body.as_ref().and_then(|b| b[0]["pluginName"].as_str());
                match plugin {
                    Some("lark") => ApiResponse::ok(json!([{"label": "Sheet 1", "value": "s1"}])),
                    _ => ApiResponse::error(404, "plugin not found"),
                }
            }
            _ => ApiResponse::error(404, "no such route"),
        }
    }

    fn create(&self, body: Value) -> ApiResponse {
        let mut state = self.state.lock().unwrap();
        let org = body["organizationId"].as_str().unwrap_or(ORG).to_string();
        let name = body["name"].as_str().unwrap_or_default().to_string();

        let duplicate = state
            .datasources
            .values()
            .any(|ds| ds["organizationId"] == org.as_str() && ds["name"] == name.as_str());
        if duplicate {
            return ApiResponse::error(409, &format!("datasource '{}' already exists", name));
        }

        state.next_id += 1;
        let id = format!("ds-{}", state.next_id);
        let stored = json!({
            "id": id,
            "name": name,
            "type": body["type"],
            "organizationId": org,
            "datasourceConfig": body["datasourceConfig"],
        });
        state.datasources.insert(id, stored.clone());
        ApiResponse::ok(stored)
    }

    fn list(&self, org: Option<String>) -> ApiResponse {
        let state = self.state.lock().unwrap();
        let infos: Vec<Value> = state
            .datasources
            .values()
            .filter(|ds| org.as_deref().is_some_and(|org| ds["organizationId"] == org))
            .map(|ds| json!({"datasource": ds, "edit": true, "creatorName": "alice"}))
            .collect();
        ApiResponse::ok(Value::Array(infos))
    }

    fn update(&self, id: &str, body: Value) -> ApiResponse {
        let mut state = self.state.lock().unwrap();
        let Some(stored) = state.datasources.get_mut(id) else {
            return ApiResponse::error(404, &format!("datasource {} not found", id));
        };
        stored["name"] = body["name"].clone();
        stored["datasourceConfig"] = body["datasourceConfig"].clone();
        ApiResponse::ok(stored.clone())
    }

    fn delete(&self, id: &str) -> ApiResponse {
        let mut state = self.state.lock().unwrap();
        match state.datasources.remove(id) {
            Some(removed) => ApiResponse::ok(removed),
            None => ApiResponse::error(404, &format!("datasource {} not found", id)),
        }
    }

    fn structure(&self, id: &str, ignore_cache: bool) -> ApiResponse {
        let mut state = self.state.lock().unwrap();
        if !state.datasources.contains_key(id) {
            return ApiResponse::error(404, &format!("datasource {} not found", id));
        }
        if !ignore_cache {
            if let Some(cached) = state.structure_cache.get(id) {
                return ApiResponse::ok(cached.clone());
            }
        }

        let probe = self.structure_probes.fetch_add(1, Ordering::SeqCst) + 1;
        let structure = json!({
            "tables": [{
                "name": format!("orders_v{}", probe),
                "type": "TABLE",
                "columns": [{"name": "id", "type": "int8", "isAutogenerated": true}],
                "keys": []
            }]
        });
        state.structure_cache.insert(id.to_string(), structure.clone());
        ApiResponse::ok(structure)
    }
}

#[async_trait]
impl Transport for FakePlatform {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        Ok(self.handle(request))
    }
}

/// A target that accepts the connection and never answers
struct Unreachable;

#[async_trait]
impl Transport for Unreachable {
    async fn send(&self, _request: ApiRequest) -> Result<ApiResponse, TransportError> {
        std::future::pending().await
    }
}

fn query_param(query: &str, name: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

fn platform() -> (Arc<FakePlatform>, DatasourceClient) {
    let platform = Arc::new(FakePlatform::default());
    let client = DatasourceClient::new(platform.clone());
    (platform, client)
}

fn postgres_draft(name: &str) -> DatasourceDraft {
    DatasourceDraft::new(
        name,
        DatasourceType::Postgres,
        SqlConfig {
            server: ServerParams {
                host: "db.internal".to_string(),
                port: "5432".to_string(),
                database: "shop".to_string(),
                username: "app".to_string(),
                password: "pw".to_string(),
            },
            using_ssl: false,
            enable_turn_off_prepared_statement: false,
        },
    )
    .in_organization(ORG)
}

#[tokio::test]
async fn test_create_then_list_includes_new_datasource() {
    let (_, client) = platform();

    let created = client.create(&postgres_draft("orders")).await.unwrap();
    assert!(!created.id.is_empty());
    assert_eq!(created.datasource_type, DatasourceType::Postgres);

    let by_org = client.list_by_org(ORG).await.unwrap();
    assert!(by_org.iter().any(|info| info.datasource.id == created.id));

    let by_app = client.list_by_app(APP).await.unwrap();
    let info = by_app
        .iter()
        .find(|info| info.datasource.id == created.id)
        .unwrap();
    assert_eq!(info.datasource, created);
    assert!(info.edit);
}

#[tokio::test]
async fn test_mongo_uri_example_creates_and_es_tag_is_rejected() {
    let (_, client) = platform();

    let mongo = DatasourceDraft::from_raw(
        "events",
        DatasourceType::Mongodb,
        &json!({
            "uri": "mongodb://h/db", "usingUri": true,
            "host": "", "port": "", "database": "", "username": "", "password": "",
            "usingSsl": false, "enableTurnOffPreparedStatement": false
        }),
    )
    .unwrap()
    .in_organization(ORG);
    let created = client.create(&mongo).await.unwrap();
    assert_eq!(created.id, "ds-1");

    let mut as_es = mongo.clone();
    as_es.datasource_type = DatasourceType::Es;
    let err = client.create(&as_es).await.unwrap_err();
    assert!(matches!(err, DatasourceError::Validation(_)));
    assert_eq!(err.kind(), "ValidationError");

    // Rejected locally, so nothing new reached the platform
    assert_eq!(client.list_by_org(ORG).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_duplicate_name_is_a_conflict() {
    let (_, client) = platform();
    client.create(&postgres_draft("orders")).await.unwrap();

    let err = client.create(&postgres_draft("orders")).await.unwrap_err();
    assert!(matches!(err, DatasourceError::Conflict(ref m) if m.contains("orders")));
}

#[tokio::test]
async fn test_update_replaces_configuration() {
    let (_, client) = platform();
    let draft = DatasourceDraft::new(
        "events",
        DatasourceType::Mongodb,
        MongoConfig::with_uri("mongodb://a/db"),
    )
    .in_organization(ORG);
    let created = client.create(&draft).await.unwrap();

    let mut draft = created.to_draft();
    draft.config = ConnectorConfig::from(MongoConfig::with_uri("mongodb://b/db"));
    let updated = client.update(&created.id, &draft).await.unwrap();

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.config, draft.config);
}

#[tokio::test]
async fn test_delete_then_update_or_delete_is_not_found() {
    let (_, client) = platform();
    let created = client.create(&postgres_draft("orders")).await.unwrap();

    let deleted = client.delete(&created.id).await.unwrap();
    assert_eq!(deleted.id(), created.id);

    let err = client.update(&created.id, &created.to_draft()).await.unwrap_err();
    assert!(matches!(err, DatasourceError::NotFound(_)));

    let err = client.delete(&created.id).await.unwrap_err();
    assert!(matches!(err, DatasourceError::NotFound(_)));
    assert_eq!(err.kind(), "NotFound");
}

#[tokio::test]
async fn test_concurrent_creates_get_distinct_ids() {
    let (_, client) = platform();

    let drafts: Vec<DatasourceDraft> = (0..8)
        .map(|i| postgres_draft(&format!("db-{}", i)))
        .collect();
    let results = futures::future::join_all(drafts.iter().map(|draft| client.create(draft))).await;

    let mut ids: Vec<String> = results.into_iter().map(|r| r.unwrap().id).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 8);
    assert_eq!(client.list_by_org(ORG).await.unwrap().len(), 8);
}

#[tokio::test]
async fn test_structure_ignore_cache_forces_fresh_probe() {
    let (platform, client) = platform();
    let created = client.create(&postgres_draft("orders")).await.unwrap();

    let cached = client.fetch_structure(&created.id, false).await.unwrap();
    let again = client.fetch_structure(&created.id, false).await.unwrap();
    assert_eq!(cached, again);
    assert_eq!(platform.structure_probes.load(Ordering::SeqCst), 1);

    let fresh = client.fetch_structure(&created.id, true).await.unwrap();
    assert_eq!(platform.structure_probes.load(Ordering::SeqCst), 2);
    assert!(fresh.table("orders_v2").is_some());
}

#[tokio::test]
async fn test_dynamic_plugin_config_is_opaque() {
    let (_, client) = platform();

    let request = DynamicConfigRequest {
        plugin_name: "lark".to_string(),
        path: "sheets".to_string(),
        data_source_config: json!({"appToken": "t"}),
        data_source_id: None,
    };
    let options: Vec<Value> = client.fetch_dynamic_plugin_config(&request).await.unwrap();
    assert_eq!(options[0]["value"], "s1");

    let unknown = DynamicConfigRequest {
        plugin_name: "nope".to_string(),
        ..request
    };
    let err = client
        .fetch_dynamic_plugin_config::<Value>(&unknown)
        .await
        .unwrap_err();
    assert!(matches!(err, DatasourceError::Upstream(_)));
}

#[tokio::test]
async fn test_successful_connection_test() {
    let (_, client) = platform();
    let report = client.test(&postgres_draft("orders")).await.unwrap();
    assert_eq!(report, TestReport::Success);
}

#[tokio::test(start_paused = true)]
async fn test_unreachable_target_times_out_on_the_test_deadline() {
    let client = DatasourceClient::new(Arc::new(Unreachable));
    let timeouts = client.timeouts();

    let started = tokio::time::Instant::now();
    let report = client.test(&postgres_draft("orders")).await.unwrap();
    let elapsed = started.elapsed();

    assert_eq!(
        report,
        TestReport::Failed {
            kind: TestFailureKind::Timeout {
                after: timeouts.test()
            },
            message: format!("no response within {}ms", timeouts.test().as_millis()),
        }
    );
    assert!(elapsed >= timeouts.request());
    assert!(elapsed >= timeouts.test());
    assert!(elapsed < timeouts.test() + Duration::from_secs(1));

    let err = report.into_result().unwrap_err();
    assert_eq!(err.kind(), "TimeoutError");
}

#[tokio::test(start_paused = true)]
async fn test_ordinary_operations_use_the_request_deadline() {
    let client = DatasourceClient::new(Arc::new(Unreachable));

    let started = tokio::time::Instant::now();
    let err = client.list_by_org(ORG).await.unwrap_err();

    assert!(matches!(
        err,
        DatasourceError::Timeout { operation: "listByOrg", after } if after == Duration::from_secs(10)
    ));
    assert!(started.elapsed() < Duration::from_secs(11));
}

//! Datasource access client
//!
//! Thin, stateless pass-through over a [`Transport`]: every operation is one
//! exchange against the datasource collection, with no caching, batching or
//! retries. Concurrent updates of the same datasource are resolved by the
//! server.

use crate::error::{DatasourceError, DatasourceResult, ValidationError};
use crate::model::{
    Datasource, DatasourceDraft, DatasourceInfo, DatasourceStructure, DatasourceTypeInfo,
    DeletedDatasource, PluginDatasource, RawDatasource, RawDatasourceInfo,
};
use crate::transport::{ApiRequest, ApiResponse, Method, Transport, TransportError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Base path of the datasource collection
pub const DATASOURCE_BASE: &str = "v1/datasources";

/// Deadline for ordinary operations
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Deadline for connection tests
pub const DEFAULT_TEST_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Per-operation deadlines
///
/// `test` establishes a real connection (TLS, auth negotiation) and always gets
/// a strictly longer deadline than metadata operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientTimeouts {
    request: Duration,
    test: Duration,
}

impl ClientTimeouts {
    pub fn new(request: Duration, test: Duration) -> Result<Self, ValidationError> {
        if request.is_zero() {
            return Err(ValidationError::single(
                "requestTimeoutMs",
                "must be greater than zero",
            ));
        }
        if test <= request {
            return Err(ValidationError::single(
                "testTimeoutMs",
                format!(
                    "must be longer than the request timeout ({}ms)",
                    request.as_millis()
                ),
            ));
        }
        Ok(Self { request, test })
    }

    pub fn request(&self) -> Duration {
        self.request
    }

    pub fn test(&self) -> Duration {
        self.test
    }
}

impl Default for ClientTimeouts {
    fn default() -> Self {
        Self {
            request: DEFAULT_REQUEST_TIMEOUT,
            test: DEFAULT_TEST_TIMEOUT,
        }
    }
}

/// Why a connection test failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestFailureKind {
    /// The probe did not finish within the test deadline
    Timeout { after: Duration },
    /// The target was reached but no working session could be established
    Connection,
}

/// Outcome of a connection test
///
/// A failed test is an ordinary result, not an error: callers render the
/// message as a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestReport {
    Success,
    Failed {
        kind: TestFailureKind,
        message: String,
    },
}

impl TestReport {
    pub fn is_success(&self) -> bool {
        matches!(self, TestReport::Success)
    }

    /// Convert into the error taxonomy, for callers that want `?`
    pub fn into_result(self) -> DatasourceResult<()> {
        match self {
            TestReport::Success => Ok(()),
            TestReport::Failed {
                kind: TestFailureKind::Timeout { after },
                ..
            } => Err(DatasourceError::Timeout {
                operation: "test",
                after,
            }),
            TestReport::Failed {
                kind: TestFailureKind::Connection,
                message,
            } => Err(DatasourceError::Connection(message)),
        }
    }
}

/// Query for plugin-provided configuration options
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicConfigRequest {
    pub plugin_name: String,
    pub path: String,
    /// Current configuration draft, in the plugin's own shape
    pub data_source_config: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_source_id: Option<String>,
}

/// Response envelope wrapping every payload
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    data: Value,
}

struct Call {
    operation: &'static str,
    method: Method,
    path: String,
    body: Option<Value>,
    timeout: Duration,
}

/// Client for the datasource resource collection
#[derive(Clone)]
pub struct DatasourceClient {
    transport: Arc<dyn Transport>,
    timeouts: ClientTimeouts,
}

impl DatasourceClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            timeouts: ClientTimeouts::default(),
        }
    }

    pub fn with_timeouts(mut self, timeouts: ClientTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn timeouts(&self) -> ClientTimeouts {
        self.timeouts
    }

    /// Datasources visible to an app
    pub async fn list_by_app(&self, app_id: &str) -> DatasourceResult<Vec<DatasourceInfo>> {
        let app_id = non_empty("appId", app_id)?;
        let call = self.call(
            "listByApp",
            Method::Get,
            format!("{}/listByApp?appId={}", DATASOURCE_BASE, query_value(app_id)),
        );
        self.fetch_infos(call).await
    }

    /// Datasources owned by an organization
    pub async fn list_by_org(&self, org_id: &str) -> DatasourceResult<Vec<DatasourceInfo>> {
        let org_id = non_empty("orgId", org_id)?;
        let call = self.call(
            "listByOrg",
            Method::Get,
            format!("{}/listByOrg?orgId={}", DATASOURCE_BASE, query_value(org_id)),
        );
        self.fetch_infos(call).await
    }

    /// Plugin-backed datasources of an app
    ///
    /// The server allows this without a session when the app is public.
    pub async fn list_js_plugins_by_app(
        &self,
        app_id: &str,
    ) -> DatasourceResult<Vec<PluginDatasource>> {
        let app_id = non_empty("appId", app_id)?;
        let call = self.call(
            "listJsPluginsByApp",
            Method::Get,
            format!(
                "{}/jsDatasourcePlugins?appId={}",
                DATASOURCE_BASE,
                query_value(app_id)
            ),
        );
        let data = self.execute(call).await?;
        decode("listJsPluginsByApp", data)
    }

    /// Create a datasource; the server assigns its id
    pub async fn create(&self, draft: &DatasourceDraft) -> DatasourceResult<Datasource> {
        draft.validate()?;
        let call = self
            .call("create", Method::Post, DATASOURCE_BASE.to_string())
            .with_body(draft)?;
        let data = self.execute(call).await?;
        let ds = decode_datasource("create", data)?;
        tracing::info!("Created datasource {} ({})", ds.id, ds.datasource_type);
        Ok(ds)
    }

    /// Probe whether a datasource configuration can connect
    ///
    /// Runs under the test deadline. Unreachable targets come back as a failed
    /// [`TestReport`]; only invalid input and missing resources are errors.
    pub async fn test(&self, draft: &DatasourceDraft) -> DatasourceResult<TestReport> {
        draft.validate()?;
        let mut call = self
            .call("test", Method::Post, format!("{}/test", DATASOURCE_BASE))
            .with_body(draft)?;
        call.timeout = self.timeouts.test;

        let outcome = match self.send(&call).await {
            Ok(resp) => unwrap_envelope(&call, resp).map(|_| ()),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(()) => Ok(TestReport::Success),
            Err(DatasourceError::Timeout { after, .. }) => {
                tracing::warn!("Datasource test timed out after {:?}", after);
                Ok(TestReport::Failed {
                    kind: TestFailureKind::Timeout { after },
                    message: format!("no response within {}ms", after.as_millis()),
                })
            }
            Err(DatasourceError::Connection(message) | DatasourceError::Upstream(message)) => {
                tracing::warn!("Datasource test failed: {}", message);
                Ok(TestReport::Failed {
                    kind: TestFailureKind::Connection,
                    message,
                })
            }
            Err(other) => Err(other),
        }
    }

    /// Replace the configuration of an existing datasource
    pub async fn update(&self, id: &str, draft: &DatasourceDraft) -> DatasourceResult<Datasource> {
        let id = non_empty("id", id)?;
        if let Some(draft_id) = draft.id.as_deref() {
            if draft_id != id {
                return Err(ValidationError::single(
                    "id",
                    format!("draft id '{}' does not match '{}'", draft_id, id),
                )
                .into());
            }
        }
        draft.validate()?;
        let call = self
            .call(
                "update",
                Method::Put,
                format!("{}/{}", DATASOURCE_BASE, path_segment(id)),
            )
            .with_body(draft)?;
        let data = self.execute(call).await?;
        decode_datasource("update", data)
    }

    /// Delete a datasource, returning what was deleted
    pub async fn delete(&self, id: &str) -> DatasourceResult<DeletedDatasource> {
        let id = non_empty("id", id)?;
        let call = self.call(
            "delete",
            Method::Delete,
            format!("{}/{}", DATASOURCE_BASE, path_segment(id)),
        );
        let data = self.execute(call).await?;
        let raw: RawDatasource = decode("delete", data)?;
        let deleted = DeletedDatasource::from_raw(raw);
        tracing::info!("Deleted datasource {}", deleted.id());
        Ok(deleted)
    }

    /// Introspect the schema behind a datasource
    ///
    /// `ignore_cache` makes the server probe the live system instead of
    /// answering from its structure cache.
    pub async fn fetch_structure(
        &self,
        id: &str,
        ignore_cache: bool,
    ) -> DatasourceResult<DatasourceStructure> {
        let id = non_empty("id", id)?;
        let call = self.call(
            "fetchStructure",
            Method::Get,
            format!(
                "{}/{}/structure?ignoreCache={}",
                DATASOURCE_BASE,
                path_segment(id),
                ignore_cache
            ),
        );
        let data = self.execute(call).await?;
        decode("fetchStructure", data)
    }

    /// Connector types available to an organization
    pub async fn fetch_types(&self, org_id: &str) -> DatasourceResult<Vec<DatasourceTypeInfo>> {
        let org_id = non_empty("orgId", org_id)?;
        let call = self.call(
            "fetchTypes",
            Method::Get,
            format!("/v1/organizations/{}/datasourceTypes", path_segment(org_id)),
        );
        let data = self.execute(call).await?;
        decode("fetchTypes", data)
    }

    /// Ask a connector plugin for configuration options
    ///
    /// The element type is plugin-defined; use `serde_json::Value` when the
    /// shape is not known ahead of time.
    pub async fn fetch_dynamic_plugin_config<T: DeserializeOwned>(
        &self,
        request: &DynamicConfigRequest,
    ) -> DatasourceResult<Vec<T>> {
        non_empty("pluginName", &request.plugin_name)?;
        let call = self
            .call(
                "fetchDynamicPluginConfig",
                Method::Post,
                format!("{}/getPluginDynamicConfig", DATASOURCE_BASE),
            )
            .with_body(&[request])?;

        // An unknown plugin or path is reported by the plugin host, not as a
        // missing collection resource.
        let data = self.execute(call).await.map_err(|e| match e {
            DatasourceError::NotFound(message) => DatasourceError::Upstream(message),
            other => other,
        })?;
        decode("fetchDynamicPluginConfig", data)
    }

    fn call(&self, operation: &'static str, method: Method, path: String) -> Call {
        Call {
            operation,
            method,
            path,
            body: None,
            timeout: self.timeouts.request,
        }
    }

    /// Entries whose stored configuration fails the connector rules are
    /// skipped, so one legacy row does not hide the rest of the list
    async fn fetch_infos(&self, call: Call) -> DatasourceResult<Vec<DatasourceInfo>> {
        let operation = call.operation;
        let data = self.execute(call).await?;
        let raw: Vec<RawDatasourceInfo> = decode(operation, data)?;
        let infos = raw
            .into_iter()
            .filter_map(|info| {
                let id = info.datasource.id.clone();
                DatasourceInfo::try_from(info)
                    .inspect_err(|e| {
                        tracing::warn!("{}: skipping datasource {}: {}", operation, id, e)
                    })
                    .ok()
            })
            .collect();
        Ok(infos)
    }

    /// Send and unwrap the envelope, for every operation except `test`
    async fn execute(&self, call: Call) -> DatasourceResult<Value> {
        let resp = self.send(&call).await.map_err(|e| match e {
            DatasourceError::Connection(message) => DatasourceError::Upstream(message),
            other => other,
        })?;
        unwrap_envelope(&call, resp)
    }

    async fn send(&self, call: &Call) -> DatasourceResult<ApiResponse> {
        tracing::debug!("{} {} ({})", call.method, call.path, call.operation);

        let request = ApiRequest {
            method: call.method,
            path: call.path.clone(),
            body: call.body.clone(),
            timeout: call.timeout,
        };

        let timed_out = || DatasourceError::Timeout {
            operation: call.operation,
            after: call.timeout,
        };

        match tokio::time::timeout(call.timeout, self.transport.send(request)).await {
            Err(_) => Err(timed_out()),
            Ok(Err(TransportError::Timeout(_))) => Err(timed_out()),
            Ok(Err(TransportError::Connect(message))) => Err(DatasourceError::Connection(message)),
            Ok(Err(TransportError::Other(message))) => Err(DatasourceError::Upstream(message)),
            Ok(Ok(resp)) => Ok(resp),
        }
    }
}

impl Call {
    fn with_body<B: Serialize + ?Sized>(mut self, body: &B) -> DatasourceResult<Self> {
        let value = serde_json::to_value(body).map_err(|e| {
            DatasourceError::Validation(ValidationError::remote(format!(
                "request body for {} is not serializable: {}",
                self.operation, e
            )))
        })?;
        self.body = Some(value);
        Ok(self)
    }
}

/// Map a response onto its payload or the error taxonomy
fn unwrap_envelope(call: &Call, resp: ApiResponse) -> DatasourceResult<Value> {
    let envelope = serde_json::from_value::<Envelope>(resp.body.clone()).ok();
    let message = envelope
        .as_ref()
        .and_then(|e| e.message.clone())
        .filter(|m| !m.is_empty())
        .or_else(|| resp.body.as_str().map(str::to_string))
        .unwrap_or_else(|| format!("{} returned HTTP {}", call.operation, resp.status));

    if !resp.is_success() {
        tracing::warn!("{} failed with HTTP {}: {}", call.operation, resp.status, message);
        return Err(match resp.status {
            400 | 422 => DatasourceError::Validation(ValidationError::remote(message)),
            404 => DatasourceError::NotFound(message),
            409 => DatasourceError::Conflict(message),
            408 | 504 => DatasourceError::Timeout {
                operation: call.operation,
                after: call.timeout,
            },
            status => DatasourceError::Upstream(format!("HTTP {}: {}", status, message)),
        });
    }

    let Some(envelope) = envelope else {
        return Err(DatasourceError::Upstream(format!(
            "{} returned a response without an envelope",
            call.operation
        )));
    };

    if envelope.success == Some(false) {
        tracing::warn!("{} reported failure: {}", call.operation, message);
        return Err(DatasourceError::Upstream(message));
    }

    Ok(envelope.data)
}

fn decode<T: DeserializeOwned>(operation: &str, data: Value) -> DatasourceResult<T> {
    serde_json::from_value(data).map_err(|e| {
        DatasourceError::Upstream(format!("invalid response payload for {}: {}", operation, e))
    })
}

/// Decode a datasource and re-check its configuration against its tag
fn decode_datasource(operation: &str, data: Value) -> DatasourceResult<Datasource> {
    let raw: RawDatasource = decode(operation, data)?;
    Ok(Datasource::try_from(raw)?)
}

fn non_empty<'a>(name: &str, value: &'a str) -> DatasourceResult<&'a str> {
    if value.trim().is_empty() {
        Err(DatasourceError::NotFound(format!("{} must not be empty", name)))
    } else {
        Ok(value)
    }
}

fn query_value(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

fn path_segment(value: &str) -> String {
    query_value(value).replace('+', "%20")
}

//! Datasource entity and its read projections

use super::connector::ConnectorConfig;
use super::datasource_type::DatasourceType;
use crate::error::ValidationError;
use crate::validate::validate_config;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A persisted datasource
///
/// `id` and `datasource_type` never change after creation; the configuration is
/// replaced as a whole on update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDatasource", into = "RawDatasource")]
pub struct Datasource {
    pub id: String,
    pub name: String,
    pub datasource_type: DatasourceType,
    pub organization_id: String,
    pub config: ConnectorConfig,
}

impl Datasource {
    /// Draft carrying this datasource's identity, for a whole-config update
    pub fn to_draft(&self) -> DatasourceDraft {
        DatasourceDraft {
            id: Some(self.id.clone()),
            name: self.name.clone(),
            datasource_type: self.datasource_type.clone(),
            organization_id: Some(self.organization_id.clone()),
            config: self.config.clone(),
        }
    }
}

/// Datasource as exchanged with the server, configuration not yet dispatched
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawDatasource {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub datasource_type: DatasourceType,
    #[serde(default)]
    pub organization_id: String,
    pub datasource_config: Value,
}

impl TryFrom<RawDatasource> for Datasource {
    type Error = ValidationError;

    fn try_from(raw: RawDatasource) -> Result<Self, Self::Error> {
        let config = validate_config(&raw.datasource_type, &raw.datasource_config)?;
        Ok(Self {
            id: raw.id,
            name: raw.name,
            datasource_type: raw.datasource_type,
            organization_id: raw.organization_id,
            config,
        })
    }
}

impl From<Datasource> for RawDatasource {
    fn from(ds: Datasource) -> Self {
        Self {
            datasource_config: ds.config.to_value(),
            id: ds.id,
            name: ds.name,
            datasource_type: ds.datasource_type,
            organization_id: ds.organization_id,
        }
    }
}

/// Partial datasource submitted to create, update and test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawDraft")]
pub struct DatasourceDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub datasource_type: DatasourceType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    #[serde(rename = "datasourceConfig")]
    pub config: ConnectorConfig,
}

impl DatasourceDraft {
    pub fn new(
        name: impl Into<String>,
        datasource_type: DatasourceType,
        config: impl Into<ConnectorConfig>,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            datasource_type,
            organization_id: None,
            config: config.into(),
        }
    }

    /// Build a draft from an untyped configuration payload, validating it
    /// against the rules of `datasource_type`
    pub fn from_raw(
        name: impl Into<String>,
        datasource_type: DatasourceType,
        config: &Value,
    ) -> Result<Self, ValidationError> {
        let config = validate_config(&datasource_type, config)?;
        Ok(Self::new(name, datasource_type, config))
    }

    /// Parse a draft document: `{name, type, organizationId?, datasourceConfig}`
    ///
    /// Structural problems with the envelope and configuration violations are
    /// both reported as [`ValidationError`].
    pub fn from_document(doc: &Value) -> Result<Self, ValidationError> {
        let raw: RawDraft = serde_json::from_value(doc.clone())
            .map_err(|e| ValidationError::single("", e.to_string()))?;
        Self::try_from(raw)
    }

    pub fn in_organization(mut self, organization_id: impl Into<String>) -> Self {
        self.organization_id = Some(organization_id.into());
        self
    }

    /// Check the configuration variant against the tag and the field rules
    pub fn validate(&self) -> Result<(), ValidationError> {
        let expected = self.datasource_type.config_kind();
        let actual = self.config.kind();
        if expected != actual {
            return Err(ValidationError::single(
                "type",
                format!(
                    "'{}' datasources take {}, got {}",
                    self.datasource_type, expected, actual
                ),
            ));
        }
        validate_config(&self.datasource_type, &self.config.to_value()).map(|_| ())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDraft {
    #[serde(default)]
    id: Option<String>,
    name: String,
    #[serde(rename = "type")]
    datasource_type: DatasourceType,
    #[serde(default)]
    organization_id: Option<String>,
    datasource_config: Value,
}

impl TryFrom<RawDraft> for DatasourceDraft {
    type Error = ValidationError;

    fn try_from(raw: RawDraft) -> Result<Self, Self::Error> {
        let mut draft =
            DatasourceDraft::from_raw(raw.name, raw.datasource_type, &raw.datasource_config)?;
        draft.id = raw.id;
        draft.organization_id = raw.organization_id;
        Ok(draft)
    }
}

/// Datasource as seen by a particular caller
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasourceInfo {
    pub datasource: Datasource,
    /// Whether the caller may modify it
    pub edit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawDatasourceInfo {
    pub datasource: RawDatasource,
    #[serde(default)]
    pub edit: bool,
    #[serde(default)]
    pub creator_name: Option<String>,
}

impl TryFrom<RawDatasourceInfo> for DatasourceInfo {
    type Error = ValidationError;

    fn try_from(raw: RawDatasourceInfo) -> Result<Self, Self::Error> {
        Ok(Self {
            datasource: Datasource::try_from(raw.datasource)?,
            edit: raw.edit,
            creator_name: raw.creator_name,
        })
    }
}

/// What the server reports after a delete
///
/// The delete has already happened by the time the payload is decoded, so a
/// stored configuration that no longer passes the connector rules is kept as
/// received instead of failing the call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DeletedDatasource {
    Checked(Datasource),
    Unchecked(Value),
}

impl DeletedDatasource {
    pub(crate) fn from_raw(raw: RawDatasource) -> Self {
        let payload = serde_json::to_value(&raw).unwrap_or(Value::Null);
        match Datasource::try_from(raw) {
            Ok(ds) => DeletedDatasource::Checked(ds),
            Err(e) => {
                tracing::warn!(
                    "Deleted datasource {} has a configuration that fails validation: {}",
                    payload["id"].as_str().unwrap_or_default(),
                    e
                );
                DeletedDatasource::Unchecked(payload)
            }
        }
    }

    pub fn id(&self) -> &str {
        match self {
            DeletedDatasource::Checked(ds) => &ds.id,
            DeletedDatasource::Unchecked(payload) => payload["id"].as_str().unwrap_or_default(),
        }
    }

    pub fn datasource(&self) -> Option<&Datasource> {
        match self {
            DeletedDatasource::Checked(ds) => Some(ds),
            DeletedDatasource::Unchecked(_) => None,
        }
    }
}

/// Connector metadata supplied by a plugin
///
/// Kept opaque: plugins ship independently and may add fields at any time.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataSourcePluginMeta(pub Value);

impl DataSourcePluginMeta {
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn name(&self) -> Option<&str> {
        self.field("name").and_then(Value::as_str)
    }
}

/// Plugin-backed datasource listed for an app, without its configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginDatasource {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub datasource_type: DatasourceType,
    #[serde(default)]
    pub organization_id: String,
    pub plugin_definition: DataSourcePluginMeta,
}

/// Connector type an organization may use
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasourceTypeInfo {
    pub id: DatasourceType,
    pub name: String,
    pub version: String,
    pub has_structure_info: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<DataSourcePluginMeta>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConfigKind, EsConfig, MongoConfig};
    use serde_json::json;

    #[test]
    fn test_datasource_dispatches_config_by_type() {
        let ds: Datasource = serde_json::from_value(json!({
            "id": "ds-1",
            "name": "search",
            "type": "es",
            "organizationId": "org-1",
            "datasourceConfig": {
                "connectionString": "http://es:9200",
                "username": "elastic",
                "password": "pw",
                "skipTls": true
            }
        }))
        .unwrap();
        assert!(matches!(ds.config, ConnectorConfig::Es(ref es) if es.skip_tls));

        let wire = serde_json::to_value(&ds).unwrap();
        assert_eq!(wire["type"], "es");
        assert_eq!(wire["datasourceConfig"]["connectionString"], "http://es:9200");
    }

    #[test]
    fn test_draft_rejects_variant_not_matching_tag() {
        let draft = DatasourceDraft::new(
            "wrong",
            DatasourceType::Es,
            MongoConfig::with_uri("mongodb://h/db"),
        );
        let err = draft.validate().unwrap_err();
        assert!(err.mentions("type"));
    }

    #[test]
    fn test_draft_validate_catches_empty_active_field() {
        let draft = DatasourceDraft::new("mongo", DatasourceType::Mongodb, MongoConfig::with_uri(""));
        let err = draft.validate().unwrap_err();
        assert!(err.mentions("uri"));
    }

    #[test]
    fn test_draft_serialization_omits_missing_identity() {
        let draft = DatasourceDraft::new(
            "es",
            DatasourceType::Es,
            EsConfig {
                connection_string: "http://es:9200".to_string(),
                username: String::new(),
                password: String::new(),
                skip_tls: false,
            },
        );
        let wire = serde_json::to_value(&draft).unwrap();
        assert!(wire.get("id").is_none());
        assert!(wire.get("organizationId").is_none());
        assert_eq!(wire["type"], "es");
    }

    #[test]
    fn test_from_document_reports_envelope_and_config_problems() {
        let err = DatasourceDraft::from_document(&json!({"name": "orders", "type": "mysql"}))
            .unwrap_err();
        assert!(err.to_string().contains("datasourceConfig"));

        let err = DatasourceDraft::from_document(&json!({
            "name": "orders",
            "type": "mysql",
            "datasourceConfig": {"host": "db"}
        }))
        .unwrap_err();
        assert!(err.mentions("port"));

        let draft = DatasourceDraft::from_document(&json!({
            "name": "sheet",
            "type": "googleSheets",
            "organizationId": "org-1",
            "datasourceConfig": {"serviceAccount": "{}"}
        }))
        .unwrap();
        assert_eq!(draft.organization_id.as_deref(), Some("org-1"));
        assert_eq!(draft.config.kind(), ConfigKind::GoogleSheets);
    }

    #[test]
    fn test_plugin_meta_is_opaque() {
        let info: DatasourceTypeInfo = serde_json::from_value(json!({
            "id": "lark",
            "name": "Lark",
            "version": "1.0.0",
            "hasStructureInfo": false,
            "definition": {"name": "lark", "icon": "lark.svg", "somethingNew": [1, 2]}
        }))
        .unwrap();
        let definition = info.definition.unwrap();
        assert_eq!(definition.name(), Some("lark"));
        assert_eq!(definition.field("somethingNew"), Some(&json!([1, 2])));
    }
}

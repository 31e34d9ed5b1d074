//! Connector configuration variants
//!
//! Mongo and Oracle configurations travel on the wire as a superset of the SQL
//! shape plus a flag (`usingUri` / `usingSid`) that decides which fields are
//! active. Here the flag becomes a sum type: each variant holds the active
//! fields, and the fields the flag turns off are kept only so the full payload
//! can be sent back unchanged.

use super::datasource_type::ConfigKind;
use super::http::HttpConfig;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Host/port/credential block shared by relational connectors
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerParams {
    pub host: String,
    pub port: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

/// Relational database configuration (mysql, postgres, mssql, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SqlConfig {
    #[serde(flatten)]
    pub server: ServerParams,
    pub using_ssl: bool,
    pub enable_turn_off_prepared_statement: bool,
}

/// MongoDB configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "MongoWire", into = "MongoWire")]
pub struct MongoConfig {
    pub connection: MongoConnection,
    pub using_ssl: bool,
    pub enable_turn_off_prepared_statement: bool,
}

/// How a Mongo datasource reaches its server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MongoConnection {
    /// `usingUri = true`: the URI is authoritative
    Uri {
        uri: String,
        /// Ignored by the executor, echoed back on write
        inert: ServerParams,
    },
    /// `usingUri = false`: discrete host/port/credentials
    Params {
        params: ServerParams,
        /// Ignored by the executor, echoed back on write
        inert_uri: String,
    },
}

impl MongoConfig {
    pub fn with_uri(uri: impl Into<String>) -> Self {
        Self {
            connection: MongoConnection::Uri {
                uri: uri.into(),
                inert: ServerParams::default(),
            },
            using_ssl: false,
            enable_turn_off_prepared_statement: false,
        }
    }

    pub fn with_params(params: ServerParams) -> Self {
        Self {
            connection: MongoConnection::Params {
                params,
                inert_uri: String::new(),
            },
            using_ssl: false,
            enable_turn_off_prepared_statement: false,
        }
    }

    pub fn using_uri(&self) -> bool {
        matches!(self.connection, MongoConnection::Uri { .. })
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct MongoWire {
    host: String,
    port: String,
    database: String,
    username: String,
    password: String,
    using_ssl: bool,
    enable_turn_off_prepared_statement: bool,
    uri: String,
    using_uri: bool,
}

impl From<MongoWire> for MongoConfig {
    fn from(wire: MongoWire) -> Self {
        let params = ServerParams {
            host: wire.host,
            port: wire.port,
            database: wire.database,
            username: wire.username,
            password: wire.password,
        };
        let connection = if wire.using_uri {
            MongoConnection::Uri {
                uri: wire.uri,
                inert: params,
            }
        } else {
            MongoConnection::Params {
                params,
                inert_uri: wire.uri,
            }
        };
        Self {
            connection,
            using_ssl: wire.using_ssl,
            enable_turn_off_prepared_statement: wire.enable_turn_off_prepared_statement,
        }
    }
}

impl From<MongoConfig> for MongoWire {
    fn from(config: MongoConfig) -> Self {
        let (params, uri, using_uri) = match config.connection {
            MongoConnection::Uri { uri, inert } => (inert, uri, true),
            MongoConnection::Params { params, inert_uri } => (params, inert_uri, false),
        };
        Self {
            host: params.host,
            port: params.port,
            database: params.database,
            username: params.username,
            password: params.password,
            using_ssl: config.using_ssl,
            enable_turn_off_prepared_statement: config.enable_turn_off_prepared_statement,
            uri,
            using_uri,
        }
    }
}

/// Oracle configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "OracleWire", into = "OracleWire")]
pub struct OracleConfig {
    pub server: ServerParams,
    pub target: OracleTarget,
    pub using_ssl: bool,
    pub enable_turn_off_prepared_statement: bool,
}

/// Which Oracle identifier addresses the database
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleTarget {
    /// `usingSid = true`
    Sid { sid: String, inert_service_name: String },
    /// `usingSid = false`
    ServiceName { service_name: String, inert_sid: String },
}

impl OracleTarget {
    pub fn sid(sid: impl Into<String>) -> Self {
        OracleTarget::Sid {
            sid: sid.into(),
            inert_service_name: String::new(),
        }
    }

    pub fn service_name(service_name: impl Into<String>) -> Self {
        OracleTarget::ServiceName {
            service_name: service_name.into(),
            inert_sid: String::new(),
        }
    }

    /// The identifier the executor will actually use
    pub fn active(&self) -> &str {
        match self {
            OracleTarget::Sid { sid, .. } => sid,
            OracleTarget::ServiceName { service_name, .. } => service_name,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct OracleWire {
    host: String,
    port: String,
    database: String,
    username: String,
    password: String,
    using_ssl: bool,
    enable_turn_off_prepared_statement: bool,
    service_name: String,
    sid: String,
    using_sid: bool,
}

impl From<OracleWire> for OracleConfig {
    fn from(wire: OracleWire) -> Self {
        let target = if wire.using_sid {
            OracleTarget::Sid {
                sid: wire.sid,
                inert_service_name: wire.service_name,
            }
        } else {
            OracleTarget::ServiceName {
                service_name: wire.service_name,
                inert_sid: wire.sid,
            }
        };
        Self {
            server: ServerParams {
                host: wire.host,
                port: wire.port,
                database: wire.database,
                username: wire.username,
                password: wire.password,
            },
            target,
            using_ssl: wire.using_ssl,
            enable_turn_off_prepared_statement: wire.enable_turn_off_prepared_statement,
        }
    }
}

impl From<OracleConfig> for OracleWire {
    fn from(config: OracleConfig) -> Self {
        let (service_name, sid, using_sid) = match config.target {
            OracleTarget::Sid {
                sid,
                inert_service_name,
            } => (inert_service_name, sid, true),
            OracleTarget::ServiceName {
                service_name,
                inert_sid,
            } => (service_name, inert_sid, false),
        };
        Self {
            host: config.server.host,
            port: config.server.port,
            database: config.server.database,
            username: config.server.username,
            password: config.server.password,
            using_ssl: config.using_ssl,
            enable_turn_off_prepared_statement: config.enable_turn_off_prepared_statement,
            service_name,
            sid,
            using_sid,
        }
    }
}

/// Elasticsearch configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EsConfig {
    pub connection_string: String,
    pub username: String,
    pub password: String,
    pub skip_tls: bool,
}

/// Google Sheets configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleSheetsConfig {
    /// Service account key JSON
    pub service_account: String,
}

/// Configuration payload of a datasource
///
/// Serialized without a tag: the owning entity's `type` decides the variant,
/// see [`crate::validate::validate_config`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConnectorConfig {
    Sql(SqlConfig),
    Mongo(MongoConfig),
    Oracle(OracleConfig),
    Es(EsConfig),
    GoogleSheets(GoogleSheetsConfig),
    Http(HttpConfig),
    /// Plugin-defined shape, passed through untouched
    Plugin(Map<String, Value>),
}

impl ConnectorConfig {
    pub fn kind(&self) -> ConfigKind {
        match self {
            ConnectorConfig::Sql(_) => ConfigKind::Sql,
            ConnectorConfig::Mongo(_) => ConfigKind::Mongo,
            ConnectorConfig::Oracle(_) => ConfigKind::Oracle,
            ConnectorConfig::Es(_) => ConfigKind::Es,
            ConnectorConfig::GoogleSheets(_) => ConfigKind::GoogleSheets,
            ConnectorConfig::Http(_) => ConfigKind::Http,
            ConnectorConfig::Plugin(_) => ConfigKind::Plugin,
        }
    }

    /// Wire JSON of this configuration
    pub fn to_value(&self) -> Value {
        // Cannot fail: every variant is a struct or map with string keys
        serde_json::to_value(self).unwrap_or(Value::Object(Map::new()))
    }
}

impl From<SqlConfig> for ConnectorConfig {
    fn from(config: SqlConfig) -> Self {
        ConnectorConfig::Sql(config)
    }
}

impl From<MongoConfig> for ConnectorConfig {
    fn from(config: MongoConfig) -> Self {
        ConnectorConfig::Mongo(config)
    }
}

impl From<OracleConfig> for ConnectorConfig {
    fn from(config: OracleConfig) -> Self {
        ConnectorConfig::Oracle(config)
    }
}

impl From<EsConfig> for ConnectorConfig {
    fn from(config: EsConfig) -> Self {
        ConnectorConfig::Es(config)
    }
}

impl From<GoogleSheetsConfig> for ConnectorConfig {
    fn from(config: GoogleSheetsConfig) -> Self {
        ConnectorConfig::GoogleSheets(config)
    }
}

impl From<HttpConfig> for ConnectorConfig {
    fn from(config: HttpConfig) -> Self {
        ConnectorConfig::Http(config)
    }
}

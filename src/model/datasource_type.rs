//! Connector-type tags
//!
//! The tag lives on the datasource entity, not inside the configuration payload,
//! and selects which configuration variant applies.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Connector-type tag carried by every datasource
///
/// Tags not known to this crate are kept verbatim as [`DatasourceType::Plugin`];
/// those are connector kinds registered at runtime by plugins.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DatasourceType {
    Mysql,
    Postgres,
    Mssql,
    MariaDb,
    ClickHouse,
    Snowflake,
    Mongodb,
    Oracle,
    Es,
    GoogleSheets,
    RestApi,
    Graphql,
    Plugin(String),
}

/// Which configuration shape a tag selects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKind {
    Sql,
    Mongo,
    Oracle,
    Es,
    GoogleSheets,
    Http,
    Plugin,
}

impl ConfigKind {
    /// Name of the configuration shape, as used in messages
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigKind::Sql => "SQLConfig",
            ConfigKind::Mongo => "MongoConfig",
            ConfigKind::Oracle => "OracleConfig",
            ConfigKind::Es => "EsConfig",
            ConfigKind::GoogleSheets => "GoogleSheetsConfig",
            ConfigKind::Http => "HttpConfig",
            ConfigKind::Plugin => "PluginConfig",
        }
    }
}

impl fmt::Display for ConfigKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DatasourceType {
    /// Wire representation of the tag
    pub fn as_str(&self) -> &str {
        match self {
            DatasourceType::Mysql => "mysql",
            DatasourceType::Postgres => "postgres",
            DatasourceType::Mssql => "mssql",
            DatasourceType::MariaDb => "mariadb",
            DatasourceType::ClickHouse => "clickHouse",
            DatasourceType::Snowflake => "snowflake",
            DatasourceType::Mongodb => "mongodb",
            DatasourceType::Oracle => "oracle",
            DatasourceType::Es => "es",
            DatasourceType::GoogleSheets => "googleSheets",
            DatasourceType::RestApi => "restApi",
            DatasourceType::Graphql => "graphql",
            DatasourceType::Plugin(name) => name,
        }
    }

    /// Configuration shape selected by this tag
    pub fn config_kind(&self) -> ConfigKind {
        match self {
            DatasourceType::Mysql
            | DatasourceType::Postgres
            | DatasourceType::Mssql
            | DatasourceType::MariaDb
            | DatasourceType::ClickHouse
            | DatasourceType::Snowflake => ConfigKind::Sql,
            DatasourceType::Mongodb => ConfigKind::Mongo,
            DatasourceType::Oracle => ConfigKind::Oracle,
            DatasourceType::Es => ConfigKind::Es,
            DatasourceType::GoogleSheets => ConfigKind::GoogleSheets,
            DatasourceType::RestApi | DatasourceType::Graphql => ConfigKind::Http,
            DatasourceType::Plugin(_) => ConfigKind::Plugin,
        }
    }

    pub fn is_plugin(&self) -> bool {
        matches!(self, DatasourceType::Plugin(_))
    }
}

impl From<String> for DatasourceType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "mysql" => DatasourceType::Mysql,
            "postgres" => DatasourceType::Postgres,
            "mssql" => DatasourceType::Mssql,
            "mariadb" => DatasourceType::MariaDb,
            "clickHouse" => DatasourceType::ClickHouse,
            "snowflake" => DatasourceType::Snowflake,
            "mongodb" => DatasourceType::Mongodb,
            "oracle" => DatasourceType::Oracle,
            "es" => DatasourceType::Es,
            "googleSheets" => DatasourceType::GoogleSheets,
            "restApi" => DatasourceType::RestApi,
            "graphql" => DatasourceType::Graphql,
            _ => DatasourceType::Plugin(tag),
        }
    }
}

impl From<&str> for DatasourceType {
    fn from(tag: &str) -> Self {
        DatasourceType::from(tag.to_string())
    }
}

impl From<DatasourceType> for String {
    fn from(tag: DatasourceType) -> Self {
        match tag {
            DatasourceType::Plugin(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for DatasourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

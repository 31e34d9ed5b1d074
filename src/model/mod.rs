//! Datasource data model
//!
//! Connector configuration variants, the datasource entity that wraps them, and
//! the read-only projections returned by the server.

mod connector;
mod datasource;
mod datasource_type;
mod http;
mod structure;

pub use connector::{
    ConnectorConfig, EsConfig, GoogleSheetsConfig, MongoConfig, MongoConnection, OracleConfig,
    OracleTarget, ServerParams, SqlConfig,
};
pub(crate) use datasource::{RawDatasource, RawDatasourceInfo};
pub use datasource::{
    DataSourcePluginMeta, Datasource, DatasourceDraft, DatasourceInfo, DatasourceTypeInfo,
    DeletedDatasource, PluginDatasource,
};
pub use datasource_type::{ConfigKind, DatasourceType};
pub use http::{
    Credentials, CredentialsLocation, HttpAuth, HttpConfig, KeyValue, OAuthBasicConfig,
    OAuthConfig, OAuthGrantType, SslConfig, auth_type, ssl_verification,
};
pub use structure::{ColumnInfo, DatasourceStructure, TableKind, TableStructure};

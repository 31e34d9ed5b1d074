//! Introspected schema of a live datasource

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Schema of a datasource, as returned by structure introspection
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DatasourceStructure {
    #[serde(default)]
    pub tables: Vec<TableStructure>,
}

impl DatasourceStructure {
    pub fn table(&self, name: &str) -> Option<&TableStructure> {
        self.tables.iter().find(|t| t.name == name)
    }
}

/// Table, view, alias or collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableStructure {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TableKind,
    #[serde(default)]
    pub columns: Vec<ColumnInfo>,
    /// Key definitions; shape depends on the connector
    #[serde(default)]
    pub keys: Vec<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableKind {
    Table,
    View,
    Alias,
    Collection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub is_autogenerated: bool,
}

//! Datasource connection management
//!
//! Typed connector configurations with local validation, and an async client
//! for the platform's datasource API. The `dsctl` binary is a thin CLI on top.

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod transport;
pub mod validate;

// Re-export commonly used types for convenience
pub use client::{ClientTimeouts, DatasourceClient, DynamicConfigRequest, TestFailureKind, TestReport};
pub use error::{DatasourceError, DatasourceResult, FieldViolation, ValidationError};
pub use model::{ConnectorConfig, Datasource, DatasourceDraft, DatasourceType};
pub use transport::{HttpTransport, Transport};
pub use validate::validate_config;

//! Error taxonomy for datasource operations
//!
//! Every failure surfaced by the client maps onto one of these kinds, carrying
//! the provider-reported message when one is available.

use std::fmt;
use std::time::Duration;

/// A single field that failed connector configuration rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// Dotted path of the offending field (e.g. `authConfig.clientId`)
    pub field: String,
    /// What is wrong with it
    pub problem: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, problem: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            problem: problem.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.problem)
    }
}

/// Configuration rejected by the connector variant rules
///
/// Collects every violation rather than stopping at the first one, so callers
/// can report all missing fields of a form at once.
#[derive(Debug, Clone, PartialEq, Eq, Default, thiserror::Error)]
#[error("{}", join_violations(.violations))]
pub struct ValidationError {
    pub violations: Vec<FieldViolation>,
}

impl ValidationError {
    pub fn single(field: impl Into<String>, problem: impl Into<String>) -> Self {
        Self {
            violations: vec![FieldViolation::new(field, problem)],
        }
    }

    /// Server-side rejection without field detail
    pub fn remote(message: impl Into<String>) -> Self {
        Self::single("", message)
    }

    pub fn push(&mut self, field: impl Into<String>, problem: impl Into<String>) {
        self.violations.push(FieldViolation::new(field, problem));
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Whether any violation concerns `field`
    pub fn mentions(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }

    pub(crate) fn into_result(self) -> Result<(), ValidationError> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| {
            if v.field.is_empty() {
                v.problem.clone()
            } else {
                v.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Datasource operation errors
#[derive(Debug, thiserror::Error)]
pub enum DatasourceError {
    #[error("Invalid datasource configuration: {0}")]
    Validation(#[from] ValidationError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("{operation} timed out after {}ms", .after.as_millis())]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl DatasourceError {
    /// Stable name of the error kind, used in CLI output and logs
    pub fn kind(&self) -> &'static str {
        match self {
            DatasourceError::Validation(_) => "ValidationError",
            DatasourceError::NotFound(_) => "NotFound",
            DatasourceError::Conflict(_) => "Conflict",
            DatasourceError::Timeout { .. } => "TimeoutError",
            DatasourceError::Connection(_) => "ConnectionError",
            DatasourceError::Upstream(_) => "UpstreamError",
        }
    }
}

/// Result type for datasource operations
pub type DatasourceResult<T> = Result<T, DatasourceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display_joins_violations() {
        let mut err = ValidationError::default();
        err.push("uri", "must not be empty");
        err.push("authConfig.clientId", "is required");
        assert_eq!(
            err.to_string(),
            "uri: must not be empty; authConfig.clientId: is required"
        );
        assert!(err.mentions("uri"));
        assert!(!err.mentions("host"));
    }

    #[test]
    fn test_remote_validation_has_no_field_prefix() {
        let err = ValidationError::remote("name is too long");
        assert_eq!(err.to_string(), "name is too long");
    }

    #[test]
    fn test_error_kinds() {
        let timeout = DatasourceError::Timeout {
            operation: "test",
            after: Duration::from_secs(30),
        };
        assert_eq!(timeout.kind(), "TimeoutError");
        assert_eq!(timeout.to_string(), "test timed out after 30000ms");
        assert_eq!(
            DatasourceError::from(ValidationError::single("url", "is required")).kind(),
            "ValidationError"
        );
    }
}

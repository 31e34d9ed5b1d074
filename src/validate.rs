//! Connector configuration validation
//!
//! Validity is a pure function of the connector-type tag and the configuration
//! payload. The tag selects the top-level shape; inside HTTP configs
//! `authConfig.type` and `sslConfig.sslCertVerificationType` select the nested
//! field sets; inside Mongo and Oracle configs `usingUri` / `usingSid` decide
//! which fields are active. Fields that are present but not part of the active
//! shape are ignored, never checked.

use crate::error::ValidationError;
use crate::model::{
    ConfigKind, ConnectorConfig, DatasourceType, auth_type, ssl_verification,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

const SERVER_FIELDS: [&str; 5] = ["host", "port", "database", "username", "password"];
const SQL_FLAGS: [&str; 2] = ["usingSsl", "enableTurnOffPreparedStatement"];
const OAUTH_FIELDS: [&str; 5] = [
    "clientId",
    "clientSecret",
    "scopeString",
    "authorizationUrl",
    "accessTokenUrl",
];
const OAUTH_FLAGS: [&str; 3] = [
    "isAuthorizationHeader",
    "isTokenHeader",
    "sendScopeWithRefreshToken",
];
const MONGO_STRINGS: [&str; 6] = ["host", "port", "database", "username", "password", "uri"];
const ORACLE_STRINGS: [&str; 7] = [
    "host",
    "port",
    "database",
    "username",
    "password",
    "serviceName",
    "sid",
];
const GRANT_TYPES: [&str; 2] = ["CLIENT_CREDENTIALS", "AUTHORIZATION_CODE"];
const CREDENTIALS_LOCATIONS: [&str; 2] = ["BODY", "HEADER"];

/// Validate `config` against the shape selected by `tag` and convert it to the
/// typed variant
pub fn validate_config(
    tag: &DatasourceType,
    config: &Value,
) -> Result<ConnectorConfig, ValidationError> {
    validate_kind(tag.config_kind(), config)
}

/// Validate `config` against an explicit configuration shape
pub fn validate_kind(kind: ConfigKind, config: &Value) -> Result<ConnectorConfig, ValidationError> {
    let Some(obj) = config.as_object() else {
        return Err(ValidationError::single(
            "",
            format!("{} must be a JSON object", kind),
        ));
    };

    let mut errors = ValidationError::default();
    let fields = Fields::new(obj, "");

    match kind {
        ConfigKind::Sql => check_sql(&fields, &mut errors),
        ConfigKind::Mongo => check_mongo(&fields, &mut errors),
        ConfigKind::Oracle => check_oracle(&fields, &mut errors),
        ConfigKind::Es => {
            for field in ["connectionString", "username", "password"] {
                fields.require_str(field, &mut errors);
            }
            fields.require_bool("skipTls", &mut errors);
        }
        ConfigKind::GoogleSheets => {
            fields.require_str("serviceAccount", &mut errors);
        }
        ConfigKind::Http => check_http(&fields, &mut errors),
        ConfigKind::Plugin => {}
    }

    errors.into_result()?;

    tracing::trace!("Configuration accepted as {}", kind);

    Ok(match kind {
        ConfigKind::Sql => ConnectorConfig::Sql(decode(config)?),
        ConfigKind::Mongo => {
            ConnectorConfig::Mongo(decode(&drop_mistyped_strings(obj, &MONGO_STRINGS))?)
        }
        ConfigKind::Oracle => {
            ConnectorConfig::Oracle(decode(&drop_mistyped_strings(obj, &ORACLE_STRINGS))?)
        }
        ConfigKind::Es => ConnectorConfig::Es(decode(config)?),
        ConfigKind::GoogleSheets => ConnectorConfig::GoogleSheets(decode(config)?),
        ConfigKind::Http => ConnectorConfig::Http(decode(config)?),
        ConfigKind::Plugin => ConnectorConfig::Plugin(obj.clone()),
    })
}

/// Inert fields are never checked, so a mistyped one is dropped rather than
/// failing the typed decode
fn drop_mistyped_strings(obj: &Map<String, Value>, string_fields: &[&str]) -> Value {
    let mut cleaned = obj.clone();
    for field in string_fields {
        if cleaned.get(*field).is_some_and(|v| !v.is_string()) {
            cleaned.remove(*field);
        }
    }
    Value::Object(cleaned)
}

fn decode<T: DeserializeOwned>(config: &Value) -> Result<T, ValidationError> {
    serde_json::from_value(config.clone()).map_err(|e| ValidationError::single("", e.to_string()))
}

fn check_sql(fields: &Fields<'_>, errors: &mut ValidationError) {
    for field in SERVER_FIELDS {
        fields.require_str(field, errors);
    }
    for flag in SQL_FLAGS {
        fields.require_bool(flag, errors);
    }
}

fn check_mongo(fields: &Fields<'_>, errors: &mut ValidationError) {
    for flag in SQL_FLAGS {
        fields.require_bool(flag, errors);
    }
    match fields.require_bool("usingUri", errors) {
        Some(true) => {
            fields.require_non_empty("uri", errors);
        }
        Some(false) => {
            for field in SERVER_FIELDS {
                fields.require_str(field, errors);
            }
        }
        None => {}
    }
}

fn check_oracle(fields: &Fields<'_>, errors: &mut ValidationError) {
    check_sql(fields, errors);
    match fields.require_bool("usingSid", errors) {
        Some(true) => {
            fields.require_non_empty("sid", errors);
        }
        Some(false) => {
            fields.require_non_empty("serviceName", errors);
        }
        None => {}
    }
}

fn check_http(fields: &Fields<'_>, errors: &mut ValidationError) {
    fields.require_str("url", errors);
    for list in ["headers", "params", "bodyFormData"] {
        fields.optional_key_values(list, errors);
    }

    if let Some(auth) = fields.require_object("authConfig", errors) {
        check_auth(&auth, errors);
    }
    if let Some(ssl) = fields.require_object("sslConfig", errors) {
        check_ssl(&ssl, errors);
    }
}

fn check_auth(auth: &Fields<'_>, errors: &mut ValidationError) {
    let Some(kind) = auth.require_str("type", errors) else {
        return;
    };

    match kind {
        auth_type::NO_AUTH | auth_type::OAUTH2_INHERIT_FROM_LOGIN => {}
        auth_type::BASIC_AUTH | auth_type::DIGEST_AUTH => {
            auth.require_str("username", errors);
            auth.require_str("password", errors);
        }
        auth_type::OAUTH2 => {
            auth.require_one_of("grantType", &GRANT_TYPES, errors);
            for field in OAUTH_FIELDS {
                auth.require_str(field, errors);
            }
            for flag in OAUTH_FLAGS {
                auth.optional_bool(flag, errors);
            }
            auth.optional_one_of(
                "refreshTokenClientCredentialsLocation",
                &CREDENTIALS_LOCATIONS,
                errors,
            );
            auth.optional_key_values("customAuthenticationParameters", errors);
        }
        other => errors.push(
            auth.path("type"),
            format!("unsupported authentication type '{}'", other),
        ),
    }
}

fn check_ssl(ssl: &Fields<'_>, errors: &mut ValidationError) {
    let Some(kind) = ssl.require_str("sslCertVerificationType", errors) else {
        return;
    };

    match kind {
        ssl_verification::VERIFY_SELF_SIGNED_CERT => {
            ssl.require_str("selfSignedCert", errors);
        }
        ssl_verification::VERIFY_CA_CERT | ssl_verification::DISABLED => {}
        other => errors.push(
            ssl.path("sslCertVerificationType"),
            format!("unsupported verification type '{}'", other),
        ),
    }
}

/// Field lookups on one JSON object, reporting violations under a path prefix
struct Fields<'a> {
    obj: &'a Map<String, Value>,
    prefix: String,
}

impl<'a> Fields<'a> {
    fn new(obj: &'a Map<String, Value>, prefix: &str) -> Self {
        Self {
            obj,
            prefix: prefix.to_string(),
        }
    }

    fn path(&self, field: &str) -> String {
        if self.prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", self.prefix, field)
        }
    }

    fn present(&self, field: &str, errors: &mut ValidationError) -> Option<&'a Value> {
        match self.obj.get(field) {
            None | Some(Value::Null) => {
                errors.push(self.path(field), "is required");
                None
            }
            Some(value) => Some(value),
        }
    }

    fn require_str(&self, field: &str, errors: &mut ValidationError) -> Option<&'a str> {
        let value = self.present(field, errors)?;
        if value.is_string() {
            value.as_str()
        } else {
            errors.push(self.path(field), "must be a string");
            None
        }
    }

    fn require_non_empty(&self, field: &str, errors: &mut ValidationError) -> Option<&'a str> {
        let value = self.require_str(field, errors)?;
        if value.trim().is_empty() {
            errors.push(self.path(field), "must not be empty");
            None
        } else {
            Some(value)
        }
    }

    fn require_bool(&self, field: &str, errors: &mut ValidationError) -> Option<bool> {
        let value = self.present(field, errors)?;
        if value.is_boolean() {
            value.as_bool()
        } else {
            errors.push(self.path(field), "must be a boolean");
            None
        }
    }

    fn require_object(&self, field: &str, errors: &mut ValidationError) -> Option<Fields<'a>> {
        let value = self.present(field, errors)?;
        match value.as_object() {
            Some(obj) => Some(Fields::new(obj, &self.path(field))),
            None => {
                errors.push(self.path(field), "must be an object");
                None
            }
        }
    }

    fn require_one_of(&self, field: &str, allowed: &[&str], errors: &mut ValidationError) {
        if let Some(value) = self.require_str(field, errors) {
            self.check_allowed(field, value, allowed, errors);
        }
    }

    fn optional_bool(&self, field: &str, errors: &mut ValidationError) {
        if let Some(value) = self.obj.get(field).filter(|v| !v.is_null()) {
            if !value.is_boolean() {
                errors.push(self.path(field), "must be a boolean");
            }
        }
    }

    fn optional_one_of(&self, field: &str, allowed: &[&str], errors: &mut ValidationError) {
        match self.obj.get(field) {
            None | Some(Value::Null) => {}
            Some(Value::String(value)) => self.check_allowed(field, value, allowed, errors),
            Some(_) => errors.push(self.path(field), "must be a string"),
        }
    }

    fn check_allowed(&self, field: &str, value: &str, allowed: &[&str], errors: &mut ValidationError) {
        if !allowed.contains(&value) {
            errors.push(
                self.path(field),
                format!("must be one of {}, got '{}'", allowed.join(", "), value),
            );
        }
    }

    /// Ordered `{key, value}` list; absent means empty
    fn optional_key_values(&self, field: &str, errors: &mut ValidationError) {
        let items = match self.obj.get(field) {
            None | Some(Value::Null) => return,
            Some(Value::Array(items)) => items,
            Some(_) => {
                errors.push(self.path(field), "must be a list of key/value pairs");
                return;
            }
        };

        for (index, item) in items.iter().enumerate() {
            let entry_ok = item.as_object().is_some_and(|entry| {
                entry.get("key").is_some_and(Value::is_string)
                    && entry.get("value").is_some_and(Value::is_string)
            });
            if !entry_ok {
                errors.push(
                    format!("{}[{}]", self.path(field), index),
                    "must be an object with string 'key' and 'value'",
                );
            }
        }
    }
}

//! HTTP connector configuration: authentication and SSL sub-variants

use serde::{Deserialize, Deserializer, Serialize};

/// Ordered key/value pair (headers, query params, form fields)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Generic HTTP endpoint configuration (restApi, graphql)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpConfig {
    pub url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub headers: Vec<KeyValue>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub params: Vec<KeyValue>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub body_form_data: Vec<KeyValue>,
    pub auth_config: HttpAuth,
    pub ssl_config: SslConfig,
}

impl HttpConfig {
    /// Unauthenticated endpoint with CA verification
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            params: Vec::new(),
            body_form_data: Vec::new(),
            auth_config: HttpAuth::NoAuth,
            ssl_config: SslConfig::VerifyCaCert,
        }
    }
}

/// Authentication for an HTTP datasource, selected by `type`
///
/// Fields belonging to other variants may be present in the payload; they are
/// ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HttpAuth {
    #[serde(rename = "NO_AUTH")]
    NoAuth,
    #[serde(rename = "BASIC_AUTH")]
    Basic(Credentials),
    #[serde(rename = "DIGEST_AUTH")]
    Digest(Credentials),
    #[serde(rename = "OAUTH2")]
    OAuth2(OAuthConfig),
    /// Reuse the token obtained when the user logged in to the platform
    #[serde(rename = "OAUTH2_INHERIT_FROM_LOGIN")]
    OAuth2InheritFromLogin,
}

/// Wire names of the auth discriminant
pub mod auth_type {
    pub const NO_AUTH: &str = "NO_AUTH";
    pub const BASIC_AUTH: &str = "BASIC_AUTH";
    pub const DIGEST_AUTH: &str = "DIGEST_AUTH";
    pub const OAUTH2: &str = "OAUTH2";
    pub const OAUTH2_INHERIT_FROM_LOGIN: &str = "OAUTH2_INHERIT_FROM_LOGIN";
}

impl HttpAuth {
    pub fn auth_type(&self) -> &'static str {
        match self {
            HttpAuth::NoAuth => auth_type::NO_AUTH,
            HttpAuth::Basic(_) => auth_type::BASIC_AUTH,
            HttpAuth::Digest(_) => auth_type::DIGEST_AUTH,
            HttpAuth::OAuth2(_) => auth_type::OAUTH2,
            HttpAuth::OAuth2InheritFromLogin => auth_type::OAUTH2_INHERIT_FROM_LOGIN,
        }
    }
}

/// Username/password pair for basic and digest auth
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// OAuth grant flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OAuthGrantType {
    ClientCredentials,
    AuthorizationCode,
}

/// Client identity shared by every OAuth-like flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthBasicConfig {
    pub grant_type: OAuthGrantType,
    /// app_id, app_key or suite_key depending on provider
    pub client_id: String,
    /// app_secret or suite_secret depending on provider
    pub client_secret: String,
}

/// Where client credentials go when refreshing a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CredentialsLocation {
    #[default]
    Body,
    Header,
}

/// Full OAuth 2.0 configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthConfig {
    #[serde(flatten)]
    pub basic: OAuthBasicConfig,
    pub scope_string: String,
    pub authorization_url: String,
    pub access_token_url: String,

    /// Send client credentials in the Authorization header
    #[serde(default = "default_true", deserialize_with = "null_as_true")]
    pub is_authorization_header: bool,

    /// Insert the access token as a header rather than a query param
    #[serde(default = "default_true", deserialize_with = "null_as_true")]
    pub is_token_header: bool,

    #[serde(default, deserialize_with = "null_as_default")]
    pub refresh_token_client_credentials_location: CredentialsLocation,

    #[serde(default, deserialize_with = "null_as_default")]
    pub send_scope_with_refresh_token: bool,

    #[serde(default, deserialize_with = "null_as_default")]
    pub custom_authentication_parameters: Vec<KeyValue>,
}

impl OAuthConfig {
    /// Configuration with the platform's default header/refresh behaviour
    pub fn new(
        basic: OAuthBasicConfig,
        scope_string: impl Into<String>,
        authorization_url: impl Into<String>,
        access_token_url: impl Into<String>,
    ) -> Self {
        Self {
            basic,
            scope_string: scope_string.into(),
            authorization_url: authorization_url.into(),
            access_token_url: access_token_url.into(),
            is_authorization_header: true,
            is_token_header: true,
            refresh_token_client_credentials_location: CredentialsLocation::Body,
            send_scope_with_refresh_token: false,
            custom_authentication_parameters: Vec::new(),
        }
    }
}

/// Server certificate verification policy
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "sslCertVerificationType")]
pub enum SslConfig {
    #[default]
    #[serde(rename = "VERIFY_CA_CERT")]
    VerifyCaCert,
    #[serde(rename = "VERIFY_SELF_SIGNED_CERT")]
    VerifySelfSignedCert {
        #[serde(rename = "selfSignedCert")]
        self_signed_cert: String,
    },
    #[serde(rename = "DISABLED")]
    Disabled,
}

/// Wire names of the SSL verification discriminant
pub mod ssl_verification {
    pub const VERIFY_CA_CERT: &str = "VERIFY_CA_CERT";
    pub const VERIFY_SELF_SIGNED_CERT: &str = "VERIFY_SELF_SIGNED_CERT";
    pub const DISABLED: &str = "DISABLED";
}

fn default_true() -> bool {
    true
}

// Optional fields read an explicit null the same as a missing key
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_true<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(true))
}

//! Configuration system for dsctl
//!
//! Layered settings for the CLI: built-in defaults, a root config file,
//! optional named profiles and `DSCTL_*` environment overrides.

mod defaults;
pub mod loader;
pub mod paths;
pub mod schema;

pub use loader::ConfigLoader;
pub use schema::{Config, OutputFormat};

/// Keys accepted by [`get_config_value`] and [`set_config_value`]
pub const CONFIG_KEYS: &[&str] = &[
    "server.baseUrl",
    "server.requestTimeoutMs",
    "server.testTimeoutMs",
    "defaults.orgId",
    "defaults.appId",
    "output.format",
];

/// Get a configuration value by key (dot notation)
pub fn get_config_value(config: &schema::Config, key: &str) -> anyhow::Result<String> {
    match key {
        "server.baseUrl" => Ok(config.server.base_url.clone()),
        "server.requestTimeoutMs" => Ok(config.server.request_timeout_ms.to_string()),
        "server.testTimeoutMs" => Ok(config.server.test_timeout_ms.to_string()),
        "defaults.orgId" => Ok(config.defaults.org_id.clone().unwrap_or_default()),
        "defaults.appId" => Ok(config.defaults.app_id.clone().unwrap_or_default()),
        "output.format" => Ok(config.output.format.to_string()),
        _ => Err(anyhow::anyhow!("Unknown configuration key: {}", key)),
    }
}

/// Set a configuration value by key (dot notation)
///
/// An empty value clears the optional `defaults.*` keys.
pub fn set_config_value(config: &mut schema::Config, key: &str, value: &str) -> anyhow::Result<()> {
    use anyhow::Context;
    match key {
        "server.baseUrl" => {
            url::Url::parse(value).context("server.baseUrl must be an absolute URL")?;
            config.server.base_url = value.to_string();
        }
        "server.requestTimeoutMs" => {
            config.server.request_timeout_ms = value
                .parse()
                .context("server.requestTimeoutMs must be a number")?;
        }
        "server.testTimeoutMs" => {
            config.server.test_timeout_ms = value
                .parse()
                .context("server.testTimeoutMs must be a number")?;
        }
        "defaults.orgId" => {
            config.defaults.org_id = non_empty(value);
        }
        "defaults.appId" => {
            config.defaults.app_id = non_empty(value);
        }
        "output.format" => {
            config.output.format = value.parse()?;
        }
        _ => return Err(anyhow::anyhow!("Unknown configuration key: {}", key)),
    }

    Ok(())
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

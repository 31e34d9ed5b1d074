//! Configuration loading and merging logic
//!
//! Handles loading configuration from multiple sources and merging them
//! according to precedence rules.

use super::{defaults, paths, schema::Config};
use crate::client::ClientTimeouts;
use anyhow::{Context, Result};
use serde_yaml::Value;
use std::path::Path;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with all layers merged
    ///
    /// Precedence order (highest to lowest):
    /// 1. Environment variable overrides
    /// 2. Profile-specific config
    /// 3. Root config
    /// 4. Built-in defaults
    pub fn load(profile: Option<&str>) -> Result<Config> {
        let mut merged =
            serde_yaml::to_value(Self::load_defaults()).context("Failed to encode defaults")?;

        let root_path = paths::root_config_path();
        if root_path.exists() {
            Self::merge_values(&mut merged, Self::load_value(&root_path)?);
        }

        if let Some(profile_name) = profile {
            let profile_path = paths::profile_config_path(profile_name);
            if profile_path.exists() {
                Self::merge_values(&mut merged, Self::load_value(&profile_path)?);
            } else {
                tracing::debug!("No config for profile '{}' at {}", profile_name, profile_path.display());
            }
        }

        let config: Config =
            serde_yaml::from_value(merged).context("Failed to parse merged configuration")?;

        Ok(Self::apply_env_overrides(config))
    }

    /// Load configuration from a single file, without layering
    pub fn load_file(path: &Path) -> Result<Config> {
        if !path.exists() {
            return Err(anyhow::anyhow!("Config file not found: {}", path.display()));
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    fn load_value(path: &Path) -> Result<Value> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let value: Value = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        // An empty file parses as null and contributes nothing
        Ok(value)
    }

    /// Validate configuration by loading and checking for errors
    ///
    /// This fails on:
    /// - Invalid YAML syntax or value types
    /// - A base URL that cannot be parsed
    /// - Timeouts where the test deadline is not longer than the request deadline
    pub fn validate(profile: Option<&str>) -> Result<Config> {
        let root_path = paths::root_config_path();
        if root_path.exists() {
            Self::load_file(&root_path)?;
        }

        let config = Self::load(profile).context("Failed to load merged configuration")?;

        url::Url::parse(&config.server.base_url)
            .with_context(|| format!("server.baseUrl is not a valid URL: {}", config.server.base_url))?;

        Self::client_timeouts(&config)?;

        Ok(config)
    }

    /// Client deadlines described by `config`
    pub fn client_timeouts(config: &Config) -> Result<ClientTimeouts> {
        ClientTimeouts::new(config.server.request_timeout(), config.server.test_timeout())
            .map_err(|e| anyhow::anyhow!("Invalid timeouts: {}", e))
    }

    /// Load default configuration
    pub fn load_defaults() -> Config {
        defaults::default_config()
    }

    /// Deep-merge `overlay` into `base`; mappings merge key by key, everything
    /// else is replaced
    fn merge_values(base: &mut Value, overlay: Value) {
        match (base, overlay) {
            (_, Value::Null) => {}
            (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
                for (key, value) in overlay_map {
                    match base_map.get_mut(&key) {
                        Some(existing) => Self::merge_values(existing, value),
                        None => {
                            base_map.insert(key, value);
                        }
                    }
                }
            }
            (slot, value) => *slot = value,
        }
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(mut config: Config) -> Config {
        if let Ok(base_url) = std::env::var("DSCTL_BASE_URL") {
            config.server.base_url = base_url;
        }

        if let Ok(org_id) = std::env::var("DSCTL_ORG_ID") {
            config.defaults.org_id = Some(org_id);
        }

        if let Ok(app_id) = std::env::var("DSCTL_APP_ID") {
            config.defaults.app_id = Some(app_id);
        }

        if let Ok(timeout) = std::env::var("DSCTL_REQUEST_TIMEOUT_MS") {
            match timeout.parse::<u64>() {
                Ok(val) => config.server.request_timeout_ms = val,
                Err(_) => tracing::warn!("Ignoring invalid DSCTL_REQUEST_TIMEOUT_MS: {}", timeout),
            }
        }

        if let Ok(timeout) = std::env::var("DSCTL_TEST_TIMEOUT_MS") {
            match timeout.parse::<u64>() {
                Ok(val) => config.server.test_timeout_ms = val,
                Err(_) => tracing::warn!("Ignoring invalid DSCTL_TEST_TIMEOUT_MS: {}", timeout),
            }
        }

        if let Ok(format) = std::env::var("DSCTL_OUTPUT") {
            match format.parse() {
                Ok(val) => config.output.format = val,
                Err(e) => tracing::warn!("Ignoring DSCTL_OUTPUT: {}", e),
            }
        }

        config
    }

    /// Set one dotted key in the file at `path`, leaving every other key as written
    ///
    /// Keys the file does not mention keep falling through to lower layers.
    pub fn set_value(path: &Path, key: &str, value: &str) -> Result<()> {
        let mut file_value = if path.exists() {
            Self::load_value(path)?
        } else {
            Value::Null
        };
        if file_value.is_null() {
            file_value = Value::Mapping(Default::default());
        }

        // Apply through the typed config so the value is checked and normalized
        let mut config: Config = serde_yaml::from_value(file_value.clone())
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        super::set_config_value(&mut config, key, value)?;
        let normalized = serde_yaml::to_value(&config).context("Failed to encode configuration")?;

        let (section, field) = key
            .split_once('.')
            .ok_or_else(|| anyhow::anyhow!("Unknown configuration key: {}", key))?;
        let new_value = normalized.get(section).and_then(|s| s.get(field)).cloned();

        let Value::Mapping(root) = &mut file_value else {
            return Err(anyhow::anyhow!(
                "Config file is not a mapping: {}",
                path.display()
            ));
        };
        let section_value = root
            .entry(Value::from(section))
            .or_insert_with(|| Value::Mapping(Default::default()));
        let Value::Mapping(section_map) = section_value else {
            return Err(anyhow::anyhow!("'{}' is not a mapping in {}", section, path.display()));
        };
        match new_value {
            Some(v) => {
                section_map.insert(Value::from(field), v);
            }
            None => {
                section_map.remove(field);
            }
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let yaml =
            serde_yaml::to_string(&file_value).context("Failed to serialize configuration to YAML")?;
        std::fs::write(path, yaml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }
}

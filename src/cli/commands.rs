//! CLI command handlers

use anyhow::{Context, Result};
use clap::Subcommand;

use crate::config::{self, ConfigLoader, paths};

/// Configuration management subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigSubcommand {
    /// Get configuration value
    Get {
        /// Configuration key (e.g., "server.baseUrl", "defaults.orgId")
        key: Option<String>,
    },
    /// Set configuration value
    Set {
        /// Configuration key (e.g., "server.baseUrl", "defaults.orgId")
        key: String,
        /// Configuration value; written to the --profile file when one is given
        value: String,
    },
    /// List all configuration
    List,
    /// Show configuration file path
    Path,
    /// Validate configuration
    Validate,
    /// List the keys accepted by get and set
    Keys,
}

/// Handle configuration subcommands
///
/// `profile` is the global `--profile` flag; it selects the layer that is read
/// and, for `set`, the file that is written.
pub async fn handle_config_command(cmd: ConfigSubcommand, profile: Option<&str>) -> Result<()> {
    match cmd {
        ConfigSubcommand::Get { key } => {
            let config = ConfigLoader::load(profile).context("Failed to load configuration")?;

            if let Some(key) = key {
                let value = config::get_config_value(&config, &key)?;
                println!("{}", value);
            } else {
                let yaml =
                    serde_yaml::to_string(&config).context("Failed to serialize configuration")?;
                print!("{}", yaml);
            }
        }
        ConfigSubcommand::Set { key, value } => {
            let path = match profile {
                Some(name) => paths::profile_config_path(name),
                None => paths::root_config_path(),
            };

            ConfigLoader::set_value(&path, &key, &value)
                .with_context(|| format!("Failed to set {} = {}", key, value))?;

            match profile {
                Some(name) => println!("Configuration saved for profile: {}", name),
                None => println!("Configuration saved"),
            }
        }
        ConfigSubcommand::List => {
            let config = ConfigLoader::load(profile).context("Failed to load configuration")?;

            let yaml =
                serde_yaml::to_string(&config).context("Failed to serialize configuration")?;
            print!("{}", yaml);
        }
        ConfigSubcommand::Path => {
            println!("{}", paths::root_config_path().display());
            if let Some(name) = profile {
                println!("{}", paths::profile_config_path(name).display());
            }
        }
        ConfigSubcommand::Validate => match ConfigLoader::validate(profile) {
            Ok(_) => {
                println!("Configuration is valid");
            }
            Err(e) => {
                eprintln!("Configuration validation failed: {:#}", e);
                std::process::exit(1);
            }
        },
        ConfigSubcommand::Keys => {
            for key in config::CONFIG_KEYS {
                println!("{}", key);
            }
        }
    }

    Ok(())
}

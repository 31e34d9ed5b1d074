//! Datasource subcommands

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use serde::Serialize;
use serde_json::Value;

use crate::client::{DatasourceClient, DynamicConfigRequest, TestFailureKind, TestReport};
use crate::config::{Config, ConfigLoader, OutputFormat};
use crate::model::DatasourceDraft;
use crate::transport::HttpTransport;

/// Datasource management subcommands
#[derive(Subcommand, Debug)]
pub enum DatasourceCommand {
    /// List datasources of an app or an organization
    List {
        /// App id (defaults to defaults.appId)
        #[arg(long, conflicts_with = "org")]
        app: Option<String>,
        /// Organization id (defaults to defaults.orgId)
        #[arg(long)]
        org: Option<String>,
    },
    /// List plugin-backed datasources of an app
    Plugins {
        /// App id (defaults to defaults.appId)
        #[arg(long)]
        app: Option<String>,
    },
    /// Create a datasource from a draft file
    Create {
        /// YAML or JSON draft: {name, type, organizationId?, datasourceConfig}
        #[arg(short = 'f', long = "file")]
        file: PathBuf,
    },
    /// Check that a draft can connect, without saving it
    Test {
        #[arg(short = 'f', long = "file")]
        file: PathBuf,
    },
    /// Replace the configuration of a datasource
    Update {
        id: String,
        #[arg(short = 'f', long = "file")]
        file: PathBuf,
    },
    /// Delete a datasource
    Delete { id: String },
    /// Show the tables and columns behind a datasource
    Structure {
        id: String,
        /// Probe the live system instead of the server's cache
        #[arg(long)]
        ignore_cache: bool,
    },
    /// List connector types available to an organization
    Types {
        /// Organization id (defaults to defaults.orgId)
        #[arg(long)]
        org: Option<String>,
    },
    /// Ask a connector plugin for configuration options
    DynamicConfig {
        /// Plugin name
        plugin: String,
        /// Plugin-defined option path
        path: String,
        /// YAML or JSON datasource configuration passed to the plugin
        #[arg(short = 'f', long = "file")]
        file: Option<PathBuf>,
        /// Existing datasource the options are for
        #[arg(long)]
        id: Option<String>,
    },
    /// Validate a draft file locally
    Validate {
        #[arg(short = 'f', long = "file")]
        file: PathBuf,
    },
}

/// Handle datasource subcommands
pub async fn handle_datasource_command(cmd: DatasourceCommand, config: &Config) -> Result<()> {
    let format = config.output.format;
    let connect = || build_client(config);

    match cmd {
        DatasourceCommand::List { app, org } => {
            let client = connect()?;
            let infos = match (app, org) {
                (Some(app), _) => client.list_by_app(&app).await,
                (None, Some(org)) => client.list_by_org(&org).await,
                (None, None) => match (&config.defaults.app_id, &config.defaults.org_id) {
                    (Some(app), _) => client.list_by_app(app).await,
                    (None, Some(org)) => client.list_by_org(org).await,
                    (None, None) => {
                        bail!("Pass --app or --org, or set defaults.appId / defaults.orgId")
                    }
                },
            }
            .context("Failed to list datasources")?;
            print_output(&infos, format)?;
        }
        DatasourceCommand::Plugins { app } => {
            let client = connect()?;
            let app = scope(app, &config.defaults.app_id, "--app", "defaults.appId")?;
            let plugins = client
                .list_js_plugins_by_app(&app)
                .await
                .context("Failed to list plugin datasources")?;
            print_output(&plugins, format)?;
        }
        DatasourceCommand::Create { file } => {
            let client = connect()?;
            let draft = with_default_org(load_draft(&file)?, config);
            let created = client
                .create(&draft)
                .await
                .context("Failed to create datasource")?;
            print_output(&created, format)?;
        }
        DatasourceCommand::Test { file } => {
            let client = connect()?;
            let draft = with_default_org(load_draft(&file)?, config);
            let report = client.test(&draft).await.context("Failed to test datasource")?;
            print_report(&report);
            if !report.is_success() {
                std::process::exit(1);
            }
        }
        DatasourceCommand::Update { id, file } => {
            let client = connect()?;
            let draft = load_draft(&file)?;
            let updated = client
                .update(&id, &draft)
                .await
                .with_context(|| format!("Failed to update datasource {}", id))?;
            print_output(&updated, format)?;
        }
        DatasourceCommand::Delete { id } => {
            let client = connect()?;
            let deleted = client
                .delete(&id)
                .await
                .with_context(|| format!("Failed to delete datasource {}", id))?;
            print_output(&deleted, format)?;
        }
        DatasourceCommand::Structure { id, ignore_cache } => {
            let client = connect()?;
            let structure = client
                .fetch_structure(&id, ignore_cache)
                .await
                .with_context(|| format!("Failed to fetch structure of {}", id))?;
            print_output(&structure, format)?;
        }
        DatasourceCommand::Types { org } => {
            let client = connect()?;
            let org = scope(org, &config.defaults.org_id, "--org", "defaults.orgId")?;
            let types = client
                .fetch_types(&org)
                .await
                .context("Failed to fetch datasource types")?;
            print_output(&types, format)?;
        }
        DatasourceCommand::DynamicConfig {
            plugin,
            path,
            file,
            id,
        } => {
            let client = connect()?;
            let data_source_config = match file {
                Some(file) => read_document(&file)?,
                None => Value::Object(Default::default()),
            };
            let request = DynamicConfigRequest {
                plugin_name: plugin,
                path,
                data_source_config,
                data_source_id: id,
            };
            let options: Vec<Value> = client
                .fetch_dynamic_plugin_config(&request)
                .await
                .context("Failed to fetch plugin configuration")?;
            print_output(&options, format)?;
        }
        // Local only; needs neither a server nor a valid server config
        DatasourceCommand::Validate { file } => validate_file(&file)?,
    }

    Ok(())
}

fn build_client(config: &Config) -> Result<DatasourceClient> {
    let timeouts = ConfigLoader::client_timeouts(config)?;
    let transport = HttpTransport::new(&config.server.base_url)
        .with_context(|| format!("Invalid server.baseUrl: {}", config.server.base_url))?;
    tracing::debug!(
        "Using {} (request {:?}, test {:?})",
        config.server.base_url,
        timeouts.request(),
        timeouts.test()
    );
    Ok(DatasourceClient::new(Arc::new(transport)).with_timeouts(timeouts))
}

fn scope(flag: Option<String>, default: &Option<String>, arg: &str, key: &str) -> Result<String> {
    flag.or_else(|| default.clone())
        .with_context(|| format!("Pass {} or set {}", arg, key))
}

fn with_default_org(mut draft: DatasourceDraft, config: &Config) -> DatasourceDraft {
    if draft.organization_id.is_none() {
        draft.organization_id = config.defaults.org_id.clone();
    }
    draft
}

/// Read a YAML or JSON file into a JSON value
fn read_document(path: &Path) -> Result<Value> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_yaml::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

fn load_draft(path: &Path) -> Result<DatasourceDraft> {
    let doc = read_document(path)?;
    DatasourceDraft::from_document(&doc)
        .with_context(|| format!("Invalid datasource draft in {}", path.display()))
}

fn validate_file(path: &Path) -> Result<()> {
    let doc = read_document(path)?;
    match DatasourceDraft::from_document(&doc) {
        Ok(draft) => {
            println!(
                "✓ {} ({}) is valid {}",
                draft.name,
                draft.datasource_type,
                draft.config.kind()
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ {} is invalid:", path.display());
            for violation in &e.violations {
                eprintln!("  - {}", violation);
            }
            std::process::exit(1);
        }
    }
}

fn print_report(report: &TestReport) {
    match report {
        TestReport::Success => println!("✓ Connection succeeded"),
        TestReport::Failed {
            kind: TestFailureKind::Timeout { after },
            message,
        } => println!("✗ Connection timed out after {}ms: {}", after.as_millis(), message),
        TestReport::Failed {
            kind: TestFailureKind::Connection,
            message,
        } => println!("✗ Connection failed: {}", message),
    }
}

fn print_output<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Yaml => {
            let yaml = serde_yaml::to_string(value).context("Failed to serialize output")?;
            print!("{}", yaml);
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
            println!("{}", json);
        }
    }
    Ok(())
}

//! dsctl - manage low-code platform datasource connections from the command line
//!
//! Creates, tests, updates and inspects datasources through the platform API,
//! and validates connector configurations locally before they are sent.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use dsctl::cli::{
    ConfigSubcommand, DatasourceCommand, display_version, handle_config_command,
    handle_datasource_command, init_logging,
};
use dsctl::config::{ConfigLoader, OutputFormat};

/// dsctl - manage low-code platform datasource connections
#[derive(Parser, Debug)]
#[command(name = "dsctl")]
#[command(about = "Manage low-code platform datasource connections", long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(long, short = 'd', global = true)]
    debug: bool,

    /// Configuration profile layered over the root config
    #[arg(long, short = 'p', global = true)]
    profile: Option<String>,

    /// Output format (yaml or json); overrides output.format
    #[arg(long, short = 'o', global = true)]
    output: Option<String>,

    #[command(subcommand)]
    command: Command,
}

/// Main commands
#[derive(Subcommand, Debug)]
enum Command {
    #[command(flatten)]
    Datasource(DatasourceCommand),

    /// Configuration management
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging if debug flag is set
    let log_file = init_logging(args.debug);

    // Print log file location to stderr so stdout stays clean
    if let Some(ref log_path) = log_file {
        eprintln!(
            "Debug logging enabled. Logs written to: {}",
            log_path.display()
        );
    }

    let profile = args.profile.as_deref();

    match args.command {
        Command::Version => {
            display_version();
            Ok(())
        }
        Command::Config { subcommand } => handle_config_command(subcommand, profile).await,
        Command::Datasource(cmd) => {
            let mut config = ConfigLoader::load(profile).context("Failed to load configuration")?;
            if let Some(format) = args.output {
                config.output.format = format.parse::<OutputFormat>()?;
            }

            tracing::debug!(
                "Configuration loaded: profile={:?}, baseUrl={}, output={}",
                profile,
                config.server.base_url,
                config.output.format
            );

            handle_datasource_command(cmd, &config).await
        }
    }
}

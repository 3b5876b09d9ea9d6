use crate::config::{load_config, GatewayConfig};
use crate::echo::EchoApplication;
use crate::gateway::Gateway;
use crate::runtime_config::RuntimeConfig;
use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

/// Command-line interface for frontgate
#[derive(Parser, Debug)]
#[command(name = "frontgate")]
#[command(version, about = "HTTP front for MVC front-controller applications", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve static files and forward actions to the echo application
    Serve(ServeArgs),
    /// Print the configured action table
    Routes {
        /// Path to the YAML configuration file
        #[arg(short, long, env = "FRONTGATE_CONFIG")]
        config: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Path to the YAML configuration file
    #[arg(short, long, env = "FRONTGATE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Interface to bind
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Document root for static files
    #[arg(long)]
    pub base_dir: Option<PathBuf>,
}

/// Load the config file (or defaults) and apply flag overrides.
///
/// # Errors
///
/// Fails when the config file cannot be read or parsed.
pub fn resolve_config(args: &ServeArgs) -> anyhow::Result<GatewayConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(host) = &args.host {
        config.host = host.clone();
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(base_dir) = &args.base_dir {
        config.base_dir = base_dir.clone();
    }
    Ok(config)
}

/// Execute the parsed command line
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the server fails to start.
pub fn run_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve(args) => {
            let config = resolve_config(&args)?;
            let runtime = RuntimeConfig::from_env();
            runtime.apply();
            info!(stack_size = runtime.stack_size, "Coroutine runtime configured");

            let gateway = Gateway::new(config, EchoApplication)?;
            let handle = gateway.start().context("server failed to start")?;
            handle
                .join()
                .map_err(|e| anyhow::anyhow!("server coroutine panicked: {e:?}"))?;
            Ok(())
        }
        Commands::Routes { config } => {
            let config = match config {
                Some(path) => load_config(&path)?,
                None => GatewayConfig::default(),
            };
            for line in config.actions.action_table().describe() {
                println!("{line}");
            }
            Ok(())
        }
    }
}

use clap::Parser;
use frontgate::cli::{run_cli, Cli};
use frontgate::logging::{init_logging_with_config, LogConfig};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging_with_config(&LogConfig::from_env())?;
    run_cli(cli)
}

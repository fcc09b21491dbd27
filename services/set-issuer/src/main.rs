//! set-issuer entry point.

use clap::Parser;
use rust_common::init_tracing;
use set_issuer::{Cli, Config, run};
use std::process::ExitCode;
use tracing::info;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_tracing(&config.tracing_config()) {
        eprintln!("warning: {e}");
    }
    info!(version = env!("CARGO_PKG_VERSION"), "set-issuer starting");

    let mut stdout = std::io::stdout().lock();
    match run(cli.command, config, &mut stdout).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

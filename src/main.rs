use clap::Parser;
use hoopsync::cli::{exit_code, Cli, EXIT_INVALID_INPUT};
use hoopsync::config::AppConfig;
use std::process::ExitCode;
use tracing::error;

mod main_runtime;

use main_runtime::init_logging;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match AppConfig::load_from(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration from {}: {}", cli.config.display(), e);
            return ExitCode::from(EXIT_INVALID_INPUT);
        }
    };
    if let Err(errors) = config.validate() {
        for e in &errors {
            eprintln!("Invalid configuration: {e}");
        }
        return ExitCode::from(EXIT_INVALID_INPUT);
    }

    let _log_guard = init_logging(&config.logging);

    match cli.run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}

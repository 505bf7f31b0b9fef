//! Taskdeck - Main Entry Point

use clap::Parser;
use taskdeck::{Cli, run};
use taskdeck_infrastructure::{ClientConfig, init_tracing};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // The filter may come from the config file, so peek at it before logging starts.
    let log_filter = ClientConfig::load(cli.config.as_deref())
        .ok()
        .and_then(|config| config.log_filter);
    init_tracing(log_filter.as_deref())?;

    tracing::debug!("taskdeck v{}", env!("CARGO_PKG_VERSION"));

    match run(cli).await {
        Ok(output) => {
            println!("{output}");
            Ok(())
        }
        Err(error) => {
            eprintln!("error: {}", error.notice());
            std::process::exit(1);
        }
    }
}

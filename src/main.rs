mod cli;
mod run;

use clap::Parser;
use cli::{Cli, Commands};
use genfetch::config::Config;
use genfetch::observability;
use std::time::Instant;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    let logging = observability::init(observability::DEFAULT_LEVEL);

    let config = Config::load()?;
    if let Some(logging) = &logging {
        logging.set_level(&config.logging.level)?;
    }

    let started = Instant::now();

    match cli.command {
        Commands::Run(args) => {
            run::run(config, args).await?;
        }
    }

    let elapsed = started.elapsed();
    info!(elapsed_ms = elapsed.as_millis() as u64, "Total ETL time: {:.2?}", elapsed);

    Ok(())
}

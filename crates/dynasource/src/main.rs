//! dynasource CLI entry point.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dynasource::cli::{execute, Cli};
use dynasource::storage::DynamoDbClient;
use dynasource::{Config, DataSource};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays machine-readable.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dynasource=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env()?
        .with_endpoint_url(cli.endpoint_url.clone())
        .with_region(cli.region.clone())
        .with_scan_strategy(cli.scan_strategy);

    let client = DynamoDbClient::connect(&config).await?;
    let source = DataSource::new(client).with_scan_strategy(config.scan_strategy);

    let output = execute(&source, cli.command, cli.format).await?;
    println!("{output}");

    Ok(())
}

//! azsites - Azure App Service management sample
//!
//! Creates and configures resource groups, App Service plans, sites and
//! certificates through Azure Resource Manager.

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use azsites::cli::Cli;
use azsites::error::{root_cause, AzsitesError, Result};

#[tokio::main]
async fn main() {
    // Parse command-line arguments
    let cli = Cli::parse();

    // Logging depends on the `debug` setting, so the configuration comes first
    let config = match cli.load_config().await {
        Ok(config) => config,
        Err(e) => exit_with(e),
    };
    init_logging(cli.log_filter(&config));

    if let Err(e) = run(cli, config).await {
        error!("Error: {}", e);
        exit_with(e);
    }
}

async fn run(cli: Cli, config: azsites::config::Config) -> Result<()> {
    info!("Starting azsites");
    cli.execute(config).await
}

fn exit_with(e: AzsitesError) -> ! {
    eprintln!("Error: {}", root_cause(&e));
    std::process::exit(1);
}

fn init_logging(default_filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

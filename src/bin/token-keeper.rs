use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use reqwest::Client;
use token_keeper::server;
use token_keeper::sources::KeycloakSource;
use token_keeper::token::TokenBuilder;
use token_keeper::utils::config_loader;
use token_keeper::utils::constants::DEFAULT_CONFIG_PATH;
use token_keeper::utils::logging::{self, LogLevel};
use tokio::signal;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: String,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // -------------------------------
    // 1. Load YAML config, start logging
    // -------------------------------

    let args = Args::parse();
    let service_config = config_loader::run(&args.config).await?;
    logging::run(&service_config, args.log_level)?;

    // -------------------------------
    // 2. Fetch the first token, start refreshing
    // -------------------------------

    let source = KeycloakSource::new(Client::new());
    let handle = TokenBuilder::from_service_config(&service_config)
        .token_source(source)
        .build()
        .await?;
    let handle = Arc::new(handle);

    // -------------------------------
    // 3. Serve token and metrics until a shutdown signal arrives
    // -------------------------------

    info!("Service starting...");
    server::server::start(&service_config.settings, handle.clone(), shutdown_signal()).await?;

    handle.stop();
    info!("Service stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}

use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::Parser;
use doc_grant_agent::grant::issuer::GrantIssuer;
use doc_grant_agent::observability::service_resources_metrics::collect_process_metrics;
use doc_grant_agent::server;
use doc_grant_agent::utils::config_loader;
use doc_grant_agent::utils::constants::DEFAULT_CONFIG_PATH;
use doc_grant_agent::utils::logging;
use doc_grant_agent::utils::logging::LogLevel;
use tracing::{error, info};

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
    // 1. Read args
    // -------------------------------

    let args = Args::parse();

    // -------------------------------
    // 2. Load YAML config, start logging
    // -------------------------------

    let service_config = config_loader::run(&args.config).await?;
    logging::run(&service_config, args.log_level);

    // -------------------------------
    // 3. Load the shared secret once, build the issuer
    // -------------------------------

    let issuer = GrantIssuer::from_config(&service_config.issuer)
        .inspect_err(|e| error!("cannot start grant issuer: {}", e))
        .map_err(|e| anyhow!(e))?;
    let issuer = Arc::new(issuer);

    // -------------------------------
    // 4. Start http server
    // -------------------------------

    let http_server = server::server::start(
        &service_config.settings,
        issuer.clone(),
        &service_config.editor,
        shutdown_signal(),
    );

    // -------------------------------
    // 5. Start scraping system resources consumption metrics
    // -------------------------------

    let service_metrics = collect_process_metrics(service_config.settings.metrics.is_enabled);

    info!("Service starting...");
    tokio::select! {
        res = http_server => res?,
        res = service_metrics => res?,
    }

    // the issuer owns the only long-lived handle to the secret; dropping it wipes the key
    drop(issuer);
    info!("Service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("cannot listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

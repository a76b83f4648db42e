use anyhow::{Context, Result};
use esgpipe::{api, config::Config, logging, processing::AnalysisService};
use std::net::Ipv4Addr;
use std::sync::Arc;
use tokio::net::TcpListener;

const DEFAULT_PORT: u16 = 5000;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(Config::from_env().context("failed to load configuration")?);
    logging::init_tracing();

    let service = Arc::new(AnalysisService::new(Arc::clone(&config)));
    let port = config.server_port.unwrap_or(DEFAULT_PORT);
    let app = api::create_router(config, service);

    let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
        .await
        .with_context(|| format!("failed to bind port {port}"))?;
    tracing::info!("Listening on http://0.0.0.0:{port}");
    axum::serve(listener, app)
        .await
        .context("server terminated unexpectedly")?;
    Ok(())
}

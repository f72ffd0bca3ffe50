//! Hotel booking server
//!
//! Serves the public booking flow and the admin back office over HTTP.
//! - Storage: Sled document store under `DATA_DIR`
//! - Payments: hosted gateway (Instamojo-compatible)
//! - Email: ZeptoMail-compatible provider
//!
//! Usage:
//!   cargo run --bin seed_admin -- --username admin --password <pw>   # first admin
//!   cargo run --bin hotel_booking                                     # start server

use clap::Parser;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use hotel_booking::config::Config;
use hotel_booking::gateway::InstamojoGateway;
use hotel_booking::logging;
use hotel_booking::mailer::ZeptoMailer;
use hotel_booking::rest::create_router;
use hotel_booking::state::AppState;
use hotel_booking::storage::Storage;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenvy::dotenv().ok();
    let config = Config::parse();
    let _log_guard = logging::init(&config.log)?;

    let storage = Storage::open(&config.data_dir)?;
    info!(data_dir = %config.data_dir.display(), "storage opened");

    let client = reqwest::Client::builder().timeout(config.http_timeout()).build()?;
    let gateway = Arc::new(InstamojoGateway::new(client.clone(), config.gateway.clone()));
    let mailer = Arc::new(ZeptoMailer::new(client, config.email.clone(), config.property.name.clone()));

    let bind_addr = config.bind_addr;
    let state = AppState::new(storage.clone(), gateway, mailer, config);
    let app = create_router(state);

    let listener = TcpListener::bind(bind_addr).await?;
    info!(%bind_addr, "hotel booking server listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shutting down, flushing storage");
    storage.flush().await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
    }
}

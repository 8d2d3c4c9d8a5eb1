use std::net::SocketAddr;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use crate::app::{app, AppState, Stores};
use crate::config;
use crate::services::seed::{seed_demo_data, DEMO_EMAIL};

/// Run the HTTP server until ctrl-c
pub async fn handle(port: Option<u16>, seed: bool) -> anyhow::Result<()> {
    let mut config = config::config().clone();
    if let Some(port) = port {
        config.server.port = port;
    }
    info!("Starting Lead Tracker API in {:?} mode", config.environment);

    let stores = Stores::connect(&config.database).context("failed to configure database")?;
    stores.migrate().await.context("failed to apply database schema")?;

    // The memory backend starts empty, so development always gets the demo data
    if seed || crate::is_development!() {
        let report = seed_demo_data(stores.accounts.as_ref(), stores.leads.as_ref(), false)
            .await
            .context("failed to seed demo data")?;
        info!(email = DEMO_EMAIL, leads = report.leads_created, "Demo data ready");
    }

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let router = app(AppState::new(&stores, config));

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("Lead Tracker API listening on http://{}", bind_addr);

    // Peer addresses key the per-client rate limit
    axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

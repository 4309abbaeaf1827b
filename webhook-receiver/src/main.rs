mod config;
mod dispatch;
mod http_server;
mod store;
mod types;

use anyhow::Context;
use config::ReceiverConfig;
use jewelmusic::webhooks::{EventKind, WebhookCreate};
use jewelmusic::JewelMusic;
use secrecy::ExposeSecret;
use store::DeliveryStore;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ReceiverConfig::from_env()?;

    let mut store = DeliveryStore::new(config.data_dir.clone());
    if let Err(e) = store.load() {
        warn!(error = %e, "starting with an empty delivery log");
    }

    if let Some(public_url) = &config.public_url {
        register_endpoint(public_url, &config).await;
    }

    let state = http_server::ServerState::new(config.secret, config.tolerance_secs, store);
    let app = http_server::router(state);

    let listener = TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("failed to bind port {}", config.port))?;
    info!(
        addr = %listener.local_addr()?,
        path = http_server::WEBHOOK_PATH,
        "webhook receiver listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("webhook receiver stopped");
    Ok(())
}

/// Register this receiver with the platform for every known event type.
async fn register_endpoint(public_url: &str, config: &ReceiverConfig) {
    let client = match JewelMusic::from_env() {
        Ok(client) => client,
        Err(e) => {
            warn!(error = %e, "skipping endpoint registration");
            return;
        }
    };

    let url = format!("{}{}", public_url.trim_end_matches('/'), http_server::WEBHOOK_PATH);
    let request = WebhookCreate::new(url.clone(), EventKind::ALL_KNOWN.iter().map(EventKind::as_str))
        .with_secret(config.secret.expose_secret())
        .with_description("jewelmusic-webhook-receiver");

    match client.webhooks().create(&request).await {
        Ok(webhook) => info!(webhook_id = %webhook.id, %url, "registered webhook endpoint"),
        Err(e) => warn!(error = %e, %url, "failed to register webhook endpoint"),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

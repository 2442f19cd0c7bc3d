use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use mergehook::{AppState, app, config::Config, graph::GraphClient, jobs::JobQueue};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::parse();
    config.validate()?;

    let graph = Arc::new(GraphClient::new(reqwest::Client::new(), config.graph.clone()));
    let (queue, workers) = JobQueue::start(graph, config.workers);
    let state = Arc::new(AppState::new(&config, Arc::new(queue)));

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(
        %addr,
        workers = workers.len(),
        graph = %config.graph.url,
        trigger = %config.trigger,
        "GitHub webhook handler starting"
    );
    if !config.validate_signatures {
        warn!("signature validation disabled - deliveries will not be authenticated");
    } else if config.secret.is_empty() {
        warn!("no webhook secret configured - only deliveries signed with an empty key will pass");
    }

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("waiting for queued jobs to finish, interrupt again to abandon them");
    if !workers.join_until(shutdown_signal()).await {
        warn!("second shutdown signal, abandoning queued jobs");
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

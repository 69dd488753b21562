use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod broker;
pub mod config;
pub mod context;
pub mod error;
pub mod health;
pub mod message;
pub mod metrics;
pub mod producer;
pub mod relay_worker;
pub mod resolver;
pub mod result_log;
pub mod routes;

use config::Config;
use context::AppContext;
use resolver::ConfigResolver;

/// Start the relay: consumer worker plus HTTP surface, until a shutdown
/// signal arrives
pub async fn run() -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.rust_log.clone()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("=== Construct Relay Starting ===");
    info!("Broker: {}", config.broker.url_safe());
    info!(
        "Bindings: {} -> factory, {} -> queue '{}'",
        config.broker.connection_factory_name,
        config.broker.destination_name,
        config.broker.queue_name
    );

    let config = Arc::new(config);
    let resolver = Arc::new(ConfigResolver::new(config.broker.clone()));
    let app_context = Arc::new(AppContext::new(config.clone(), resolver));

    app_context
        .supervisor
        .start()
        .context("Failed to start consumer worker")?;

    let app = routes::create_router(app_context.clone());

    let addr = config.server.listen_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Relay listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Failed to start server")?;

    info!("HTTP server stopped, releasing consumer worker");
    let grace = Duration::from_secs(config.worker.shutdown_grace_secs);
    if let Some(reason) = app_context.supervisor.shutdown(grace).await {
        info!(reason = %reason, "Consumer worker released");
    }

    info!("=== Construct Relay Stopped ===");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}

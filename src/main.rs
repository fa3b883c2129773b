//! feed-replica server entry point.
//!
//! Opens every configured backend, serves the REST endpoints, and
//! releases all connection pools on shutdown.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use feed_replica::api;
use feed_replica::app_state::AppState;
use feed_replica::config::ReplicaConfig;
use feed_replica::domain::BackendRegistry;
use feed_replica::service::ReplicaService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = ReplicaConfig::from_env().context("loading configuration")?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    tracing::info!(
        addr = %config.listen_addr,
        backends = config.backends.len(),
        "starting feed-replica"
    );

    // Build the replica set
    let registry = Arc::new(BackendRegistry::from_config(&config).context("opening backends")?);
    tracing::info!(
        primary = %registry.primary().name(),
        backends = ?registry.names(),
        count = registry.len(),
        "replica set ready"
    );

    // Build service layer
    let replica_service = Arc::new(ReplicaService::new(registry));

    // Build application state
    let app_state = AppState {
        replica_service: Arc::clone(&replica_service),
        max_batch_size: config.max_batch_size,
    };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    // Release pools even if the server stopped with an error
    replica_service.shutdown().await;
    served.context("http server")?;

    tracing::info!("shutdown complete");
    Ok(())
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutdown signal received");
}

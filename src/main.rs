use std::sync::Arc;

use ambulance_waitlist::{
    AppConfig, Cancellation, CliOverrides, FileAmbulanceStore, InMemoryAmbulanceStore,
    MetricsRecorder, app_state, build_router, telemetry::init_tracing,
};
use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let overrides = CliOverrides::parse();
    let config = AppConfig::from_env()
        .and_then(|config| config.apply(overrides))
        .context("failed to load configuration")?;
    init_tracing(&config)?;

    let metrics = Arc::new(MetricsRecorder::register());
    let state = match &config.data_dir {
        Some(data_dir) => {
            let store = FileAmbulanceStore::open(data_dir)
                .await
                .with_context(|| format!("failed to open store at {}", data_dir.display()))?;
            info!(data_dir = %data_dir.display(), "using file ambulance store");
            app_state(Arc::new(store), config.retry.clone(), metrics)
        }
        None => {
            info!("using in-memory ambulance store");
            app_state(
                Arc::new(InMemoryAmbulanceStore::new()),
                config.retry.clone(),
                metrics,
            )
        }
    };
    let shutdown = state.shutdown.clone();

    let app = build_router(state);
    let listener = match tokio::net::TcpListener::bind(config.bind_addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(bind_addr = %config.bind_addr, error = %err, "failed to bind listener");
            return Err(err).with_context(|| format!("failed to bind {}", config.bind_addr));
        }
    };

    info!(
        bind_addr = %config.bind_addr,
        environment = ?config.environment,
        max_update_attempts = config.retry.max_attempts,
        "ambulance waiting-list API started"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .context("server error")?;

    info!("ambulance waiting-list API stopped");
    Ok(())
}

/// Resolves on ctrl+c or SIGTERM and cancels in-flight updates.
async fn shutdown_signal(shutdown: Cancellation) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "unable to install ctrl+c handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "unable to install sigterm handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown requested");
    shutdown.cancel();
}

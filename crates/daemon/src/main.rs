//! hookq - Main Entry Point
//! HTTP management API + dispatch loop over per-queue SQLite stores

mod config;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use hookq_api_http::AppState;
use hookq_core::application::{shutdown_channel, Dispatcher, FanOut, QueueService};
use hookq_core::port::time_provider::SystemTimeProvider;
use hookq_core::port::{Catalog, QueueStoreProvider, TimeProvider, WebhookNotifier};
use hookq_infra_http::{HttpWebhookNotifier, NotifierConfig};
use hookq_infra_sqlite::{create_pool, run_catalog_migrations, SqliteCatalog, SqliteStoreRegistry};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Configuration and logging
    let settings = config::Args::parse()
        .into_settings()
        .context("Invalid configuration")?;
    let _log_guard = logging::init(settings.log_format, settings.log_dir.as_deref())?;

    info!("hookq v{} starting...", VERSION);
    info!(
        metadb = %settings.metadb,
        workspaces = %settings.workspaces.display(),
        "Initializing storage..."
    );

    // 2. Catalog database
    let pool = create_pool(&settings.metadb)
        .await
        .context("Catalog pool creation failed")?;
    run_catalog_migrations(&pool)
        .await
        .context("Catalog migration failed")?;

    tokio::fs::create_dir_all(&settings.workspaces)
        .await
        .with_context(|| {
            format!(
                "Cannot create workspaces root {}",
                settings.workspaces.display()
            )
        })?;

    // 3. Setup dependencies (DI wiring)
    let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
    let catalog: Arc<dyn Catalog> = Arc::new(SqliteCatalog::new(pool, time_provider.clone()));
    let stores: Arc<dyn QueueStoreProvider> = Arc::new(SqliteStoreRegistry::new(
        settings.workspaces.clone(),
        time_provider,
    ));
    let service = Arc::new(QueueService::new(catalog.clone(), stores.clone()));

    // 4. Remove stores left behind by interrupted deletions
    match service.reap_orphaned_stores().await {
        Ok(0) => {}
        Ok(count) => info!(reaped_stores = count, "Orphaned stores removed"),
        Err(e) => error!(error = %e, "Orphaned store sweep failed"),
    }

    let notifier: Arc<dyn WebhookNotifier> = Arc::new(
        HttpWebhookNotifier::new(NotifierConfig {
            timeout: settings.delivery_timeout,
            ..NotifierConfig::default()
        })
        .context("Webhook client setup failed")?,
    );
    let mut fanout = FanOut::new(notifier, settings.fanout_concurrency);
    if let Some(timeout) = settings.delivery_timeout {
        fanout = fanout.with_attempt_timeout(timeout);
    }
    let dispatcher = Dispatcher::new(catalog, stores, fanout, settings.dispatch.clone());

    // 5. Start dispatcher
    info!("Starting dispatcher...");
    let (shutdown_tx, shutdown_token) = shutdown_channel();
    let dispatcher_handle = tokio::spawn(async move {
        if let Err(e) = dispatcher.run(shutdown_token).await {
            error!(error = %e, "Dispatcher failed");
        }
    });

    // 6. Start HTTP server
    let listener = tokio::net::TcpListener::bind(settings.listen_addr)
        .await
        .with_context(|| format!("Cannot bind {}", settings.listen_addr))?;
    let mut server_stop = shutdown_tx.token();
    let server_handle = tokio::spawn(hookq_api_http::serve(
        listener,
        AppState::new(service),
        async move { server_stop.cancelled().await },
    ));

    info!("System ready. Press Ctrl+C to shutdown");

    // 7. Wait for shutdown signal
    shutdown_signal().await;

    // 8. Graceful shutdown
    shutdown_tx.shutdown();
    drain(settings.shutdown_timeout, dispatcher_handle, server_handle).await;

    info!("Shutdown complete.");
    Ok(())
}

/// Wait for the dispatcher and the HTTP server under one shared deadline
async fn drain(
    grace: Duration,
    dispatcher_handle: JoinHandle<()>,
    server_handle: JoinHandle<std::io::Result<()>>,
) {
    let deadline = tokio::time::Instant::now() + grace;
    if tokio::time::timeout_at(deadline, dispatcher_handle)
        .await
        .is_err()
    {
        warn!(
            timeout_secs = grace.as_secs(),
            "Dispatcher did not stop within the shutdown timeout"
        );
    }

    match tokio::time::timeout_at(deadline, server_handle).await {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(e))) => error!(error = %e, "HTTP server failed"),
        Ok(Err(e)) => error!(error = %e, "HTTP server task panicked"),
        Err(_) => warn!("HTTP server did not drain within the shutdown timeout"),
    }
}

/// Resolve on CTRL+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received CTRL+C, starting graceful shutdown"),
        () = terminate => info!("Received SIGTERM, starting graceful shutdown"),
    }
}

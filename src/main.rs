//! pixel-canvas server entry point.
//!
//! Loads the canvas from the configured store, starts the write-behind
//! persister and the weekly snapshot scheduler, and serves the REST API
//! until SIGINT/SIGTERM.

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use pixel_canvas::api;
use pixel_canvas::app_state::AppState;
use pixel_canvas::config::{CanvasConfig, StoreBackend};
use pixel_canvas::persistence::{CanvasStore, FileStore, MemoryStore, PostgresStore};
use pixel_canvas::service::{PlacementService, SnapshotScheduler, run_persister};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = CanvasConfig::from_env().context("loading configuration")?;
    tracing::info!(
        addr = %config.listen_addr,
        width = config.canvas_width,
        height = config.canvas_height,
        cooldown_secs = config.cooldown_secs,
        backend = ?config.store_backend,
        "starting pixel-canvas"
    );

    let store = open_store(&config).await?;

    let placement_service = Arc::new(
        PlacementService::load_or_new(
            store.as_ref(),
            config.canvas_width,
            config.canvas_height,
            config.cooldown(),
            config.placement_log_capacity,
        )
        .await
        .context("loading canvas")?,
    );
    let snapshot_scheduler = Arc::new(SnapshotScheduler::new(
        Arc::clone(&placement_service),
        Arc::clone(&store),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let persister = tokio::spawn(run_persister(
        Arc::clone(&placement_service),
        Arc::clone(&store),
        config.persist_interval(),
        shutdown_rx.clone(),
    ));
    let scheduler = config.snapshot_enabled.then(|| {
        tokio::spawn(
            Arc::clone(&snapshot_scheduler).run(config.snapshot_check_interval(), shutdown_rx),
        )
    });
    if config.cron_secret.is_none() {
        tracing::info!("CRON_SECRET unset; manual snapshot trigger disabled");
    }

    let app_state = AppState {
        placement_service,
        snapshot_scheduler,
        cron_secret: config.cron_secret.as_deref().map(Arc::from),
    };

    let app = api::build_router().with_state(app_state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    tracing::info!("shutting down background tasks");
    let _ = shutdown_tx.send(true);
    if let Err(e) = persister.await {
        tracing::error!(error = %e, "persister task failed");
    }
    if let Some(scheduler) = scheduler {
        if let Err(e) = scheduler.await {
            tracing::error!(error = %e, "snapshot task failed");
        }
    }
    Ok(())
}

/// Opens the configured persistence backend.
async fn open_store(config: &CanvasConfig) -> anyhow::Result<Arc<dyn CanvasStore>> {
    let store: Arc<dyn CanvasStore> = match config.store_backend {
        StoreBackend::Memory => {
            tracing::warn!("memory store selected; the canvas will not survive a restart");
            Arc::new(MemoryStore::new())
        }
        StoreBackend::File => {
            tracing::info!(dir = %config.data_dir.display(), "using file store");
            Arc::new(FileStore::new(config.data_dir.clone()))
        }
        StoreBackend::Postgres => {
            let store = PostgresStore::connect(
                &config.database_url,
                config.database_max_connections,
                std::time::Duration::from_secs(config.database_connect_timeout_secs),
            )
            .await
            .context("connecting to PostgreSQL")?;
            tracing::info!("using PostgreSQL store");
            Arc::new(store)
        }
    };
    Ok(store)
}

/// Stderr logging filtered by `RUST_LOG` (default `info`); `LOG_FORMAT=json`
/// switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
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
                tracing::error!(error = %e, "failed to listen for SIGTERM");
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

use std::sync::Arc;

use anyhow::Context;
use axum::http::{header, HeaderValue, Method};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stockwatch_api::{create_router, ApiConfig, AppState};
use stockwatch_geo::{AreaClassifier, MapConverter, TrackingLog};
use stockwatch_pipeline::GeolocationMonitor;
use stockwatch_store::{MemoryNotificationStore, NotificationFeed, ProcessedSet};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stockwatch_api=info,stockwatch_pipeline=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ApiConfig::load().context("Failed to load configuration")?;
    config
        .paths
        .ensure()
        .context("Failed to prepare data directories")?;

    tracing::info!(
        port = config.port,
        data_dir = %config.data_dir.display(),
        ingest = config.ingest_enabled(),
        "Starting stockwatch API server"
    );

    let feed: Arc<dyn NotificationFeed> =
        Arc::new(MemoryNotificationStore::new(config.notification_capacity));
    let converter = Arc::new(MapConverter::new(
        &config.paths.map_metadata,
        &config.paths.map_image,
    ));
    if converter.force_reload() {
        tracing::info!(map = ?converter.current(), "Loaded store map");
    } else {
        tracing::info!("No store map yet, using default map values");
    }

    let monitor = Arc::new(
        GeolocationMonitor::new(
            &config.paths.defect_dir,
            Arc::clone(&feed),
            ProcessedSet::new(config.processed_capacity),
            Arc::clone(&converter),
            TrackingLog::new(&config.paths.tracking_log).with_tolerance(config.tolerance_secs),
            AreaClassifier::new(&config.paths.areas_file),
        )
        .with_interval(config.monitor_interval),
    );

    let token = CancellationToken::new();
    let monitor_task = tokio::spawn(monitor.run(token.clone()));

    let state = Arc::new(AppState::new(
        config.paths.clone(),
        feed,
        converter,
        config.ingest_token.clone(),
    ));

    let mut app = create_router(state).layer(TraceLayer::new_for_http());
    if let Some(origin) = &config.cors_origin {
        let allowed: HeaderValue = origin
            .parse()
            .with_context(|| format!("Invalid CORS origin: {origin}"))?;
        let cors = CorsLayer::new()
            .allow_origin(allowed)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::HeaderName::from_static("x-ingest-token")]);
        app = app.layer(cors);
        tracing::info!("CORS enabled for {}", origin);
    }

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(token.clone()))
        .await
        .context("Server error")?;

    token.cancel();
    if let Err(e) = monitor_task.await {
        tracing::error!(error = %e, "Geolocation monitor task failed");
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM and cancels `token`
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
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
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, shutting down");
        },
    }

    token.cancel();
}

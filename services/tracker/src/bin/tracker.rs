//! services/tracker/src/bin/tracker.rs

use axum::http::{
    header::{ACCEPT, CONTENT_TYPE},
    HeaderValue, Method,
};
use axum::Router;
use production_tracker_core::{clock::SystemClock, TrackerService};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tracker_lib::{
    adapters::{FileStore, SheetsAdapter},
    config::Config,
    error::ApiError,
    sync_task::periodic_sync,
    web::{self, rest::ApiDoc, state::AppState},
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Initialize Adapters & the Storage Service ---
    let store = Arc::new(FileStore::open(&config.data_dir).await?);
    info!("Local storage at {}", store.root().display());
    let sheets = Arc::new(SheetsAdapter::new(config.remote_timeout)?);

    let service = Arc::new(TrackerService::new(
        store,
        sheets,
        Arc::new(SystemClock),
        config.service_config(),
    ));
    service.init().await?;

    // --- 3. Background Sync ---
    let shutdown = CancellationToken::new();
    let sync_worker = config.sync_interval.map(|interval| {
        tokio::spawn(periodic_sync(
            service.clone(),
            interval,
            shutdown.child_token(),
        ))
    });

    // --- 4. Build the Shared AppState & Router ---
    let app_state = Arc::new(AppState {
        service: service.clone(),
        config: config.clone(),
        shutdown: shutdown.clone(),
    });

    let origin = config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!("Invalid CORS origin '{}': {}", config.cors_origin, e))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, ACCEPT])
        .allow_credentials(true);

    let app = Router::new()
        .merge(web::router(app_state).layer(cors))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    let signal_token = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for the shutdown signal: {}", e);
            }
            info!("Shutdown signal received");
            signal_token.cancel();
        })
        .await?;

    // --- 6. Drain Background Work ---
    shutdown.cancel();
    if let Some(worker) = sync_worker {
        if let Err(e) = worker.await {
            error!("Sync worker ended abnormally: {}", e);
        }
    }
    service.shutdown().await;
    info!("Server stopped");
    Ok(())
}

//! Publishing Dataset Controller
//!
//! Backend for the dataset publishing screens. Aggregates the dataset API, the collection
//! service and the topics service into edit views, and relays edits back to them.

mod api;
mod clients;
mod config;
mod errors;
mod headers;
mod health;
mod mapper;
mod metadata;
mod models;

use std::future::IntoFuture;
use std::sync::Arc;

use axum::{routing::get, Router};
use tokio::sync::Notify;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use clients::{
    BabbageClient, CollectionApi, DatasetApi, DatasetClient, TopicsApi, UpstreamError,
    ZebedeeClient,
};
use config::{Config, LogFormat};
use health::{Checker, Health};
use metadata::MetadataService;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub dataset: Arc<dyn DatasetApi>,
    pub topics: Arc<dyn TopicsApi>,
    pub metadata: Arc<MetadataService>,
    pub health: Arc<Health>,
}

impl AppState {
    /// Build the upstream clients, metadata service and health checker from configuration.
    pub fn from_config(config: Arc<Config>) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder()
            .timeout(config.upstream_timeout)
            .build()
            .map_err(|source| UpstreamError::Transport {
                service: "http-client",
                source,
            })?;

        let dataset = Arc::new(DatasetClient::new(
            &config.dataset_api_url,
            http.clone(),
            config.service_auth_token.clone(),
        )?);
        let zebedee = Arc::new(ZebedeeClient::new(&config.zebedee_url, http.clone())?);
        let babbage = Arc::new(BabbageClient::new(&config.babbage_url, http)?);

        let checkers: Vec<Arc<dyn Checker>> =
            vec![dataset.clone(), zebedee.clone(), babbage.clone()];
        let health = Arc::new(Health::new(checkers, config.healthcheck_critical_timeout));

        let collections: Arc<dyn CollectionApi> = zebedee;
        let metadata = Arc::new(MetadataService::new(dataset.clone(), collections));

        Ok(Self {
            config,
            dataset,
            topics: babbage,
            metadata,
            health,
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let (text_layer, json_layer) = match config.log_format {
        LogFormat::Text => (Some(tracing_subscriber::fmt::layer()), None),
        LogFormat::Json => (None, Some(tracing_subscriber::fmt::layer().json())),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(text_layer)
        .with(json_layer)
        .init();

    tracing::info!("Starting publishing dataset controller");
    tracing::info!("Dataset API: {}", config.dataset_api_url);
    tracing::info!("Zebedee: {}", config.zebedee_url);
    tracing::info!("Babbage: {}", config.babbage_url);
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.service_auth_token.is_none() {
        tracing::warn!("No service auth token configured (SERVICE_AUTH_TOKEN)");
    }

    let config = Arc::new(config);
    let state = AppState::from_config(config.clone())?;
    let health_task = state.health.start(config.healthcheck_interval);

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    let shutdown_started = Arc::new(Notify::new());
    let notify = shutdown_started.clone();
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, draining connections");
        health_task.abort();
        notify.notify_one();
    });

    let timeout = config.graceful_shutdown_timeout;
    tokio::select! {
        result = server.into_future() => result?,
        _ = async {
            shutdown_started.notified().await;
            tokio::time::sleep(timeout).await;
        } => {
            tracing::warn!("Graceful shutdown timed out after {:?}", timeout);
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Dataset routes; every handler validates the identity headers itself
    let dataset_routes = Router::new()
        .route("/datasets", get(api::list_datasets))
        .route("/datasets/{dataset_id}/create", get(api::list_topics))
        .route("/datasets/{dataset_id}/editions", get(api::list_editions))
        .route(
            "/datasets/{dataset_id}/editions/{edition}/versions",
            get(api::list_versions),
        )
        .route(
            "/datasets/{dataset_id}/editions/{edition}/versions/{version}",
            get(api::get_edit_metadata)
                .put(api::put_edit_metadata)
                .patch(api::patch_edit_metadata),
        )
        .route(
            "/datasets/{dataset_id}/editions/{edition}/versions/{version}/metadata",
            get(api::get_version_metadata),
        );

    // Health check (no headers required)
    let health_routes = Router::new().route("/health", get(health::health_check));

    Router::new()
        .merge(dataset_routes)
        .merge(health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
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
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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
}

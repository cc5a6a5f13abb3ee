//! Inbound HTTP gateway.
//!
//! Every request that does not hit one of the gateway's own endpoints is
//! turned into a [`PipelineRequest`](apix_types::request::PipelineRequest)
//! and run through the [`Orchestrator`]. The built-in extension services
//! are mounted next to it when enabled, so a single process can host both
//! the pipeline and the stages it calls.

pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use apix_core::Orchestrator;
use apix_platform::fs::FileSystem;
use apix_types::config::{Config, GatewayConfig};

use crate::error::{Result, ServiceError};
use crate::store::StoreService;
use crate::validation::ValidationService;

/// Mount point of the validation service.
pub const VALIDATION_PATH: &str = "/_services/validation";

/// Mount point of the store service.
pub const STORE_PATH: &str = "/_services/store";

/// Shared state accessible by all gateway handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// The pipeline engine.
    pub orchestrator: Arc<Orchestrator>,
    /// Cancelled on shutdown; in-flight pipelines stop before their next stage.
    pub shutdown: CancellationToken,
    /// Validation service, when enabled.
    pub validation: Option<Arc<ValidationService>>,
    /// Store service, when enabled.
    pub store: Option<Arc<StoreService>>,
}

impl GatewayState {
    /// Build the state for a loaded configuration.
    pub fn from_config(
        config: &Config,
        orchestrator: Arc<Orchestrator>,
        fs: Arc<dyn FileSystem>,
        shutdown: CancellationToken,
    ) -> Self {
        let validation = config
            .services
            .validation
            .enabled
            .then(|| Arc::new(ValidationService::from_config(&config.services.validation)));
        let store = config
            .services
            .store
            .enabled
            .then(|| Arc::new(StoreService::from_config(fs, &config.services.store)));

        Self {
            orchestrator,
            shutdown,
            validation,
            store,
        }
    }
}

/// Build the gateway router.
pub fn build_router(state: GatewayState, gateway: &GatewayConfig) -> Router {
    let cors = if gateway.cors_origins.is_empty() {
        CorsLayer::permissive()
    } else {
        let origins: Vec<_> = gateway
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Other methods on these paths still go through the pipeline.
    let mut router = Router::new().route(
        "/health",
        get(handlers::health).fallback(handlers::pipeline),
    );
    if state.validation.is_some() {
        router = router.route(
            VALIDATION_PATH,
            post(handlers::validation).fallback(handlers::pipeline),
        );
    }
    if state.store.is_some() {
        router = router.route(STORE_PATH, post(handlers::store).fallback(handlers::pipeline));
    }

    router
        .fallback(handlers::pipeline)
        .layer(axum::extract::DefaultBodyLimit::max(gateway.max_body_bytes))
        .layer(RequestBodyLimitLayer::new(gateway.max_body_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the configured address and serve until `shutdown` is cancelled.
pub async fn serve(router: Router, gateway: &GatewayConfig, shutdown: CancellationToken) -> Result<()> {
    let addr = format!("{}:{}", gateway.host, gateway.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| ServiceError::InvalidAddress {
            addr: addr.clone(),
            reason: e.to_string(),
        })?;
    serve_on(listener, router, shutdown).await
}

/// Serve on an already bound listener until `shutdown` is cancelled.
pub async fn serve_on(listener: TcpListener, router: Router, shutdown: CancellationToken) -> Result<()> {
    let local = listener.local_addr()?;
    tracing::info!(addr = %local, "gateway listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    tracing::info!("gateway stopped");
    Ok(())
}

//! API server setup and configuration.

use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    middleware::map_response_with_state,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::core::{config::ServiceConfig, pipeline::ExtractionPipeline};
use crate::{ReceiptlyError, Result};

use super::{
    handlers::{extract_handler, file_too_large, health_handler, info_handler},
    types::{ApiSizeLimits, ApiState},
};

/// Create the API router for `config`.
///
/// The vision API key is taken from `config.vision.api_key`; without one the
/// extract endpoint serves mock data.
///
/// # Examples
///
/// ```no_run
/// use receiptly::{ServiceConfig, api::create_router};
/// use axum::Router;
///
/// let router = create_router(ServiceConfig::default());
/// let app: Router = Router::new().nest("/receipts", router);
/// ```
pub fn create_router(config: ServiceConfig) -> Router {
    let limits = ApiSizeLimits::from_server(&config.server);
    create_router_with_limits(config, limits)
}

/// Create the API router with custom size limits.
pub fn create_router_with_limits(config: ServiceConfig, limits: ApiSizeLimits) -> Router {
    let state = ApiState::new(Arc::new(ExtractionPipeline::new(&config)));
    create_router_with_state(state, limits, &config.server.cors_origins)
}

/// Create the API router around an existing pipeline.
///
/// `cors_origins` empty means any origin is allowed. Bodies over the
/// transport cap are answered with the same `400` "file too large" result as
/// an upload over the policy limit.
pub fn create_router_with_state(state: ApiState, limits: ApiSizeLimits, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/api/receipt/extract", post(extract_handler))
        .route("/health", get(health_handler))
        .route("/info", get(info_handler))
        .layer(DefaultBodyLimit::max(limits.max_multipart_field_bytes))
        .layer(RequestBodyLimitLayer::new(limits.max_request_body_bytes))
        .layer(map_response_with_state(state.clone(), payload_too_large_as_rejection))
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Rewrite the body limit layer's plain-text `413` into an extraction result.
async fn payload_too_large_as_rejection(State(state): State<ApiState>, response: Response) -> Response {
    if response.status() != StatusCode::PAYLOAD_TOO_LARGE {
        return response;
    }
    tracing::warn!("Request body exceeded the transport cap");
    file_too_large(&state).into_response()
}

fn cors_layer(cors_origins: &[String]) -> CorsLayer {
    let origins: Vec<_> = cors_origins
        .iter()
        .filter_map(|s| s.trim().parse::<axum::http::HeaderValue>().ok())
        .collect();

    if !origins.is_empty() {
        tracing::info!("CORS configured with {} explicit allowed origin(s)", origins.len());
        return CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any);
    }

    if cors_origins.is_empty() {
        tracing::warn!(
            "CORS configured to allow all origins (default). For production, set RECEIPTLY_CORS_ORIGINS \
             to a comma-separated list of allowed origins"
        );
    } else {
        tracing::warn!("Configured CORS origins are all invalid - falling back to permissive CORS");
    }
    CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
}

/// Start the API server, loading configuration from discovery and the environment.
///
/// `host` and `port` override the configured address.
///
/// # Examples
///
/// ```no_run
/// use receiptly::api::serve;
///
/// #[tokio::main]
/// async fn main() -> receiptly::Result<()> {
///     serve("127.0.0.1", 8000).await?;
///     Ok(())
/// }
/// ```
pub async fn serve(host: impl AsRef<str>, port: u16) -> Result<()> {
    let mut config = ServiceConfig::load(None)?;
    config.server.host = host.as_ref().to_string();
    config.server.port = port;
    serve_with_config(config).await
}

/// Start the API server on `config.server.host:config.server.port`.
///
/// Stops on Ctrl+C after in-flight requests finish.
pub async fn serve_with_config(config: ServiceConfig) -> Result<()> {
    let ip: IpAddr = config
        .server
        .host
        .parse()
        .map_err(|e| ReceiptlyError::validation(format!("Invalid host address: {}", e)))?;

    let addr = SocketAddr::new(ip, config.server.port);
    let app = create_router(config);

    tracing::info!("Starting Receiptly API server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.map_err(ReceiptlyError::Io)?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ReceiptlyError::Other(e.to_string()))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

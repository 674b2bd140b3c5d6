//! HTTP surface: `POST /process-image` and `GET /health`.

mod error;
mod handlers;
mod origin;

pub use error::{ApiError, INVALID_IMAGE_MESSAGE, NO_UPLOAD_MESSAGE, UNSUPPORTED_FORMAT_MESSAGE};

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::{middleware, Router};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::{Error, Result};
use crate::pipeline::Pipeline;
use crate::store::OutputStore;

use origin::AllowedOrigins;

/// Browser origins allowed to call the service when none are configured.
pub const DEFAULT_ALLOWED_ORIGINS: [&str; 2] = ["http://localhost:3000", "http://localhost:3001"];

/// Largest accepted request body when none is configured.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// HTTP-level settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Origins allowed to make cross-origin requests. Requests from any other origin are refused.
    pub allowed_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            allowed_origins: DEFAULT_ALLOWED_ORIGINS.map(String::from).to_vec(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Shared server state.
pub struct AppState {
    pub pipeline: Pipeline,
    pub store: OutputStore,
}

pub type SharedState = Arc<AppState>;

/// Build the application router.
///
/// # Errors
///
/// Returns an error if an allowed origin is not a valid header value.
pub fn router(state: SharedState, config: &ServerConfig) -> Result<Router> {
    let origins = config
        .allowed_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin).map_err(|_| Error::InvalidParameter {
                name: "allowed_origins".to_string(),
                reason: format!("{origin:?} is not a valid origin"),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins.clone()))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    let allowed = Arc::new(AllowedOrigins::new(origins));

    Ok(Router::new()
        .route("/process-image", post(handlers::process_image))
        .route("/health", get(handlers::health_check))
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(cors)
        .layer(middleware::from_fn_with_state(
            allowed,
            origin::reject_foreign_origin,
        ))
        .layer(TraceLayer::new_for_http()))
}

/// Serve `app` on `addr` until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(addr: SocketAddr, app: Router) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}

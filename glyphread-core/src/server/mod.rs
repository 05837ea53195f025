pub mod config;
pub mod error;
pub mod handler;
pub mod state;

use std::sync::Arc;

use axum::{Router, extract::DefaultBodyLimit, routing::post};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::*;

use crate::detect::Detector;

pub use config::ServerConfig;
pub use error::{ApiError, ErrorKind};
pub use handler::detect_handler;
pub use state::AppState;

pub fn router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/detect", post(detect_handler))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds `config.addr()` and serves until ctrl-c.
pub async fn serve(config: ServerConfig, detector: Arc<dyn Detector>) -> std::io::Result<()> {
    let app = router(AppState::new(detector), &config);

    let listener = TcpListener::bind(config.addr()).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            warn!("Install ctrl-c handler error: {}", e);
            std::future::pending::<()>().await
        }
    }
}

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use tower_http::trace::TraceLayer;

pub mod error;
pub mod handlers;
pub mod models;
pub mod state;
pub mod upload;

pub use error::ApiError;
pub use state::AppState;

/// Build the service router over shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = DefaultBodyLimit::max(state.settings.max_upload_bytes);

    Router::new()
        .route("/pdf2docxconvert", post(handlers::convert::convert))
        .route(
            "/pdf2docxconverted/{filename}",
            get(handlers::download::download),
        )
        .route("/cleanup", delete(handlers::cleanup::cleanup))
        .route("/health", get(handlers::health::health))
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

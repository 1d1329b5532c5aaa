use std::sync::Arc;

use axum::Json;
use axum::extract::State;

use crate::error::ApiError;
use crate::models::MessageResponse;
use crate::state::AppState;

pub async fn cleanup(State(state): State<Arc<AppState>>) -> Result<Json<MessageResponse>, ApiError> {
    let cancelled = state.removals.cancel_all();

    let storage = state.storage.clone();
    let removed = tokio::task::spawn_blocking(move || storage.clear_converted())
        .await
        .map_err(|e| ApiError::Internal(format!("Cleanup task failed: {e}")))?
        .map_err(|e| ApiError::Cleanup(e.to_string()))?;

    tracing::info!(removed, cancelled, "cleared converted files");

    Ok(Json(MessageResponse {
        message: "All converted files deleted.",
    }))
}

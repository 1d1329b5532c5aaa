use std::sync::Arc;

use axum::Json;
use axum::extract::{Multipart, State};

use pdf2docx_core::{ConversionOutcome, ConvertError, convert_with_fallback, docx_file_name};

use crate::error::ApiError;
use crate::models::ConvertResponse;
use crate::state::AppState;
use crate::upload::{self, PdfUpload};

pub async fn convert(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<ConvertResponse>, ApiError> {
    let PdfUpload {
        filename,
        data,
        range,
    } = upload::parse_multipart(multipart).await?.into_pdf_upload()?;

    let docx_name = docx_file_name(&filename)
        .ok_or_else(|| ApiError::BadRequest("Invalid file type, only PDF is supported".into()))?;
    let dest = state
        .storage
        .artifact_path(&docx_name)
        .ok_or_else(|| ApiError::BadRequest("Invalid file name".into()))?;

    // Same-named uploads share an output path; take turns.
    let artifact = state.locks.lock(&docx_name).await;

    let uploaded = state
        .storage
        .save_upload(&filename, &data)
        .map_err(|e| ApiError::Internal(format!("Failed to save upload: {e}")))?;
    drop(data);

    tracing::info!(file = %filename, ?range, "converting upload");

    // Collaborators are blocking. Post-conversion bookkeeping lives in the
    // task so it still runs when a client disconnect drops this future.
    let task_state = Arc::clone(&state);
    let outcome = tokio::task::spawn_blocking(move || -> Result<ConversionOutcome, ConvertError> {
        let result = convert_with_fallback(
            task_state.converter.as_ref(),
            task_state.backend.as_ref(),
            uploaded.path(),
            &dest,
            range,
        );
        drop(uploaded);
        if result.is_ok() {
            task_state
                .removals
                .schedule(dest, task_state.settings.removal_delay);
        }
        drop(artifact);
        result
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Conversion task failed: {e}")))??;

    Ok(Json(ConvertResponse {
        message: outcome.message(),
        converted_file: docx_name,
    }))
}

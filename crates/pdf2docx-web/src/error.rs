use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use pdf2docx_core::ConvertError;

/// Every failure a handler can report. Rendered as `{"error": message}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("File not found")]
    NotFound,

    #[error("Unsupported file type")]
    UnsupportedType,

    #[error("{0}")]
    Conversion(String),

    #[error("Failed to send file: {0}")]
    Delivery(String),

    #[error("Cleanup failed: {0}")]
    Cleanup(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::UnsupportedType => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conversion(_) | Self::Delivery(_) | Self::Cleanup(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<ConvertError> for ApiError {
    fn from(e: ConvertError) -> Self {
        match e {
            ConvertError::EmptyText => Self::Conversion(e.to_string()),
            other => Self::Conversion(format!("Conversion failed: {other}")),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "request rejected");
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdf2docx_core::BackendError;

    #[test]
    fn statuses() {
        assert_eq!(ApiError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::UnsupportedType.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::BadRequest("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Delivery("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn convert_errors_keep_their_messages() {
        let empty: ApiError = ConvertError::EmptyText.into();
        assert_eq!(empty.to_string(), "Text extraction yielded no content.");

        let failed: ApiError =
            ConvertError::Extraction(BackendError::ExtractionError("bad stream".into())).into();
        assert_eq!(
            failed.to_string(),
            "Conversion failed: Text extraction failed: failed to extract text: bad stream"
        );
    }
}

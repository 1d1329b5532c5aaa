use std::path::{Path as FsPath, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::Response;
use futures_util::Stream;
use tokio_util::io::ReaderStream;

use pdf2docx_core::ArtifactGuard;

use crate::error::ApiError;
use crate::state::AppState;

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
const PDF_MIME: &str = "application/pdf";

pub async fn download(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    // The router already decoded the segment once; names that were encoded
    // twice by the client decode here.
    let filename = urlencoding::decode(&filename)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| filename.clone());

    let path = state
        .storage
        .artifact_path(&filename)
        .ok_or(ApiError::NotFound)?;

    let artifact = state.locks.lock(&filename).await;

    match tokio::fs::metadata(&path).await {
        Ok(meta) if meta.is_file() => {}
        _ => return Err(ApiError::NotFound),
    }

    let content_type = content_type_for(&filename).ok_or(ApiError::UnsupportedType)?;

    let file = tokio::fs::File::open(&path)
        .await
        .map_err(|e| ApiError::Delivery(e.to_string()))?;
    let len = file
        .metadata()
        .await
        .map_err(|e| ApiError::Delivery(e.to_string()))?
        .len();

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, len)
        .header(header::CONTENT_DISPOSITION, attachment_disposition(&filename))
        .body(Body::from_stream(RemoveAfterSend::new(
            ReaderStream::new(file),
            path.clone(),
            artifact,
        )))
        .map_err(|e| ApiError::Delivery(e.to_string()))?;

    // The body now owns deletion; the timer is no longer needed.
    state.removals.cancel(&path);
    tracing::info!(file = %filename, bytes = len, "sending converted file");

    Ok(response)
}

/// MIME type by extension. Matching is case-sensitive.
fn content_type_for(filename: &str) -> Option<&'static str> {
    if filename.ends_with(".docx") {
        Some(DOCX_MIME)
    } else if filename.ends_with(".pdf") {
        Some(PDF_MIME)
    } else {
        None
    }
}

/// `Content-Disposition` value keeping the original name as the download name.
///
/// The quoted `filename` is an ASCII approximation; `filename*` carries the
/// exact UTF-8 name.
fn attachment_disposition(filename: &str) -> String {
    let ascii: String = filename
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "attachment; filename=\"{ascii}\"; filename*=UTF-8''{}",
        urlencoding::encode(filename)
    )
}

/// Body stream that deletes its backing file once the body is finished or
/// dropped.
///
/// The artifact lock is held until the file is gone, so a same-named
/// conversion cannot write a new artifact that this body then deletes.
struct RemoveAfterSend<S> {
    inner: Option<S>,
    path: PathBuf,
    _artifact: ArtifactGuard,
}

impl<S> RemoveAfterSend<S> {
    fn new(inner: S, path: PathBuf, artifact: ArtifactGuard) -> Self {
        Self {
            inner: Some(inner),
            path,
            _artifact: artifact,
        }
    }
}

impl<S: Stream + Unpin> Stream for RemoveAfterSend<S> {
    type Item = S::Item;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.inner.as_mut() {
            Some(inner) => Pin::new(inner).poll_next(cx),
            None => Poll::Ready(None),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.as_ref().map_or((0, Some(0)), |s| s.size_hint())
    }
}

impl<S> Drop for RemoveAfterSend<S> {
    fn drop(&mut self) {
        // Close the file before unlinking it.
        self.inner.take();
        remove_sent(&self.path);
    }
}

fn remove_sent(path: &FsPath) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::info!(path = %path.display(), "deleted after sending"),
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "error deleting file"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use pdf2docx_core::ArtifactLocks;

    #[test]
    fn content_types() {
        assert_eq!(content_type_for("a.docx"), Some(DOCX_MIME));
        assert_eq!(content_type_for("a.pdf"), Some(PDF_MIME));
        assert_eq!(content_type_for("a.txt"), None);
        assert_eq!(content_type_for("a.DOCX"), None);
    }

    #[test]
    fn disposition_escapes_non_ascii_and_quotes() {
        assert_eq!(
            attachment_disposition("report.docx"),
            "attachment; filename=\"report.docx\"; filename*=UTF-8''report.docx"
        );
        assert_eq!(
            attachment_disposition("my \"big\" résumé.docx"),
            "attachment; filename=\"my _big_ r_sum_.docx\"; \
             filename*=UTF-8''my%20%22big%22%20r%C3%A9sum%C3%A9.docx"
        );
    }

    #[tokio::test]
    async fn dropping_the_stream_removes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sent.docx");
        std::fs::write(&path, b"payload").unwrap();

        let locks = ArtifactLocks::new();
        let file = tokio::fs::File::open(&path).await.unwrap();
        let stream = RemoveAfterSend::new(
            ReaderStream::new(file),
            path.clone(),
            locks.lock("sent.docx").await,
        );
        drop(stream);

        assert!(!path.exists());
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn artifact_stays_locked_while_streaming() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("busy.docx");
        std::fs::write(&path, b"payload").unwrap();

        let locks = ArtifactLocks::new();
        let file = tokio::fs::File::open(&path).await.unwrap();
        let stream = RemoveAfterSend::new(
            ReaderStream::new(file),
            path.clone(),
            locks.lock("busy.docx").await,
        );

        let waiting = tokio::time::timeout(Duration::from_millis(20), locks.lock("busy.docx")).await;
        assert!(waiting.is_err(), "a same-named writer must wait for the body");

        drop(stream);
        assert!(!path.exists());
        let _next = tokio::time::timeout(Duration::from_millis(200), locks.lock("busy.docx"))
            .await
            .expect("lock is released once the body is gone");
    }
}

use std::path::Path;

use thiserror::Error;

use crate::PageRange;
use crate::docx::DocxError;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to open PDF: {0}")]
    OpenError(String),
    #[error("failed to extract text: {0}")]
    ExtractionError(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ConverterError {
    #[error("failed to open PDF: {0}")]
    OpenError(String),
    #[error("failed to read page {page}: {message}")]
    PageError { page: usize, message: String },
    #[error("page range {start}..{end:?} selects no pages")]
    PageRange { start: usize, end: Option<usize> },
    #[error("no reconstructable content")]
    NoContent,
    #[error("failed to write document: {0}")]
    Write(#[from] DocxError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for PDF text extraction backends.
///
/// Extraction is best-effort: a page without a text layer yields an empty
/// string rather than an error.
pub trait PdfBackend: Send + Sync {
    /// Extract the text of every page, in page order.
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>, BackendError>;

    /// Extract the full text content of a PDF file, pages concatenated as-is.
    fn extract_text(&self, path: &Path) -> Result<String, BackendError> {
        Ok(self.extract_pages(path)?.concat())
    }
}

/// Trait for layout-reconstructing PDF to DOCX converters.
pub trait DocumentConverter: Send + Sync {
    /// Write an editable document for the pages in `range` of `source` to `dest`.
    fn convert(&self, source: &Path, dest: &Path, range: PageRange)
    -> Result<(), ConverterError>;
}

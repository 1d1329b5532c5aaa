//! Two-tier conversion: layout reconstruction first, plain text second.
//!
//! The primary attempt reports failure as a value. Any failure there routes
//! to the fallback branch and is only logged. Fallback errors are the ones
//! callers see.

use std::path::Path;

use thiserror::Error;

use crate::PageRange;
use crate::backend::{BackendError, ConverterError, DocumentConverter, PdfBackend};
use crate::docx::{self, DocxError};

/// Which path produced the artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionOutcome {
    /// Layout reconstruction succeeded.
    Converted,
    /// Reconstruction failed; the artifact holds the extracted text.
    TextExtracted,
}

impl ConversionOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            ConversionOutcome::Converted => "Conversion successful",
            ConversionOutcome::TextExtracted => "Text extracted successfully",
        }
    }
}

/// Why the primary path did not produce a usable artifact.
#[derive(Error, Debug)]
pub enum PrimaryFailure {
    #[error(transparent)]
    Converter(#[from] ConverterError),
    #[error("converted document is empty or missing")]
    EmptyOutput,
}

/// Terminal failure: both paths failed.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Text extraction failed: {0}")]
    Extraction(#[from] BackendError),
    #[error("Text extraction yielded no content.")]
    EmptyText,
    #[error("failed to write document: {0}")]
    Docx(#[from] DocxError),
}

/// Run the converter and check that it left a non-empty file at `dest`.
pub fn run_primary(
    converter: &dyn DocumentConverter,
    source: &Path,
    dest: &Path,
    range: PageRange,
) -> Result<(), PrimaryFailure> {
    converter.convert(source, dest, range)?;
    match std::fs::metadata(dest) {
        Ok(meta) if meta.is_file() && meta.len() > 0 => Ok(()),
        _ => Err(PrimaryFailure::EmptyOutput),
    }
}

/// Extract the text of the pages in `range` and wrap it in a
/// single-paragraph document.
///
/// A range that selects no text, including one past the last page, yields
/// [`ConvertError::EmptyText`].
pub fn run_fallback(
    backend: &dyn PdfBackend,
    source: &Path,
    dest: &Path,
    range: PageRange,
) -> Result<(), ConvertError> {
    let text: String = backend
        .extract_pages(source)?
        .into_iter()
        .enumerate()
        .filter(|(index, _)| range.contains(*index))
        .map(|(_, page)| page)
        .collect();
    if text.is_empty() {
        return Err(ConvertError::EmptyText);
    }
    docx::write_text_document(dest, &text)?;
    Ok(())
}

/// Convert `source` into a DOCX at `dest`, falling back to text extraction.
///
/// When both paths fail, any partial output at `dest` is removed.
pub fn convert_with_fallback(
    converter: &dyn DocumentConverter,
    backend: &dyn PdfBackend,
    source: &Path,
    dest: &Path,
    range: PageRange,
) -> Result<ConversionOutcome, ConvertError> {
    let failure = match run_primary(converter, source, dest, range) {
        Ok(()) => {
            tracing::info!(source = %source.display(), dest = %dest.display(), "converted");
            return Ok(ConversionOutcome::Converted);
        }
        Err(failure) => failure,
    };

    tracing::warn!(
        source = %source.display(),
        error = %failure,
        "layout conversion failed, falling back to text extraction"
    );

    match run_fallback(backend, source, dest, range) {
        Ok(()) => {
            tracing::info!(source = %source.display(), dest = %dest.display(), "text extracted");
            Ok(ConversionOutcome::TextExtracted)
        }
        Err(e) => {
            tracing::error!(source = %source.display(), error = %e, "text extraction failed");
            discard_partial(dest);
            Err(e)
        }
    }
}

fn discard_partial(dest: &Path) {
    match std::fs::remove_file(dest) {
        Ok(()) => tracing::debug!(path = %dest.display(), "removed partial output"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(path = %dest.display(), error = %e, "failed to remove partial output")
        }
    }
}

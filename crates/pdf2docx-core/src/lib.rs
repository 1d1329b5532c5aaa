use thiserror::Error;

pub mod backend;
pub mod config_file;
pub mod convert;
pub mod docx;
pub mod locks;
pub mod removal;
pub mod storage;

// Re-export for convenience
pub use backend::{BackendError, ConverterError, DocumentConverter, PdfBackend};
pub use config_file::Settings;
pub use convert::{ConversionOutcome, ConvertError, PrimaryFailure, convert_with_fallback};
pub use docx::{DocumentBuilder, DocxError};
pub use locks::{ArtifactGuard, ArtifactLocks};
pub use removal::RemovalScheduler;
pub use storage::{Storage, StorageError, UploadedFile};

/// Extension accepted on upload.
pub const PDF_EXTENSION: &str = ".pdf";

/// Extension given to converted artifacts.
pub const DOCX_EXTENSION: &str = ".docx";

/// Page selection handed to a [`DocumentConverter`].
///
/// `start` is 0-based and inclusive, `end` is exclusive. `end == None` runs to
/// the last page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageRange {
    pub start: usize,
    pub end: Option<usize>,
}

impl PageRange {
    /// The whole document.
    pub fn full() -> Self {
        Self::default()
    }

    /// Build a range, rejecting an `end` that does not lie after `start`.
    pub fn new(start: usize, end: Option<usize>) -> Result<Self, CoreError> {
        if let Some(end) = end {
            if end <= start {
                return Err(CoreError::InvalidPageRange { start, end });
            }
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && self.end.is_none_or(|end| index < end)
    }

    /// True once `index` lies beyond the end of the range.
    pub fn is_past(&self, index: usize) -> bool {
        self.end.is_some_and(|end| index >= end)
    }
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("invalid page range: start {start}, end {end}")]
    InvalidPageRange { start: usize, end: usize },
}

/// Whether `filename` carries the PDF extension (case-insensitive).
pub fn is_pdf_name(filename: &str) -> bool {
    filename.to_lowercase().ends_with(PDF_EXTENSION)
}

/// Artifact name for an uploaded PDF: the trailing `.pdf` (any case) becomes
/// `.docx`. Returns `None` for non-PDF names.
pub fn docx_file_name(upload_name: &str) -> Option<String> {
    if !is_pdf_name(upload_name) {
        return None;
    }
    // ".pdf" is ASCII, so the cut lands on a char boundary.
    let stem = &upload_name[..upload_name.len() - PDF_EXTENSION.len()];
    Some(format!("{stem}{DOCX_EXTENSION}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_names_are_case_insensitive() {
        assert!(is_pdf_name("report.pdf"));
        assert!(is_pdf_name("REPORT.PDF"));
        assert!(is_pdf_name("scan.Pdf"));
        assert!(!is_pdf_name("report.docx"));
        assert!(!is_pdf_name("report.pdf.txt"));
        assert!(!is_pdf_name("pdf"));
    }

    #[test]
    fn docx_name_replaces_only_trailing_extension() {
        assert_eq!(docx_file_name("a.pdf").as_deref(), Some("a.docx"));
        assert_eq!(docx_file_name("B.PDF").as_deref(), Some("B.docx"));
        assert_eq!(
            docx_file_name("notes.pdf.backup.pdf").as_deref(),
            Some("notes.pdf.backup.docx")
        );
        assert_eq!(docx_file_name("résumé.pdf").as_deref(), Some("résumé.docx"));
        assert!(docx_file_name("image.png").is_none());
    }

    #[test]
    fn page_range_bounds() {
        let full = PageRange::full();
        assert!(full.contains(0));
        assert!(full.contains(10_000));
        assert!(!full.is_past(10_000));

        let range = PageRange::new(2, Some(4)).unwrap();
        assert!(!range.contains(1));
        assert!(range.contains(2));
        assert!(range.contains(3));
        assert!(!range.contains(4));
        assert!(range.is_past(4));
    }

    #[test]
    fn page_range_rejects_empty_span() {
        assert!(PageRange::new(3, Some(3)).is_err());
        assert!(PageRange::new(5, Some(1)).is_err());
        assert!(PageRange::new(5, None).is_ok());
    }
}

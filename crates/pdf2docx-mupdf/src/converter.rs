use std::path::Path;

use mupdf::TextPageFlags;

use pdf2docx_core::{ConverterError, DocumentBuilder, DocumentConverter, PageRange};

use crate::{open_document, text_blocks};

/// Reconstructs a PDF as a DOCX from MuPDF's structured text.
///
/// Every text block becomes a paragraph and the lines inside it become line
/// breaks. Selected pages are separated by page breaks. A selection with no
/// text at all is reported as [`ConverterError::NoContent`] so callers can
/// fall back to plain extraction.
#[derive(Debug, Clone, Copy, Default)]
pub struct MupdfConverter;

impl MupdfConverter {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentConverter for MupdfConverter {
    fn convert(
        &self,
        source: &Path,
        dest: &Path,
        range: PageRange,
    ) -> Result<(), ConverterError> {
        let document = open_document(source).map_err(ConverterError::OpenError)?;

        let mut builder = DocumentBuilder::new();
        let mut pages_converted = 0usize;
        let mut has_text = false;

        let pages = document
            .pages()
            .map_err(|e| ConverterError::OpenError(e.to_string()))?;
        for (index, page_result) in pages.enumerate() {
            if range.is_past(index) {
                break;
            }
            if !range.contains(index) {
                continue;
            }

            let page_error = |e: mupdf::Error| ConverterError::PageError {
                page: index,
                message: e.to_string(),
            };
            let page = page_result.map_err(page_error)?;
            let text_page = page
                .to_text_page(TextPageFlags::empty())
                .map_err(page_error)?;

            if pages_converted > 0 {
                builder.add_page_break();
            }
            for lines in text_blocks(&text_page) {
                if lines.iter().all(|line| line.trim().is_empty()) {
                    continue;
                }
                builder.add_paragraph(&lines.join("\n"));
                has_text = true;
            }
            pages_converted += 1;
        }

        if pages_converted == 0 {
            return Err(ConverterError::PageRange {
                start: range.start,
                end: range.end,
            });
        }
        if !has_text {
            return Err(ConverterError::NoContent);
        }

        tracing::debug!(
            source = %source.display(),
            pages = pages_converted,
            paragraphs = builder.paragraph_count(),
            "reconstructed document"
        );
        builder.save(dest)?;
        Ok(())
    }
}

use std::path::Path;

use mupdf::{Document, TextPage, TextPageFlags};

use pdf2docx_core::{BackendError, PdfBackend};

mod converter;

pub use converter::MupdfConverter;

/// Plain-text extraction through MuPDF's structured text.
///
/// Every line on a page is emitted followed by `\n`; pages are returned
/// separately. Only this crate links the AGPL `mupdf` library.
#[derive(Debug, Clone, Copy, Default)]
pub struct MupdfBackend;

impl MupdfBackend {
    pub fn new() -> Self {
        Self
    }
}

impl PdfBackend for MupdfBackend {
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>, BackendError> {
        let document = open_document(path).map_err(BackendError::OpenError)?;

        let mut pages_text = Vec::new();
        for page_result in document
            .pages()
            .map_err(|e| BackendError::ExtractionError(e.to_string()))?
        {
            let page = page_result.map_err(|e| BackendError::ExtractionError(e.to_string()))?;
            let text_page = page
                .to_text_page(TextPageFlags::empty())
                .map_err(|e| BackendError::ExtractionError(e.to_string()))?;

            let mut page_text = String::new();
            for block in text_blocks(&text_page) {
                for line in block {
                    page_text.push_str(&line);
                    page_text.push('\n');
                }
            }
            pages_text.push(page_text);
        }

        tracing::debug!(path = %path.display(), pages = pages_text.len(), "extracted text");
        Ok(pages_text)
    }
}

pub(crate) fn open_document(path: &Path) -> Result<Document, String> {
    let path_str = path
        .to_str()
        .ok_or_else(|| "invalid path encoding".to_string())?;
    Document::open(path_str).map_err(|e| e.to_string())
}

/// Lines of every text block on a page, in reading order.
///
/// Image blocks carry no lines and come back empty.
pub(crate) fn text_blocks(text_page: &TextPage) -> Vec<Vec<String>> {
    text_page
        .blocks()
        .map(|block| {
            block
                .lines()
                .map(|line| {
                    line.chars()
                        .map(|c| c.char().unwrap_or('\u{FFFD}'))
                        .collect::<String>()
                })
                .collect()
        })
        .collect()
}

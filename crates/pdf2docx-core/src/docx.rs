//! Minimal DOCX writing and reading.
//!
//! Writing goes through `docx-rs`. Reading only recovers paragraph text from
//! `word/document.xml`, which is enough to inspect what a conversion produced.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use docx_rs::{BreakType, Docx, Paragraph, Run};
use quick_xml::Reader;
use quick_xml::events::Event;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to pack document: {0}")]
    Pack(String),
    #[error("failed to read document: {0}")]
    Read(String),
}

/// Accumulates paragraphs and writes them out as a DOCX package.
#[derive(Debug, Default)]
pub struct DocumentBuilder {
    paragraphs: Vec<Paragraph>,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one paragraph. `\n` becomes a line break inside the paragraph
    /// and `\t` a tab; characters XML cannot carry are dropped.
    pub fn add_paragraph(&mut self, text: &str) -> &mut Self {
        let mut run = Run::new();
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                run = run.add_break(BreakType::TextWrapping);
            }
            let line = line.strip_suffix('\r').unwrap_or(line);
            for (j, segment) in line.split('\t').enumerate() {
                if j > 0 {
                    run = run.add_tab();
                }
                if !segment.is_empty() {
                    run = run.add_text(xml_safe(segment));
                }
            }
        }
        self.paragraphs.push(Paragraph::new().add_run(run));
        self
    }

    /// Append a paragraph holding only a page break.
    pub fn add_page_break(&mut self) -> &mut Self {
        self.paragraphs
            .push(Paragraph::new().add_run(Run::new().add_break(BreakType::Page)));
        self
    }

    pub fn paragraph_count(&self) -> usize {
        self.paragraphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }

    /// Write the document to `path`, replacing any existing file.
    pub fn save(self, path: &Path) -> Result<(), DocxError> {
        let docx = self
            .paragraphs
            .into_iter()
            .fold(Docx::new(), |docx, p| docx.add_paragraph(p));
        let file = File::create(path)?;
        docx.build()
            .pack(file)
            .map_err(|e| DocxError::Pack(e.to_string()))
    }
}

/// Write a document whose only paragraph is `text`.
pub fn write_text_document(path: &Path, text: &str) -> Result<(), DocxError> {
    let mut builder = DocumentBuilder::new();
    builder.add_paragraph(text);
    builder.save(path)
}

/// Read back the text of every body paragraph.
///
/// Line breaks come back as `\n`, page breaks as `\u{c}` and tabs as `\t`.
pub fn paragraph_texts(path: &Path) -> Result<Vec<String>, DocxError> {
    let file = File::open(path)?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| DocxError::Read(e.to_string()))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| DocxError::Read(e.to_string()))?
        .read_to_string(&mut xml)?;

    let mut reader = Reader::from_str(&xml);
    let mut paragraphs: Vec<String> = Vec::new();
    let mut in_text = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| DocxError::Read(e.to_string()))?;
        match event {
            Event::Start(e) => match e.name().as_ref() {
                b"w:p" => paragraphs.push(String::new()),
                b"w:t" => in_text = true,
                _ => {}
            },
            Event::End(e) => {
                if e.name().as_ref() == b"w:t" {
                    in_text = false;
                }
            }
            Event::Empty(e) => match e.name().as_ref() {
                b"w:p" => paragraphs.push(String::new()),
                b"w:br" => {
                    let is_page = e
                        .try_get_attribute("w:type")
                        .ok()
                        .flatten()
                        .is_some_and(|a| a.value.as_ref() == b"page");
                    if let Some(current) = paragraphs.last_mut() {
                        current.push(if is_page { '\u{c}' } else { '\n' });
                    }
                }
                b"w:tab" => {
                    if let Some(current) = paragraphs.last_mut() {
                        current.push('\t');
                    }
                }
                _ => {}
            },
            Event::Text(t) if in_text => {
                let text = t.unescape().map_err(|e| DocxError::Read(e.to_string()))?;
                if let Some(current) = paragraphs.last_mut() {
                    current.push_str(&text);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}

/// Drop characters that are not allowed in XML 1.0 documents.
fn xml_safe(text: &str) -> String {
    text.chars()
        .filter(|&c| {
            matches!(c, '\t' | '\n' | '\r')
                || ('\u{20}'..='\u{D7FF}').contains(&c)
                || ('\u{E000}'..='\u{FFFD}').contains(&c)
                || c >= '\u{10000}'
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_paragraph_round_trip_keeps_breaks_and_tabs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.docx");
        let text = "Quarterly report\nRevenue:\t42\n\nEnd & <summary>";

        write_text_document(&path, text).unwrap();

        assert!(std::fs::metadata(&path).unwrap().len() > 0);
        let paragraphs = paragraph_texts(&path).unwrap();
        assert_eq!(paragraphs, vec![text.to_string()]);
    }

    #[test]
    fn page_breaks_are_separate_paragraphs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pages.docx");

        let mut builder = DocumentBuilder::new();
        builder
            .add_paragraph("page one")
            .add_page_break()
            .add_paragraph("page two");
        assert_eq!(builder.paragraph_count(), 3);
        builder.save(&path).unwrap();

        let paragraphs = paragraph_texts(&path).unwrap();
        assert_eq!(paragraphs, vec!["page one", "\u{c}", "page two"]);
    }

    #[test]
    fn control_characters_are_dropped() {
        assert_eq!(xml_safe("a\u{0}b\u{c}c"), "abc");
        assert_eq!(xml_safe("tab\there"), "tab\there");
    }

    #[test]
    fn reading_a_non_docx_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.docx");
        std::fs::write(&path, b"not a zip").unwrap();
        assert!(matches!(paragraph_texts(&path), Err(DocxError::Read(_))));
    }
}

use axum::extract::Multipart;

use pdf2docx_core::storage::upload_file_name;
use pdf2docx_core::{PageRange, is_pdf_name};

use crate::error::ApiError;

/// The raw `file` part of the form.
pub struct FilePart {
    /// `None` when the part carried no filename parameter.
    pub filename: Option<String>,
    pub data: Vec<u8>,
}

/// Parsed form fields from the multipart upload.
#[derive(Default)]
pub struct FormFields {
    pub file: Option<FilePart>,
    pub start_page: Option<String>,
    pub end_page: Option<String>,
}

/// A validated PDF upload, ready to be written to disk.
#[derive(Debug)]
pub struct PdfUpload {
    pub filename: String,
    pub data: Vec<u8>,
    pub range: PageRange,
}

/// Parse a multipart form upload into structured form fields.
pub async fn parse_multipart(mut multipart: Multipart) -> Result<FormFields, ApiError> {
    let mut fields = FormFields::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read form field: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                let filename = field.file_name().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read file data: {e}")))?
                    .to_vec();
                fields.file = Some(FilePart { filename, data });
            }
            "start_page" | "end_page" => {
                let val = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read {name}: {e}")))?;
                if name == "start_page" {
                    fields.start_page = Some(val);
                } else {
                    fields.end_page = Some(val);
                }
            }
            _ => {
                // Drain unknown fields
                field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read {name}: {e}")))?;
            }
        }
    }

    Ok(fields)
}

impl FormFields {
    /// Apply the upload rules: a `file` part with a non-empty `.pdf` name and
    /// an optional, well-formed page range.
    pub fn into_pdf_upload(self) -> Result<PdfUpload, ApiError> {
        let file = self
            .file
            .ok_or_else(|| ApiError::BadRequest("No file part".into()))?;
        let raw_name = file
            .filename
            .ok_or_else(|| ApiError::BadRequest("No file part".into()))?;
        if raw_name.is_empty() {
            return Err(ApiError::BadRequest("No selected file".into()));
        }
        if !is_pdf_name(&raw_name) {
            return Err(ApiError::BadRequest(
                "Invalid file type, only PDF is supported".into(),
            ));
        }
        let filename = upload_file_name(&raw_name)
            .ok_or_else(|| ApiError::BadRequest("Invalid file name".into()))?;

        let start = parse_page(self.start_page.as_deref())?.unwrap_or(0);
        let end = parse_page(self.end_page.as_deref())?;
        let range =
            PageRange::new(start, end).map_err(|_| ApiError::BadRequest("Invalid page range".into()))?;

        Ok(PdfUpload {
            filename,
            data: file.data,
            range,
        })
    }
}

fn parse_page(raw: Option<&str>) -> Result<Option<usize>, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(|_| ApiError::BadRequest("Invalid page range".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(filename: Option<&str>) -> FormFields {
        FormFields {
            file: Some(FilePart {
                filename: filename.map(str::to_string),
                data: b"%PDF-1.7".to_vec(),
            }),
            ..Default::default()
        }
    }

    fn rejection(fields: FormFields) -> String {
        fields.into_pdf_upload().unwrap_err().to_string()
    }

    #[test]
    fn missing_file_part() {
        assert_eq!(rejection(FormFields::default()), "No file part");
        assert_eq!(rejection(form(None)), "No file part");
    }

    #[test]
    fn empty_filename() {
        assert_eq!(rejection(form(Some(""))), "No selected file");
    }

    #[test]
    fn non_pdf_extension() {
        for name in ["notes.txt", "scan.png", "archive.pdf.zip", "pdf"] {
            assert_eq!(
                rejection(form(Some(name))),
                "Invalid file type, only PDF is supported",
                "{name}"
            );
        }
    }

    #[test]
    fn accepts_uppercase_extension_and_strips_directories() {
        let upload = form(Some("C:\\scans\\Invoice.PDF")).into_pdf_upload().unwrap();
        assert_eq!(upload.filename, "Invoice.PDF");
        assert_eq!(upload.range, PageRange::full());
        assert_eq!(upload.data, b"%PDF-1.7");
    }

    #[test]
    fn page_range_fields() {
        let mut fields = form(Some("a.pdf"));
        fields.start_page = Some("1".into());
        fields.end_page = Some("3".into());
        let upload = fields.into_pdf_upload().unwrap();
        assert_eq!(upload.range, PageRange::new(1, Some(3)).unwrap());

        let mut fields = form(Some("a.pdf"));
        fields.start_page = Some("".into());
        assert_eq!(fields.into_pdf_upload().unwrap().range, PageRange::full());

        let mut fields = form(Some("a.pdf"));
        fields.end_page = Some("0".into());
        assert_eq!(rejection(fields), "Invalid page range");

        let mut fields = form(Some("a.pdf"));
        fields.start_page = Some("first".into());
        assert_eq!(rejection(fields), "Invalid page range");
    }
}

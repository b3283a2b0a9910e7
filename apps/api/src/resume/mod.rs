//! Resume ingest: PDF text extraction for uploaded files.

pub mod handlers;

use crate::errors::AppError;

/// `%PDF` magic. Uploads without it are rejected before extraction.
const PDF_MAGIC: &[u8] = b"%PDF";

pub fn looks_like_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(PDF_MAGIC)
}

/// Extracts text from an in-memory PDF.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, AppError> {
    if !looks_like_pdf(bytes) {
        return Err(AppError::Validation(
            "Uploaded file is not a PDF".to_string(),
        ));
    }

    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| AppError::Validation(format!("Could not extract text from PDF: {e}")))?;

    let text = normalize_whitespace(&text);
    if text.is_empty() {
        return Err(AppError::Validation(
            "PDF contains no extractable text".to_string(),
        ));
    }
    Ok(text)
}

/// Collapses runs of blank lines and trailing spaces left behind by PDF
/// extraction.
pub fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0usize;

    for line in text.lines() {
        let trimmed = line.trim_end();
        if trimmed.trim().is_empty() {
            blank_run += 1;
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
            if blank_run > 0 {
                out.push('\n');
            }
        }
        blank_run = 0;
        out.push_str(trimmed);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_magic_detection() {
        assert!(looks_like_pdf(b"%PDF-1.7 rest of file"));
        assert!(!looks_like_pdf(b"PK\x03\x04 docx bytes"));
        assert!(!looks_like_pdf(b""));
    }

    #[test]
    fn test_non_pdf_rejected_before_extraction() {
        let err = extract_pdf_text(b"hello").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_normalize_collapses_blank_runs() {
        let raw = "Line one   \n\n\n\nLine two\n\n\nLine three";
        assert_eq!(
            normalize_whitespace(raw),
            "Line one\n\nLine two\n\nLine three"
        );
    }

    #[test]
    fn test_normalize_drops_leading_and_trailing_blanks() {
        let raw = "\n\nBody\n\n";
        assert_eq!(normalize_whitespace(raw), "Body");
    }
}

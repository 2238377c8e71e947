//! Per-page PDF text extraction.
//!
//! Thin wrapper over `pdf_extract` that returns one text block per page,
//! keeping the zero-based page numbering the rest of the pipeline stores.

use anyhow::{Context, Result};
use std::path::Path;

/// Extract text from a PDF, one entry per page (index = zero-based page).
/// Pages with no extractable text come back as empty strings; the caller
/// decides whether to skip them.
pub fn extract_pages(path: &Path) -> Result<Vec<String>> {
    pdf_extract::extract_text_by_pages(path)
        .with_context(|| format!("Failed to extract text from {}", path.display()))
}

/// True when the path looks like a PDF file (case-insensitive extension).
pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn pdf_extension_detection() {
        assert!(is_pdf(&PathBuf::from("data/patient_report_001.pdf")));
        assert!(is_pdf(&PathBuf::from("REPORT.PDF")));
        assert!(!is_pdf(&PathBuf::from("notes.txt")));
        assert!(!is_pdf(&PathBuf::from("pdf")));
    }

    #[test]
    fn invalid_pdf_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.pdf");
        std::fs::write(&path, b"not a pdf").unwrap();
        assert!(extract_pages(&path).is_err());
    }
}

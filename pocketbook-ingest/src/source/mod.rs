//! Statement text sources.
//!
//! Every strategy returns the whole document as one newline-delimited UTF-8
//! string, or an [`IngestError::Read`]. Reading never modifies the source file.

mod markdown;
mod ocr;
mod pdf_text;

pub use markdown::{RemoteMarkdownSource, EXTRACTION_PROMPT};
pub use ocr::OcrSource;
pub use pdf_text::PdfTextSource;

use pocketbook_core::ExtractionConfig;
use std::fs;
use std::path::Path;

use crate::error::IngestError;
use crate::types::ExtractionMethod;

pub trait StatementSource {
    fn extract_text(&self, path: &Path) -> Result<String, IngestError>;
}

/// Files that are already text (CSV exports) are read as-is whatever method is asked for.
pub fn is_plain_text(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref(),
        Some("csv" | "txt" | "md")
    )
}

fn read_plain_text(path: &Path) -> Result<String, IngestError> {
    let text = fs::read_to_string(path).map_err(|e| IngestError::read(path, e))?;
    normalize(path, text)
}

/// Shared output contract: `\n` line endings, and at least one non-blank character.
pub(crate) fn normalize(path: &Path, text: String) -> Result<String, IngestError> {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    if text.trim().is_empty() {
        return Err(IngestError::read(path, "no extractable text"));
    }
    Ok(text)
}

/// Build the source for a method.
pub fn source_for(method: ExtractionMethod, cfg: &ExtractionConfig) -> Box<dyn StatementSource> {
    match method {
        ExtractionMethod::PdfText => Box::new(PdfTextSource),
        ExtractionMethod::Ocr => Box::new(OcrSource::from_config(cfg)),
        ExtractionMethod::Markdown => Box::new(RemoteMarkdownSource::from_config(cfg)),
    }
}

/// Read a file with one strategy.
pub fn read_text(
    path: &Path,
    method: ExtractionMethod,
    cfg: &ExtractionConfig,
) -> Result<String, IngestError> {
    if !path.is_file() {
        return Err(IngestError::read(path, "file not found"));
    }
    if is_plain_text(path) {
        return read_plain_text(path);
    }
    source_for(method, cfg).extract_text(path)
}

/// Read a file, falling back to OCR when the remote service fails.
///
/// Returns the text and the method that actually produced it.
pub fn read_with_fallback(
    path: &Path,
    method: ExtractionMethod,
    cfg: &ExtractionConfig,
) -> Result<(String, ExtractionMethod), IngestError> {
    match read_text(path, method, cfg) {
        Ok(text) => Ok((text, method)),
        Err(e) if method == ExtractionMethod::Markdown && e.is_recoverable() => {
            log::warn!("{e}; retrying {} with OCR", path.display());
            let text = read_text(path, ExtractionMethod::Ocr, cfg)?;
            Ok((text, ExtractionMethod::Ocr))
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_is_read_error() {
        let cfg = ExtractionConfig::default();
        let err = read_text(Path::new("/no/such/statement.pdf"), ExtractionMethod::PdfText, &cfg)
            .unwrap_err();
        assert!(matches!(err, IngestError::Read { .. }));
    }

    #[test]
    fn test_plain_text_normalized() {
        let mut f = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write!(f, "Field Name,Field Value\r\nPeriod,x\r\n").unwrap();

        let cfg = ExtractionConfig::default();
        let text = read_text(f.path(), ExtractionMethod::Markdown, &cfg).unwrap();
        assert_eq!(text, "Field Name,Field Value\nPeriod,x\n");
    }

    #[test]
    fn test_remote_failure_falls_back_to_ocr() {
        let mut f = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        write!(f, "not really a pdf").unwrap();
        let cfg = ExtractionConfig {
            remote_api_key_env: "POCKETBOOK_TEST_UNSET_KEY".to_string(),
            ..ExtractionConfig::default()
        };

        // the remote read fails on the missing credential before any request is made
        let remote = read_text(f.path(), ExtractionMethod::Markdown, &cfg).unwrap_err();
        assert!(matches!(remote, IngestError::Remote(_)));

        // OCR cannot read the junk file either, so the error must come from OCR
        let err = read_with_fallback(f.path(), ExtractionMethod::Markdown, &cfg).unwrap_err();
        assert!(matches!(err, IngestError::Read { .. }), "got {err:?}");
    }

    #[test]
    fn test_empty_file_is_read_error() {
        let f = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        let cfg = ExtractionConfig::default();
        let err = read_text(f.path(), ExtractionMethod::Ocr, &cfg).unwrap_err();
        assert!(matches!(err, IngestError::Read { .. }));
    }
}

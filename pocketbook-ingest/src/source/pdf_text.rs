//! Text-layer extraction. Fast, but only works on PDFs with embedded text.

use std::fs;
use std::path::Path;

use super::{normalize, StatementSource};
use crate::error::IngestError;

pub struct PdfTextSource;

impl StatementSource for PdfTextSource {
    fn extract_text(&self, path: &Path) -> Result<String, IngestError> {
        let bytes = fs::read(path).map_err(|e| IngestError::read(path, e))?;
        let text = pdf_extract::extract_text_from_mem(&bytes)
            .map_err(|e| IngestError::read(path, format!("text layer: {e}")))?;
        normalize(path, text)
    }
}

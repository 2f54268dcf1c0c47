//! Rasterise-then-OCR extraction.
//!
//! Pages are rendered to PNG with `pdftoppm` (poppler-utils) at a fixed DPI and
//! each page is run through `tesseract`. Page texts are joined with newlines.
//! Image files skip the rasterise step.

use pocketbook_core::ExtractionConfig;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

use super::{normalize, StatementSource};
use crate::error::IngestError;

pub struct OcrSource {
    dpi: u32,
    language: String,
}

impl OcrSource {
    pub fn new(dpi: u32, language: impl Into<String>) -> Self {
        Self {
            dpi,
            language: language.into(),
        }
    }

    pub fn from_config(cfg: &ExtractionConfig) -> Self {
        Self::new(cfg.ocr_dpi, cfg.ocr_language.clone())
    }

    /// Render every page of a PDF into `out_dir`, returning the images in page order.
    fn rasterize(&self, pdf: &Path, out_dir: &Path) -> Result<Vec<PathBuf>, IngestError> {
        let pdftoppm = which::which("pdftoppm")
            .map_err(|_| IngestError::read(pdf, "pdftoppm not found (install poppler-utils)"))?;

        let output = Command::new(pdftoppm)
            .arg("-png")
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg(pdf)
            .arg(out_dir.join("page"))
            .output()
            .map_err(|e| IngestError::read(pdf, format!("running pdftoppm: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(IngestError::read(pdf, format!("pdftoppm failed: {}", stderr.trim())));
        }

        let mut pages: Vec<PathBuf> = std::fs::read_dir(out_dir)
            .map_err(|e| IngestError::read(pdf, e))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "png"))
            .collect();

        // pdftoppm zero-pads page numbers, so name order is page order
        pages.sort();

        if pages.is_empty() {
            return Err(IngestError::read(pdf, "no pages rendered"));
        }
        Ok(pages)
    }

    fn recognize(&self, image: &Path) -> Result<String, IngestError> {
        let tesseract = which::which("tesseract")
            .map_err(|_| IngestError::read(image, "tesseract not found"))?;

        let output = Command::new(tesseract)
            .arg(image)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .output()
            .map_err(|e| IngestError::read(image, format!("running tesseract: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(IngestError::read(image, format!("tesseract failed: {}", stderr.trim())));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn is_image(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref(),
        Some("png" | "jpg" | "jpeg" | "tif" | "tiff")
    )
}

impl StatementSource for OcrSource {
    fn extract_text(&self, path: &Path) -> Result<String, IngestError> {
        if is_image(path) {
            let text = self.recognize(path)?;
            return normalize(path, text);
        }

        let tmp = TempDir::new().map_err(|e| IngestError::read(path, e))?;
        let pages = self.rasterize(path, tmp.path())?;
        log::debug!("ocr: {} page(s) from {}", pages.len(), path.display());

        let mut fulltext = String::new();
        for page in &pages {
            fulltext.push_str(&self.recognize(page)?);
            fulltext.push('\n');
        }
        normalize(path, fulltext)
    }
}

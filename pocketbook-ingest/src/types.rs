use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How raw text is pulled out of a statement file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractionMethod {
    /// Embedded PDF text layer
    PdfText,
    /// Rasterise each page, then OCR
    Ocr,
    /// Remote document-to-markdown conversion
    Markdown,
}

impl ExtractionMethod {
    pub const ALL: [ExtractionMethod; 3] = [
        ExtractionMethod::PdfText,
        ExtractionMethod::Ocr,
        ExtractionMethod::Markdown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMethod::PdfText => "pdf-text",
            ExtractionMethod::Ocr => "ocr",
            ExtractionMethod::Markdown => "markdown",
        }
    }
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExtractionMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf-text" | "pdf" | "text" => Ok(ExtractionMethod::PdfText),
            "ocr" | "image-ocr" | "image ocr" => Ok(ExtractionMethod::Ocr),
            "markdown" | "llama-parse" | "remote" => Ok(ExtractionMethod::Markdown),
            other => Err(format!(
                "unknown extraction method '{other}' (expected pdf-text, ocr or markdown)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_names() {
        for m in ExtractionMethod::ALL {
            assert_eq!(m.as_str().parse::<ExtractionMethod>().unwrap(), m);
        }
        assert_eq!("image OCR".parse::<ExtractionMethod>().unwrap(), ExtractionMethod::Ocr);
        assert!("fax".parse::<ExtractionMethod>().is_err());
    }
}

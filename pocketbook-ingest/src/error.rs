//! Ingestion errors.
//!
//! `Read`, `StatementDateNotFound` and `ClassificationMiss` end processing of one
//! document. `LineParse` costs a single record and is logged by the caller.
//! `Remote` is recoverable: callers retry with OCR.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("cannot read {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("statement date not found in {institution} statement")]
    StatementDateNotFound { institution: &'static str },

    #[error("error reading line '{line}': {reason}")]
    LineParse { line: String, reason: String },

    #[error("unrecognized statement: no institution matched {path}")]
    ClassificationMiss { path: PathBuf },

    #[error("unknown institution '{0}' (expected SC, HSBC, OCBC, DBS, DBS-DEPOSITS or IBKR)")]
    UnknownInstitution(String),

    #[error("remote extraction failed: {0}")]
    Remote(String),

    #[error("invalid statement pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl IngestError {
    pub(crate) fn read(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        IngestError::Read {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn line(line: &str, reason: impl ToString) -> Self {
        IngestError::LineParse {
            line: line.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether a different extraction strategy might still succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(self, IngestError::Remote(_) | IngestError::LineParse { .. })
    }
}

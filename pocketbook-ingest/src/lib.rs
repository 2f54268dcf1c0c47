//! pocketbook-ingest: statement text extraction, institution grammars, parsing and classification.

pub mod classifier;
pub mod error;
pub mod grammar;
pub mod institution;
pub mod parsers;
pub mod source;
pub mod statement;
pub mod types;

pub use classifier::{Classifier, StatementUpload};
pub use error::IngestError;
pub use grammar::{adjust_year, parse_amount, resolve_year, AnchorRule, BalanceRule, LineGrammar, RunningBalanceGrammar};
pub use institution::{Institution, InstitutionProfile};
pub use parsers::StatementParser;
pub use source::{read_text, read_with_fallback, StatementSource};
pub use statement::Statement;
pub use types::ExtractionMethod;

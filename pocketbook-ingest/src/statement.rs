//! A single uploaded statement: raw text, anchor date, parsed records.

use chrono::{DateTime, Local, NaiveDate};
use pocketbook_core::{month_label, Category, ExtractionConfig, Record, StatementKind};
use std::path::{Path, PathBuf};

use crate::error::IngestError;
use crate::institution::Institution;
use crate::parsers::StatementParser;
use crate::source::read_with_fallback;
use crate::types::ExtractionMethod;

#[derive(Debug, Clone)]
pub struct Statement {
    path: PathBuf,
    method: ExtractionMethod,
    institution: Institution,
    text: String,
    parser: StatementParser,
    anchor: NaiveDate,
    records: Vec<Record>,
    last_update: DateTime<Local>,
}

impl Statement {
    /// Read `path` with `method` (falling back to OCR if the remote service
    /// fails), locate the anchor date and parse.
    pub fn read(
        path: &Path,
        method: ExtractionMethod,
        institution: Institution,
        cfg: &ExtractionConfig,
    ) -> Result<Self, IngestError> {
        let (text, used) = read_with_fallback(path, method, cfg)?;
        Self::from_text(path, used, institution, text)
    }

    /// Build a statement from already-extracted text.
    ///
    /// Fails with [`IngestError::StatementDateNotFound`] when the anchor marker is absent.
    pub fn from_text(
        path: impl Into<PathBuf>,
        method: ExtractionMethod,
        institution: Institution,
        text: String,
    ) -> Result<Self, IngestError> {
        let parser = institution.parser()?;
        let anchor = parser
            .statement_date(&text)
            .ok_or(IngestError::StatementDateNotFound {
                institution: institution.tag(),
            })?;

        let mut statement = Self {
            path: path.into(),
            method,
            institution,
            text,
            parser,
            anchor,
            records: Vec::new(),
            last_update: Local::now(),
        };
        statement.parse_statement();
        Ok(statement)
    }

    /// The anchor date printed on the document.
    pub fn statement_date(&self) -> NaiveDate {
        self.anchor
    }

    pub fn parse_line(&self, line: &str) -> Result<Option<Record>, IngestError> {
        self.parser.parse_line(self.method, line, self.anchor)
    }

    /// Re-run the single parse pass over the raw text, replacing the records.
    pub fn parse_statement(&mut self) {
        self.records = self.parser.parse_document(self.method, &self.text, self.anchor);
        log::info!(
            "{}: {} record(s) from {} via {}",
            self.institution,
            self.records.len(),
            self.path.display(),
            self.method
        );
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Replace the records with user-corrected ones.
    pub fn update_records(&mut self, records: Vec<Record>) {
        self.records = records;
        self.touch();
    }

    /// Set the category of the transaction at `index`. Out-of-range indices
    /// and balance records are ignored.
    pub fn set_category(&mut self, index: usize, category: Category) {
        if let Some(t) = self.records.get_mut(index).and_then(Record::as_transaction_mut) {
            t.category = Some(category);
            self.touch();
        }
    }

    /// Set the comment of the record at `index`. Out-of-range indices are ignored.
    pub fn set_comment(&mut self, index: usize, comment: impl Into<String>) {
        if let Some(r) = self.records.get_mut(index) {
            *r.comments_mut() = comment.into();
            self.touch();
        }
    }

    fn touch(&mut self) {
        self.last_update = Local::now();
    }

    pub fn last_update(&self) -> DateTime<Local> {
        self.last_update
    }

    pub fn method(&self) -> ExtractionMethod {
        self.method
    }

    pub fn institution(&self) -> Institution {
        self.institution
    }

    pub fn kind(&self) -> StatementKind {
        self.institution.kind()
    }

    /// Ledger file name for this statement's period, e.g. "JAN-2024.csv".
    pub fn ledger_name(&self) -> String {
        format!("{}.csv", month_label(self.anchor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const SC_TEXT: &str = "\
STANDARD CHARTERED BANK
JANE DOE
Statement Date: 15 Jan 2024
Transaction Posting
Date Date Description Amount
20 Dec 21 Dec SUPERMARKET Transaction Ref 100 52.30
02 Jan 03 Jan PAYMENT THANK YOU Transaction Ref 101 300.00 CR
31 Feb 01 Mar BROKEN ROW Transaction Ref 102 1.00
10 Jan 11 Jan BOOK SHOP Transaction Ref 103 == 19.90
Page 1 of 1
";

    fn sc() -> Statement {
        Statement::from_text("jan.pdf", ExtractionMethod::PdfText, Institution::StandardChartered, SC_TEXT.to_string())
            .unwrap()
    }

    #[test]
    fn test_parse_pass_skips_bad_lines() {
        let s = sc();
        assert_eq!(s.statement_date(), NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());

        let txns: Vec<_> = s.records().iter().filter_map(Record::as_transaction).collect();
        assert_eq!(txns.len(), 3);
        assert_eq!(txns[0].date, NaiveDate::from_ymd_opt(2023, 12, 20).unwrap());
        assert_eq!(txns[0].amount, dec!(-52.30));
        assert_eq!(txns[1].amount, dec!(300.00));
        assert_eq!(txns[2].description, "BOOK SHOP Transaction Ref 103");
        assert_eq!(s.ledger_name(), "JAN-2024.csv");
    }

    #[test]
    fn test_parse_line_results() {
        let s = sc();
        assert!(s.parse_line("Page 1 of 1").unwrap().is_none());
        assert!(matches!(
            s.parse_line("31 Feb 01 Mar BROKEN ROW Transaction Ref 102 1.00"),
            Err(IngestError::LineParse { .. })
        ));
    }

    #[test]
    fn test_missing_anchor_is_fatal() {
        let err = Statement::from_text(
            "x.pdf",
            ExtractionMethod::Ocr,
            Institution::Hsbc,
            "12DEC13DEC GRAB 18.40\n".to_string(),
        )
        .unwrap_err();
        assert!(matches!(err, IngestError::StatementDateNotFound { institution: "HSBC" }));
    }

    #[test]
    fn test_edits_bump_last_update() {
        let mut s = sc();
        let before = s.last_update();
        std::thread::sleep(std::time::Duration::from_millis(5));

        s.set_comment(0, "weekly shop");
        s.set_comment(99, "ignored");
        assert!(s.last_update() > before);
        assert_eq!(s.records()[0].as_transaction().unwrap().comments, "weekly shop");

        let kept = s.records()[..1].to_vec();
        s.update_records(kept);
        assert_eq!(s.records().len(), 1);
    }
}

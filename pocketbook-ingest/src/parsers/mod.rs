//! Per-institution statement parsers.

pub mod dbs;
pub mod dbs_deposits;
pub mod hsbc;
pub mod ibkr;
pub mod ocbc;
pub mod standard_chartered;

use chrono::NaiveDate;
use pocketbook_core::{BalanceRecord, Record};

use crate::error::IngestError;
use crate::grammar::{clean_line, AnchorRule, BalanceRule, LineGrammar, RunningBalanceGrammar};
use crate::types::ExtractionMethod;

/// How an institution's text is turned into records.
#[derive(Debug, Clone)]
pub enum StatementParser {
    /// Line-oriented transaction rows plus a dated header marker
    Lines { grammar: LineGrammar, anchor: AnchorRule },
    /// Bank-account rows signed by the running balance next to them
    RunningBalance {
        grammar: RunningBalanceGrammar,
        anchor: AnchorRule,
    },
    /// Captioned closing balances, one record per caption found
    BalanceText { anchor: AnchorRule, rules: Vec<BalanceRule> },
    /// Brokerage CSV export yielding one balance snapshot
    BrokerageCsv,
}

impl StatementParser {
    pub fn statement_date(&self, text: &str) -> Option<NaiveDate> {
        match self {
            StatementParser::Lines { anchor, .. }
            | StatementParser::RunningBalance { anchor, .. }
            | StatementParser::BalanceText { anchor, .. } => anchor.find(text),
            StatementParser::BrokerageCsv => ibkr::statement_date(text),
        }
    }

    /// Parse a single line. Only [`StatementParser::Lines`] rows stand on their
    /// own; every other variant needs the whole document and yields `None`.
    pub fn parse_line(
        &self,
        method: ExtractionMethod,
        line: &str,
        anchor: NaiveDate,
    ) -> Result<Option<Record>, IngestError> {
        match self {
            StatementParser::Lines { grammar, .. } => Ok(grammar
                .parse_line(method, &clean_line(line), anchor)?
                .map(Record::from)),
            StatementParser::RunningBalance { .. }
            | StatementParser::BalanceText { .. }
            | StatementParser::BrokerageCsv => Ok(None),
        }
    }

    /// One linear pass over the document. Bad lines are logged and skipped.
    pub fn parse_document(&self, method: ExtractionMethod, text: &str, anchor: NaiveDate) -> Vec<Record> {
        match self {
            StatementParser::Lines { .. } => {
                let mut out = Vec::new();
                for line in text.lines() {
                    match self.parse_line(method, line, anchor) {
                        Ok(Some(record)) => out.push(record),
                        Ok(None) => {}
                        Err(e) => log::warn!("{e}"),
                    }
                }
                out
            }
            StatementParser::RunningBalance { grammar, .. } => grammar
                .parse_document(method, text)
                .into_iter()
                .map(Record::from)
                .collect(),
            StatementParser::BalanceText { rules, .. } => rules
                .iter()
                .filter_map(|rule| match rule.find(text)? {
                    Ok(balance) => Some(Record::from(BalanceRecord::new(anchor, balance, rule.source()))),
                    Err(e) => {
                        log::warn!("{e}");
                        None
                    }
                })
                .collect(),
            StatementParser::BrokerageCsv => match ibkr::parse_balance(text, anchor) {
                Ok(balance) => balance.into_iter().map(Record::from).collect(),
                Err(e) => {
                    log::warn!("{e}");
                    Vec::new()
                }
            },
        }
    }
}

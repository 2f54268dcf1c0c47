//! The dispatch table: institution tag -> identifiers, grammar, anchor rule.

use pocketbook_core::{InstitutionConfig, StatementKind};
use std::fmt;

use crate::error::IngestError;
use crate::parsers::{dbs, dbs_deposits, hsbc, ibkr, ocbc, standard_chartered, StatementParser};

/// Closed set of supported institutions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Institution {
    StandardChartered,
    Hsbc,
    Ocbc,
    Dbs,
    DbsDeposits,
    InteractiveBrokers,
}

impl Institution {
    pub const ALL: [Institution; 6] = [
        Institution::StandardChartered,
        Institution::Hsbc,
        Institution::Ocbc,
        Institution::Dbs,
        Institution::DbsDeposits,
        Institution::InteractiveBrokers,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            Institution::StandardChartered => "SC",
            Institution::Hsbc => "HSBC",
            Institution::Ocbc => "OCBC",
            Institution::Dbs => "DBS",
            Institution::DbsDeposits => "DBS-DEPOSITS",
            Institution::InteractiveBrokers => ibkr::SOURCE_TAG,
        }
    }

    pub fn from_tag(tag: &str) -> Result<Self, IngestError> {
        Self::ALL
            .into_iter()
            .find(|i| i.tag().eq_ignore_ascii_case(tag.trim()))
            .ok_or_else(|| IngestError::UnknownInstitution(tag.to_string()))
    }

    pub fn kind(&self) -> StatementKind {
        match self {
            Institution::StandardChartered | Institution::Hsbc | Institution::Ocbc | Institution::Dbs => {
                StatementKind::Expense
            }
            Institution::DbsDeposits | Institution::InteractiveBrokers => StatementKind::Balance,
        }
    }

    /// Build this institution's parser.
    pub fn parser(&self) -> Result<StatementParser, IngestError> {
        Ok(match self {
            Institution::StandardChartered => StatementParser::Lines {
                grammar: standard_chartered::grammar()?,
                anchor: standard_chartered::anchor()?,
            },
            Institution::Hsbc => StatementParser::Lines {
                grammar: hsbc::grammar()?,
                anchor: hsbc::anchor()?,
            },
            Institution::Ocbc => StatementParser::Lines {
                grammar: ocbc::grammar()?,
                anchor: ocbc::anchor()?,
            },
            Institution::Dbs => StatementParser::RunningBalance {
                grammar: dbs::grammar()?,
                anchor: dbs::anchor()?,
            },
            Institution::DbsDeposits => StatementParser::BalanceText {
                anchor: dbs_deposits::anchor()?,
                rules: dbs_deposits::rules()?,
            },
            Institution::InteractiveBrokers => StatementParser::BrokerageCsv,
        })
    }
}

impl fmt::Display for Institution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A configured account: which institution, how to recognise its documents,
/// and where its ledger files live.
#[derive(Debug, Clone, PartialEq)]
pub struct InstitutionProfile {
    pub institution: Institution,
    pub identifiers: Vec<String>,
    pub tab: String,
    pub folder: String,
}

impl InstitutionProfile {
    pub fn from_config(cfg: &InstitutionConfig) -> Result<Self, IngestError> {
        Ok(Self {
            institution: Institution::from_tag(&cfg.institution)?,
            identifiers: cfg.identifiers.clone(),
            tab: cfg.tab.clone(),
            folder: cfg.folder().to_string(),
        })
    }

    /// Every identifier must appear in the text. A profile without identifiers never matches.
    pub fn matches(&self, text: &str) -> bool {
        !self.identifiers.is_empty() && self.identifiers.iter().all(|id| text.contains(id.as_str()))
    }
}

//! Record types produced by statement parsing and stored in the ledger

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An expense category name.
///
/// Membership in the configured category set is checked by
/// [`crate::Config::category`]; this type only carries the name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single line item from an expense-type statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    pub description: String,
    /// Negative = money out, positive = money in.
    pub amount: Decimal,
    pub category: Option<Category>,
    pub comments: String,
}

impl Transaction {
    pub fn new(date: NaiveDate, description: impl Into<String>, amount: Decimal) -> Self {
        Self {
            date,
            description: description.into(),
            amount,
            category: None,
            comments: String::new(),
        }
    }

    /// Returns true if this is an outgoing (negative) amount
    pub fn is_outgoing(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }
}

/// End-of-period balance snapshot for one account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceRecord {
    pub date: NaiveDate,
    pub balance: Decimal,
    /// Institution/account tag, e.g. "IBKR" or "DBS - FD"
    pub source: String,
    pub comments: String,
}

impl BalanceRecord {
    pub fn new(date: NaiveDate, balance: Decimal, source: impl Into<String>) -> Self {
        Self {
            date,
            balance,
            source: source.into(),
            comments: String::new(),
        }
    }
}

/// Whether a statement yields line items or a balance snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatementKind {
    Expense,
    Balance,
}

/// Either kind of parsed record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Record {
    Transaction(Transaction),
    Balance(BalanceRecord),
}

impl Record {
    pub fn date(&self) -> NaiveDate {
        match self {
            Record::Transaction(t) => t.date,
            Record::Balance(b) => b.date,
        }
    }

    pub fn kind(&self) -> StatementKind {
        match self {
            Record::Transaction(_) => StatementKind::Expense,
            Record::Balance(_) => StatementKind::Balance,
        }
    }

    pub fn as_transaction(&self) -> Option<&Transaction> {
        match self {
            Record::Transaction(t) => Some(t),
            Record::Balance(_) => None,
        }
    }

    pub fn as_transaction_mut(&mut self) -> Option<&mut Transaction> {
        match self {
            Record::Transaction(t) => Some(t),
            Record::Balance(_) => None,
        }
    }

    pub fn comments_mut(&mut self) -> &mut String {
        match self {
            Record::Transaction(t) => &mut t.comments,
            Record::Balance(b) => &mut b.comments,
        }
    }
}

impl From<Transaction> for Record {
    fn from(t: Transaction) -> Self {
        Record::Transaction(t)
    }
}

impl From<BalanceRecord> for Record {
    fn from(b: BalanceRecord) -> Self {
        Record::Balance(b)
    }
}

/// True when every outgoing transaction has been given a category.
/// Balance records never need one.
pub fn is_fully_classified(records: &[Record]) -> bool {
    records.iter().all(|r| match r {
        Record::Transaction(t) => !t.is_outgoing() || t.category.is_some(),
        Record::Balance(_) => true,
    })
}

//! Shared line grammar engine.
//!
//! An institution supplies one regex per extraction method with these named groups:
//!
//! - `date`: transaction day and month, e.g. `05 Mar` or `05MAR`
//! - `post`: posting date (optional, unused beyond matching)
//! - `desc`: description text
//! - `amount`: `1,234.56` with an optional `CR` suffix (the group itself may be optional)
//! - `credit`: an amount printed in parentheses, `(1,234.56)`; alternative to `amount`
//!
//! Stored amounts follow one convention: money out is negative, money in
//! (a `CR` suffix or parentheses) is positive.
//!
//! Rows carry no year. It is resolved against the statement anchor date with
//! [`resolve_year`].

use chrono::{Datelike, NaiveDate};
use pocketbook_core::Transaction;
use regex::Regex;
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::str::FromStr;

use crate::error::IngestError;
use crate::types::ExtractionMethod;

/// Year for a day/month pair printed on a statement dated `anchor`.
///
/// A month after the anchor month belongs to the previous year (a January
/// statement listing December purchases). Anything else shares the anchor's year.
pub fn resolve_year(month: u32, anchor: NaiveDate) -> i32 {
    if month > anchor.month() {
        anchor.year() - 1
    } else {
        anchor.year()
    }
}

/// Move `date` into the year chosen by [`resolve_year`].
/// `None` when the day does not exist in that year (29 Feb).
pub fn adjust_year(date: NaiveDate, anchor: NaiveDate) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(resolve_year(date.month(), anchor), date.month(), date.day())
}

/// Parse a yearless `05 Mar`, `05Mar` or `05/03` token into a placeholder date in leap year 2000.
pub fn parse_day_month(token: &str) -> Option<NaiveDate> {
    let token = collapse_whitespace(token);
    let with_year = format!("{token} 2000");
    ["%d%b %Y", "%d %b %Y", "%d/%m %Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&with_year, fmt).ok())
}

/// Unsigned magnitude of `1,234.56`.
pub fn parse_magnitude(raw: &str) -> Result<Decimal, String> {
    let raw = raw.trim();
    Decimal::from_str(&raw.replace(',', ""))
        .map(|d| d.abs())
        .map_err(|e| format!("bad amount '{raw}': {e}"))
}

/// Parse an amount field. A `CR` suffix marks money in and is stored positive;
/// anything else is a charge and stored negative.
pub fn parse_amount(raw: &str) -> Result<Decimal, String> {
    let raw = raw.trim();
    match raw.strip_suffix("CR") {
        Some(rest) => parse_magnitude(rest),
        None => parse_magnitude(raw).map(|m| -m),
    }
}

/// Strip OCR artefacts before matching.
pub fn clean_line(line: &str) -> String {
    line.replace('=', "")
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// One institution's transaction-row patterns, keyed by extraction method.
#[derive(Debug, Clone, Default)]
pub struct LineGrammar {
    patterns: HashMap<ExtractionMethod, Regex>,
}

impl LineGrammar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pattern(mut self, method: ExtractionMethod, pattern: &str) -> Result<Self, regex::Error> {
        self.patterns.insert(method, Regex::new(pattern)?);
        Ok(self)
    }

    pub fn pattern(&self, method: ExtractionMethod) -> Option<&Regex> {
        self.patterns.get(&method)
    }

    /// Match one line.
    ///
    /// `Ok(None)` for anything that is not a transaction row. A row that matches
    /// but carries an impossible date or amount is a [`IngestError::LineParse`].
    pub fn parse_line(
        &self,
        method: ExtractionMethod,
        line: &str,
        anchor: NaiveDate,
    ) -> Result<Option<Transaction>, IngestError> {
        let Some(re) = self.pattern(method) else {
            return Ok(None);
        };
        let Some(caps) = re.captures(line) else {
            return Ok(None);
        };

        let description = collapse_whitespace(caps.name("desc").map_or("", |m| m.as_str()));
        if description.is_empty() {
            return Ok(None);
        }

        let token = &caps["date"];
        let date = parse_day_month(token)
            .ok_or_else(|| IngestError::line(line, format!("unrecognised date '{token}'")))?;
        let date = adjust_year(date, anchor).ok_or_else(|| {
            IngestError::line(line, format!("'{token}' does not exist in {}", resolve_year(date.month(), anchor)))
        })?;

        let amount = match (caps.name("amount"), caps.name("credit")) {
            (Some(m), _) => parse_amount(m.as_str()),
            (None, Some(m)) => parse_magnitude(m.as_str()),
            (None, None) => Ok(Decimal::ZERO),
        }
        .map_err(|e| IngestError::line(line, e))?;

        Ok(Some(Transaction::new(date, description, amount)))
    }
}

/// Locates a statement's printed date. The pattern must have a `date` group.
#[derive(Debug, Clone)]
pub struct AnchorRule {
    pattern: Regex,
    format: &'static str,
}

impl AnchorRule {
    pub fn new(pattern: &str, format: &'static str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            format,
        })
    }

    /// First marker in `text` whose date parses.
    pub fn find(&self, text: &str) -> Option<NaiveDate> {
        self.pattern.captures_iter(text).find_map(|caps| {
            let raw = collapse_whitespace(caps.name("date")?.as_str());
            NaiveDate::parse_from_str(&raw, self.format).ok()
        })
    }
}

/// One bank-account row: full date, description, unsigned amount and the
/// running balance after it.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceRow {
    pub date: NaiveDate,
    pub description: String,
    pub magnitude: Decimal,
    pub balance: Decimal,
}

/// Rows whose direction is not printed. A row is a deposit when the running
/// balance rises and a withdrawal when it falls; the first row is compared with
/// the opening balance.
///
/// Row patterns need `date` (`dd/mm/yyyy`), `desc`, `amount` and `balance` groups.
/// The opening pattern needs an `amount` group.
#[derive(Debug, Clone)]
pub struct RunningBalanceGrammar {
    rows: HashMap<ExtractionMethod, Regex>,
    opening: Regex,
}

impl RunningBalanceGrammar {
    pub fn new(opening: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            rows: HashMap::new(),
            opening: Regex::new(opening)?,
        })
    }

    pub fn with_pattern(mut self, method: ExtractionMethod, pattern: &str) -> Result<Self, regex::Error> {
        self.rows.insert(method, Regex::new(pattern)?);
        Ok(self)
    }

    /// First opening-balance marker in the document.
    pub fn opening_balance(&self, text: &str) -> Option<Decimal> {
        let raw = self.opening.captures(text)?.name("amount")?.as_str().replace(',', "");
        Decimal::from_str(&raw).ok()
    }

    pub fn parse_row(&self, method: ExtractionMethod, line: &str) -> Result<Option<BalanceRow>, IngestError> {
        let Some(caps) = self.rows.get(&method).and_then(|re| re.captures(line)) else {
            return Ok(None);
        };
        let description = collapse_whitespace(caps.name("desc").map_or("", |m| m.as_str()));
        if description.is_empty() {
            return Ok(None);
        }

        let group = |name: &str| caps.name(name).map_or("", |m| m.as_str());
        let token = group("date");
        let date = NaiveDate::parse_from_str(token.trim(), "%d/%m/%Y")
            .map_err(|e| IngestError::line(line, format!("bad date '{token}': {e}")))?;
        let magnitude = parse_magnitude(group("amount")).map_err(|e| IngestError::line(line, e))?;
        let balance = Decimal::from_str(&group("balance").replace(',', ""))
            .map_err(|e| IngestError::line(line, format!("bad balance: {e}")))?;

        Ok(Some(BalanceRow {
            date,
            description,
            magnitude,
            balance,
        }))
    }

    /// Signed transactions in line order. Rows that cannot be read, and a
    /// first row with no opening balance to compare against, are logged and skipped.
    pub fn parse_document(&self, method: ExtractionMethod, text: &str) -> Vec<Transaction> {
        let mut previous = self.opening_balance(text);
        if previous.is_none() {
            log::warn!("no opening balance found; the first row's direction is unknown");
        }

        let mut out = Vec::new();
        for line in text.lines() {
            let line = clean_line(line);
            let row = match self.parse_row(method, &line) {
                Ok(Some(row)) => row,
                Ok(None) => continue,
                Err(e) => {
                    log::warn!("{e}");
                    continue;
                }
            };
            match previous {
                Some(prev) => out.push(Transaction::new(
                    row.date,
                    row.description,
                    signed_by_movement(row.magnitude, prev, row.balance),
                )),
                None => log::warn!("skipping '{}': no previous balance", line.trim()),
            }
            previous = Some(row.balance);
        }
        out
    }
}

/// Give `magnitude` the direction of the move from `before` to `after`.
/// An unchanged balance yields zero.
pub fn signed_by_movement(magnitude: Decimal, before: Decimal, after: Decimal) -> Decimal {
    match after.cmp(&before) {
        Ordering::Greater => magnitude,
        Ordering::Less => -magnitude,
        Ordering::Equal => Decimal::ZERO,
    }
}

/// A captioned figure printed once per document, e.g. a closing balance.
/// The pattern must have an `amount` group.
#[derive(Debug, Clone)]
pub struct BalanceRule {
    source: &'static str,
    pattern: Regex,
}

impl BalanceRule {
    pub fn new(source: &'static str, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            source,
            pattern: Regex::new(pattern)?,
        })
    }

    /// Source tag given to the balance record.
    pub fn source(&self) -> &'static str {
        self.source
    }

    /// `None` when the caption is absent.
    pub fn find(&self, text: &str) -> Option<Result<Decimal, IngestError>> {
        let caps = self.pattern.captures(text)?;
        let raw = caps.name("amount")?.as_str();
        Some(
            Decimal::from_str(&raw.replace(',', ""))
                .map_err(|e| IngestError::line(raw, format!("bad {} balance: {e}", self.source))),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_resolve_year_against_anchor() {
        let anchor = d(2024, 1, 15);
        assert_eq!(resolve_year(12, anchor), 2023);
        assert_eq!(resolve_year(1, anchor), 2024);

        let anchor = d(2024, 6, 30);
        for month in 1..=12 {
            let expected = if month > 6 { 2023 } else { 2024 };
            assert_eq!(resolve_year(month, anchor), expected, "month {month}");
        }
    }

    #[test]
    fn test_adjust_year_leap_day() {
        let feb29 = parse_day_month("29 Feb").unwrap();
        assert_eq!(adjust_year(feb29, d(2024, 3, 1)), Some(d(2024, 2, 29)));
        assert_eq!(adjust_year(feb29, d(2023, 3, 1)), None);
    }

    #[test]
    fn test_day_month_formats() {
        assert_eq!(parse_day_month("05 Mar"), Some(d(2000, 3, 5)));
        assert_eq!(parse_day_month("05Mar"), Some(d(2000, 3, 5)));
        assert_eq!(parse_day_month("5 MAR"), Some(d(2000, 3, 5)));
        assert_eq!(parse_day_month("05/03"), Some(d(2000, 3, 5)));
        assert_eq!(parse_day_month("31 Feb"), None);
    }

    #[test]
    fn test_charges_negative_credits_positive() {
        assert_eq!(parse_amount("4.50").unwrap(), dec!(-4.50));
        assert_eq!(parse_amount("1,234.56").unwrap(), dec!(-1234.56));
        assert_eq!(parse_amount("4.50CR").unwrap(), dec!(4.50));
        assert_eq!(parse_amount("1,234.56 CR").unwrap(), dec!(1234.56));
        assert!(parse_amount("four").is_err());
    }

    #[test]
    fn test_parenthesised_credit_group() {
        let g = LineGrammar::new()
            .with_pattern(
                ExtractionMethod::PdfText,
                r"^(?P<date>\d{2}/\d{2})\s+(?:\((?P<credit>[\d,]+\.\d{2})\)|(?P<amount>[\d,]+\.\d{2}))\s+(?P<desc>.+)$",
            )
            .unwrap();
        let refund = g
            .parse_line(ExtractionMethod::PdfText, "04/03 (12.00) REFUND", d(2024, 3, 20))
            .unwrap()
            .unwrap();
        assert_eq!(refund.amount, dec!(12.00));
        assert_eq!(refund.date, d(2024, 3, 4));

        let charge = g
            .parse_line(ExtractionMethod::PdfText, "04/03 12.00 LUNCH", d(2024, 3, 20))
            .unwrap()
            .unwrap();
        assert_eq!(charge.amount, dec!(-12.00));
    }

    #[test]
    fn test_grammar_optional_amount_defaults_to_zero() {
        let g = LineGrammar::new()
            .with_pattern(
                ExtractionMethod::Ocr,
                r"^(?P<date>\d{1,2}\s?[A-Za-z]{3})\s+(?P<desc>.+?)(?:\s+(?P<amount>[\d,]+\.\d{2}))?$",
            )
            .unwrap();
        let t = g
            .parse_line(ExtractionMethod::Ocr, "02 Mar PREVIOUS BALANCE", d(2024, 3, 20))
            .unwrap()
            .unwrap();
        assert_eq!(t.amount, Decimal::ZERO);
        assert_eq!(t.description, "PREVIOUS BALANCE");

        // no pattern registered for this method
        assert!(g
            .parse_line(ExtractionMethod::Markdown, "02 Mar X 1.00", d(2024, 3, 20))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_bad_date_is_line_error() {
        let g = LineGrammar::new()
            .with_pattern(ExtractionMethod::Ocr, r"^(?P<date>\d{1,2} [A-Za-z]{3}) (?P<desc>\S+) (?P<amount>\d+\.\d{2})")
            .unwrap();
        let err = g
            .parse_line(ExtractionMethod::Ocr, "31 Feb RENT 10.00", d(2024, 3, 1))
            .unwrap_err();
        match err {
            IngestError::LineParse { line, .. } => assert_eq!(line, "31 Feb RENT 10.00"),
            other => panic!("expected LineParse, got {other:?}"),
        }
    }

    #[test]
    fn test_anchor_rule() {
        let rule = AnchorRule::new(r"Statement Date\W*(?P<date>\d{1,2}\s+[A-Za-z]{3}\s+\d{4})", "%d %b %Y").unwrap();
        assert_eq!(rule.find("foo\nStatement Date: 15 Jan 2024\n"), Some(d(2024, 1, 15)));
        assert_eq!(rule.find("**Statement Date:** 15  JAN 2024"), Some(d(2024, 1, 15)));
        assert_eq!(rule.find("no marker here"), None);
    }

    #[test]
    fn test_direction_from_balance_movement() {
        assert_eq!(signed_by_movement(dec!(4.50), dec!(1000.00), dec!(995.50)), dec!(-4.50));
        assert_eq!(signed_by_movement(dec!(250.00), dec!(995.50), dec!(1245.50)), dec!(250.00));
        assert_eq!(signed_by_movement(dec!(1.00), dec!(10.00), dec!(10.00)), Decimal::ZERO);
    }

    #[test]
    fn test_balance_rule() {
        let rule = BalanceRule::new("FD", r"Fixed Deposit\s+Total: SGD Equivalent\s+(?P<amount>[\d,]+\.\d{2})").unwrap();
        let text = "Fixed Deposit\nTotal: SGD Equivalent 20,512.33\nAccount";
        assert_eq!(rule.find(text).unwrap().unwrap(), dec!(20512.33));
        assert_eq!(rule.source(), "FD");
        assert!(rule.find("Savings Account").is_none());
    }

    #[test]
    fn test_clean_line() {
        assert_eq!(clean_line("05 Mar == FOO"), "05 Mar  FOO");
    }
}

//! OCBC credit card statements.
//!
//! One date (`dd/mm`), then the amount, then the description. Credits are
//! printed in parentheses.
//!
//!   04/03 12.00 COFFEE SHOP SINGAPORE SGP
//!   06/03 (500.00) PAYMENT BY INTERNET

use crate::grammar::{AnchorRule, LineGrammar};
use crate::types::ExtractionMethod;

const WHITESPACE_ROW: &str = concat!(
    r"^\s*(?P<date>\d{2}/\d{2})\s+",
    r"(?:\(\s*(?P<credit>[\d,]+\.\d{2})\s*\)|(?P<amount>[\d,]+\.\d{2}))\s+",
    r"(?P<desc>.+?)\s*$"
);

const MARKDOWN_ROW: &str = concat!(
    r"^\s*\|?\s*(?P<date>\d{2}/\d{2})\s*\|\s*(?P<desc>[^|]*?)\s*\|",
    r"\s*(?:\(\s*(?P<credit>[\d,]+\.\d{2})\s*\)|(?P<amount>[\d,]+\.\d{2}))\s*\|?\s*$"
);

pub fn grammar() -> Result<LineGrammar, regex::Error> {
    LineGrammar::new()
        .with_pattern(ExtractionMethod::PdfText, WHITESPACE_ROW)?
        .with_pattern(ExtractionMethod::Ocr, WHITESPACE_ROW)?
        .with_pattern(ExtractionMethod::Markdown, MARKDOWN_ROW)
}

/// The due date printed under "TOTAL MINIMUM DUE", e.g. `25-03-2024`.
pub fn anchor() -> Result<AnchorRule, regex::Error> {
    AnchorRule::new(r"TOTAL MINIMUM DUE\s+(?P<date>\d{2}-\d{2}-\d{4})", "%d-%m-%Y")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn anchor_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 25).unwrap()
    }

    #[test]
    fn test_charge_and_parenthesised_credit() {
        let g = grammar().unwrap();
        let charge = g
            .parse_line(ExtractionMethod::PdfText, "28/12 12.00 COFFEE SHOP SINGAPORE SGP", anchor_date())
            .unwrap()
            .unwrap();
        assert_eq!(charge.amount, dec!(-12.00));
        assert_eq!(charge.date, NaiveDate::from_ymd_opt(2023, 12, 28).unwrap());

        let payment = g
            .parse_line(ExtractionMethod::Ocr, "06/01 (1,500.00) PAYMENT BY INTERNET", anchor_date())
            .unwrap()
            .unwrap();
        assert_eq!(payment.amount, dec!(1500.00));
        assert_eq!(payment.description, "PAYMENT BY INTERNET");
    }

    #[test]
    fn test_markdown_and_anchor() {
        let g = grammar().unwrap();
        let t = g
            .parse_line(ExtractionMethod::Markdown, "| 06/01 | PAYMENT BY INTERNET | (500.00) |", anchor_date())
            .unwrap()
            .unwrap();
        assert_eq!(t.amount, dec!(500.00));

        let a = anchor().unwrap();
        assert_eq!(a.find("TOTAL MINIMUM DUE\n25-01-2024\n"), Some(anchor_date()));
    }
}

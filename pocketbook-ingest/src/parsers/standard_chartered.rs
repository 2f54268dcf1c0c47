//! Standard Chartered credit card statements.
//!
//! Rows carry two dates, a description ending in a transaction reference, and
//! an amount. Plain amounts are purchases; `CR` marks payments and refunds.
//!
//!   05 Mar   06 Mar   COFFEE SHOP Transaction Ref 123   4.50
//!   | 05 Mar | 06 Mar | COFFEE SHOP Transaction Ref 123 | 4.50 |

use crate::grammar::{AnchorRule, LineGrammar};
use crate::types::ExtractionMethod;

const WHITESPACE_ROW: &str = concat!(
    r"^\s*(?P<date>\d{1,2}\s?[A-Za-z]{3})\s+",
    r"(?P<post>\d{1,2}\s?[A-Za-z]{3})\s+",
    r"(?P<desc>.+?Transaction Ref \d+)\s+",
    r"(?P<amount>[\d,]+\.\d{2}(?:\s*CR)?)"
);

const MARKDOWN_ROW: &str = concat!(
    r"^\s*\|?\s*(?P<date>\d{1,2}\s?[A-Za-z]{3})\s*\|",
    r"\s*(?P<post>\d{1,2}\s?[A-Za-z]{3})\s*\|",
    r"\s*(?P<desc>[^|]+?)\s*\|",
    r"\s*(?P<amount>[\d,]+\.\d{2}(?:\s*CR)?)\s*\|?"
);

pub fn grammar() -> Result<LineGrammar, regex::Error> {
    LineGrammar::new()
        .with_pattern(ExtractionMethod::PdfText, WHITESPACE_ROW)?
        .with_pattern(ExtractionMethod::Ocr, WHITESPACE_ROW)?
        .with_pattern(ExtractionMethod::Markdown, MARKDOWN_ROW)
}

/// "Statement Date: 15 Jan 2024"
pub fn anchor() -> Result<AnchorRule, regex::Error> {
    AnchorRule::new(
        r"Statement Date\W*(?P<date>\d{1,2}\s+[A-Za-z]{3}\s+\d{4})",
        "%d %b %Y",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn anchor_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 20).unwrap()
    }

    #[test]
    fn test_reference_row() {
        let g = grammar().unwrap();
        let t = g
            .parse_line(
                ExtractionMethod::Ocr,
                "05 Mar   06 Mar   COFFEE SHOP Transaction Ref 123   4.50",
                anchor_date(),
            )
            .unwrap()
            .unwrap();
        assert_eq!(t.date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(t.description, "COFFEE SHOP Transaction Ref 123");
        assert_eq!(t.amount, dec!(-4.50));
        assert!(t.category.is_none());
    }

    #[test]
    fn test_credit_row() {
        let g = grammar().unwrap();
        let t = g
            .parse_line(
                ExtractionMethod::PdfText,
                "28 Feb 01 Mar PAYMENT - THANK YOU Transaction Ref 99812 1,250.00 CR",
                anchor_date(),
            )
            .unwrap()
            .unwrap();
        assert_eq!(t.amount, dec!(1250.00));
        assert_eq!(t.date, NaiveDate::from_ymd_opt(2024, 2, 28).unwrap());
    }

    #[test]
    fn test_markdown_row() {
        let g = grammar().unwrap();
        let t = g
            .parse_line(
                ExtractionMethod::Markdown,
                "| 15 Dec | 16 Dec | AIRLINE TICKET Transaction Ref 77 | 812.10 |",
                NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            )
            .unwrap()
            .unwrap();
        assert_eq!(t.date, NaiveDate::from_ymd_opt(2023, 12, 15).unwrap());
        assert_eq!(t.amount, dec!(-812.10));
    }

    #[test]
    fn test_rows_without_reference_are_skipped() {
        let g = grammar().unwrap();
        for line in [
            "",
            "Statement Date: 20 Mar 2024",
            "05 Mar 06 Mar COFFEE SHOP 4.50",
            "| Transaction Date | Posting Date | Description | Amount |",
            "|---|---|---|---|",
        ] {
            assert!(g.parse_line(ExtractionMethod::Ocr, line, anchor_date()).unwrap().is_none());
            assert!(g.parse_line(ExtractionMethod::Markdown, line, anchor_date()).unwrap().is_none());
        }
    }

    #[test]
    fn test_anchor() {
        let a = anchor().unwrap();
        assert_eq!(
            a.find("STANDARD CHARTERED\nStatement Date : 20 Mar 2024\n"),
            Some(anchor_date())
        );
    }
}

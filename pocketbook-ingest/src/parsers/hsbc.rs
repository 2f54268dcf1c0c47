//! HSBC credit card statements.
//!
//! Two dates (often run together, `12DEC13DEC`), free-text description, and an
//! optional amount. Rows without an amount are recorded as zero. Purchases are
//! stored negative, `CR` rows positive.

use crate::grammar::{AnchorRule, LineGrammar};
use crate::types::ExtractionMethod;

const WHITESPACE_ROW: &str = concat!(
    r"^\s*(?P<date>\d{1,2}\s?[A-Za-z]{3})\s*",
    r"(?P<post>\d{1,2}\s?[A-Za-z]{3})\s*",
    r"(?P<desc>.+?)",
    r"(?:\s+(?P<amount>[\d,]+\.\d{2}(?:\s*CR)?))?\s*$"
);

const MARKDOWN_ROW: &str = concat!(
    r"^\s*\|?\s*(?P<date>\d{1,2}\s?[A-Za-z]{3})\s*\|",
    r"\s*(?P<post>\d{1,2}\s?[A-Za-z]{3})\s*\|",
    r"\s*(?P<desc>[^|]*?)\s*\|",
    r"\s*(?P<amount>[\d,]+\.\d{2}(?:\s*CR)?)?\s*\|?\s*$"
);

pub fn grammar() -> Result<LineGrammar, regex::Error> {
    LineGrammar::new()
        .with_pattern(ExtractionMethod::PdfText, WHITESPACE_ROW)?
        .with_pattern(ExtractionMethod::Ocr, WHITESPACE_ROW)?
        .with_pattern(ExtractionMethod::Markdown, MARKDOWN_ROW)
}

/// "Statement From 01 DEC 2023 to 31 DEC 2023": the closing date is the anchor.
pub fn anchor() -> Result<AnchorRule, regex::Error> {
    AnchorRule::new(
        concat!(
            r"(?i)Statement From\W*\d{1,2}\s+[A-Za-z]{3}\s+\d{4}\s+to\s+",
            r"(?P<date>\d{1,2}\s+[A-Za-z]{3}\s+\d{4})"
        ),
        "%d %b %Y",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn anchor_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
    }

    #[test]
    fn test_compact_dates_cross_year() {
        let g = grammar().unwrap();
        let t = g
            .parse_line(ExtractionMethod::Ocr, "12DEC13DEC GRAB RIDES SINGAPORE 18.40", anchor_date())
            .unwrap()
            .unwrap();
        assert_eq!(t.date, NaiveDate::from_ymd_opt(2023, 12, 12).unwrap());
        assert_eq!(t.description, "GRAB RIDES SINGAPORE");
        assert_eq!(t.amount, dec!(-18.40));
    }

    #[test]
    fn test_credit_and_missing_amount() {
        let g = grammar().unwrap();
        let credit = g
            .parse_line(ExtractionMethod::Ocr, "02 Jan 03 Jan PAYMENT RECEIVED 500.00CR", anchor_date())
            .unwrap()
            .unwrap();
        assert_eq!(credit.amount, dec!(500.00));
        assert_eq!(credit.date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());

        let bare = g
            .parse_line(ExtractionMethod::Ocr, "05 Jan 05 Jan PREVIOUS STATEMENT BALANCE", anchor_date())
            .unwrap()
            .unwrap();
        assert_eq!(bare.amount, Decimal::ZERO);
    }

    #[test]
    fn test_markdown_rows() {
        let g = grammar().unwrap();
        let t = g
            .parse_line(
                ExtractionMethod::Markdown,
                "| 28 Dec | 29 Dec | NTUC FAIRPRICE | 1,020.35 CR |",
                anchor_date(),
            )
            .unwrap()
            .unwrap();
        assert_eq!(t.amount, dec!(1020.35));
        assert_eq!(t.description, "NTUC FAIRPRICE");

        assert!(g
            .parse_line(ExtractionMethod::Markdown, "| Date | Post | Description | Amount |", anchor_date())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_anchor_takes_closing_date() {
        let a = anchor().unwrap();
        let text = "HSBC VISA\nStatement From 11 DEC 2023 to 10 JAN 2024\n";
        assert_eq!(a.find(text), Some(anchor_date()));
    }
}

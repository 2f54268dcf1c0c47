//! DBS / POSB bank account statements.
//!
//! Amounts are printed without a direction; the running balance next to each
//! row tells withdrawals from deposits.
//!
//!   Balance Brought Forward  SGD 1,000.00
//!   05/03/2024  NETS COFFEE SHOP  4.50  995.50
//!   | 05/03/2024 | NETS COFFEE SHOP | 4.50 | 995.50 |

use crate::grammar::{AnchorRule, RunningBalanceGrammar};
use crate::types::ExtractionMethod;

const WHITESPACE_ROW: &str = concat!(
    r"^\s*(?P<date>\d{2}/\d{2}/\d{4})\s+(?P<desc>.+?)\s+",
    r"(?P<amount>[\d,]+\.\d{2})\s+(?P<balance>-?[\d,]+\.\d{2})\s*$"
);

const MARKDOWN_ROW: &str = concat!(
    r"^\s*\|?\s*(?P<date>\d{2}/\d{2}/\d{4})\s*\|\s*(?P<desc>[^|]*?)\s*\|",
    r"\s*(?P<amount>[\d,]+\.\d{2})\s*\|\s*(?P<balance>-?[\d,]+\.\d{2})\s*\|?\s*$"
);

const OPENING: &str = r"(?i)Balance Brought Forward\W*(?:SGD\s*)?(?P<amount>-?[\d,]+\.\d{2})";

pub fn grammar() -> Result<RunningBalanceGrammar, regex::Error> {
    RunningBalanceGrammar::new(OPENING)?
        .with_pattern(ExtractionMethod::PdfText, WHITESPACE_ROW)?
        .with_pattern(ExtractionMethod::Ocr, WHITESPACE_ROW)?
        .with_pattern(ExtractionMethod::Markdown, MARKDOWN_ROW)
}

/// "Account Summary as at 31 Mar 2024"
pub fn anchor() -> Result<AnchorRule, regex::Error> {
    AnchorRule::new(r"(?i)as at\s+(?P<date>\d{1,2}\s+[A-Za-z]{3}\s+\d{4})", "%d %b %Y")
}

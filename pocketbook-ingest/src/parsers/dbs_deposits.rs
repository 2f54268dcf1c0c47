//! DBS fixed deposit and SRS account summaries.
//!
//! No transactions, just captioned closing figures. One statement may carry
//! either or both, and each becomes its own balance record.

use crate::grammar::{AnchorRule, BalanceRule};

pub fn anchor() -> Result<AnchorRule, regex::Error> {
    AnchorRule::new(
        r"Account Summary as at\s+(?P<date>\d{1,2}\s+[A-Za-z]{3}\s+\d{4})",
        "%d %b %Y",
    )
}

pub fn rules() -> Result<Vec<BalanceRule>, regex::Error> {
    Ok(vec![
        BalanceRule::new(
            "SRS",
            r"Supplementary Retirement Scheme Account\W*(?:SGD\s*)?(?P<amount>-?[\d,]+\.\d{2})",
        )?,
        BalanceRule::new(
            "FD",
            r"Fixed Deposit\s+Total:\s*SGD Equivalent\W*(?P<amount>-?[\d,]+\.\d{2})",
        )?,
    ])
}

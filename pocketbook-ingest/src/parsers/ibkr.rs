//! Interactive Brokers monthly MTM summary export (CSV).
//!
//! Only two fields matter: the statement `Period` and the `Ending Value`.
//!
//!   Statement,Header,Field Name,Field Value
//!   Statement,Data,Period,"January 1, 2024 - January 31, 2024"
//!   ...
//!   Net Asset Value,Header,Field Name,Field Value
//!   Net Asset Value,Data,Ending Value,12345.67

use chrono::NaiveDate;
use pocketbook_core::BalanceRecord;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::IngestError;

pub const SOURCE_TAG: &str = "IBKR";

/// Collect (field name, field value) pairs from every section that declares
/// `Field Name` / `Field Value` columns. Malformed rows are skipped.
fn fields(text: &str) -> Vec<(String, String)> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(false)
        .from_reader(text.as_bytes());

    let mut columns: Option<(usize, usize)> = None;
    let mut out = Vec::new();

    for record in rdr.records().filter_map(|r| r.ok()) {
        let name_idx = record.iter().position(|f| f.trim() == "Field Name");
        let value_idx = record.iter().position(|f| f.trim() == "Field Value");
        if let (Some(n), Some(v)) = (name_idx, value_idx) {
            columns = Some((n, v));
            continue;
        }

        let Some((n, v)) = columns else { continue };
        if let (Some(name), Some(value)) = (record.get(n), record.get(v)) {
            out.push((name.trim().to_string(), value.trim().to_string()));
        }
    }
    out
}

fn field<'a>(fields: &'a [(String, String)], name: &str) -> Option<&'a str> {
    fields
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, v)| v.as_str())
}

/// End of the `Period` range, e.g. "January 1, 2024 - January 31, 2024" -> 2024-01-31.
pub fn statement_date(text: &str) -> Option<NaiveDate> {
    let fields = fields(text);
    let period = field(&fields, "Period")?;
    let end = period.rsplit(" - ").next()?.trim();
    NaiveDate::parse_from_str(end, "%B %d, %Y").ok()
}

/// One balance snapshot dated at the end of the statement period.
pub fn parse_balance(text: &str, anchor: NaiveDate) -> Result<Option<BalanceRecord>, IngestError> {
    let fields = fields(text);
    let Some(raw) = field(&fields, "Ending Value") else {
        return Ok(None);
    };
    let balance = Decimal::from_str(&raw.replace(',', ""))
        .map_err(|e| IngestError::line(raw, format!("bad ending value: {e}")))?;
    Ok(Some(BalanceRecord::new(anchor, balance, SOURCE_TAG)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const EXPORT: &str = r#"Statement,Header,Field Name,Field Value
Statement,Data,BrokerName,Interactive Brokers LLC
Statement,Data,Title,MTM Summary
Statement,Data,Period,"January 1, 2024 - January 31, 2024"
Account Information,Header,Field Name,Field Value
Account Information,Data,Account,U1234567
Net Asset Value,Header,Field Name,Field Value
Net Asset Value,Data,Ending Value,"12,345.67"
"#;

    #[test]
    fn test_statement_date_is_period_end() {
        assert_eq!(statement_date(EXPORT), NaiveDate::from_ymd_opt(2024, 1, 31));
        assert_eq!(statement_date("a,b\n1,2\n"), None);
    }

    #[test]
    fn test_parse_balance() {
        let anchor = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let b = parse_balance(EXPORT, anchor).unwrap().unwrap();
        assert_eq!(b.balance, dec!(12345.67));
        assert_eq!(b.source, "IBKR");
        assert_eq!(b.date, anchor);
    }

    #[test]
    fn test_missing_ending_value() {
        let anchor = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let text = "Statement,Header,Field Name,Field Value\nStatement,Data,Period,x\n";
        assert!(parse_balance(text, anchor).unwrap().is_none());
    }
}

//! Cross-account views over a tab's ledger files.

use chrono::NaiveDate;
use pocketbook_core::{month_end, Config, Period};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::ledger::{parse_date, parse_decimal, read_raw_rows};

/// One row of the compiled table. Transaction rows carry an amount, balance rows a balance.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerRow {
    pub date: NaiveDate,
    pub description: String,
    pub amount: Option<Decimal>,
    pub category: Option<String>,
    pub comments: String,
    pub balance: Option<Decimal>,
    /// Sub-path of the ledger file relative to the tab directory, e.g. "HSBC"
    pub source: String,
}

/// Spend per category over one period.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTable {
    pub label: String,
    /// One entry per configured category except the pass-through one, in configured order
    pub columns: Vec<(String, Decimal)>,
}

impl CategoryTable {
    pub fn get(&self, category: &str) -> Option<Decimal> {
        self.columns
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, v)| *v)
    }

    pub fn total(&self) -> Decimal {
        self.columns.iter().map(|(_, v)| *v).sum()
    }
}

/// Last reported balance of one source within one calendar month.
#[derive(Debug, Clone, PartialEq)]
pub struct BalancePoint {
    /// Month end
    pub date: NaiveDate,
    pub balance: Decimal,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BalanceTable {
    /// Sorted by date, then source
    pub points: Vec<BalancePoint>,
}

/// Date-indexed, source-columned view of a [`BalanceTable`]. Cells are `None`
/// for months in which a source reported nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceGrid {
    pub sources: Vec<String>,
    pub rows: Vec<(NaiveDate, Vec<Option<Decimal>>)>,
}

impl BalanceGrid {
    /// Carry each source's last known balance into months without a report.
    pub fn forward_fill(&mut self) {
        let mut last: Vec<Option<Decimal>> = vec![None; self.sources.len()];
        for (_, cells) in &mut self.rows {
            for (cell, prev) in cells.iter_mut().zip(last.iter_mut()) {
                if let Some(v) = *cell {
                    *prev = Some(v);
                } else {
                    *cell = *prev;
                }
            }
        }
    }
}

impl BalanceTable {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Pivot into one row per month end between the first and last point.
    pub fn grid(&self) -> BalanceGrid {
        let sources: Vec<String> = self
            .points
            .iter()
            .map(|p| p.source.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut rows = Vec::new();
        let (Some(first), Some(last)) = (self.points.first(), self.points.last()) else {
            return BalanceGrid { sources, rows };
        };

        let mut month = first.date;
        while month <= last.date {
            let cells = sources
                .iter()
                .map(|s| {
                    self.points
                        .iter()
                        .find(|p| p.date == month && &p.source == s)
                        .map(|p| p.balance)
                })
                .collect();
            rows.push((month, cells));
            match month.succ_opt() {
                Some(next) => month = month_end(next),
                None => break,
            }
        }
        BalanceGrid { sources, rows }
    }
}

fn is_excluded(path: &Path, excluded: &[String]) -> bool {
    let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
    excluded.iter().any(|e| name.ends_with(e.as_str()))
}

fn source_tag(file: &Path, tab_dir: &Path) -> String {
    let sub = file
        .parent()
        .and_then(|p| p.strip_prefix(tab_dir).ok())
        .map(|p| {
            p.components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/")
        })
        .unwrap_or_default();
    if sub.is_empty() {
        file.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    } else {
        sub
    }
}

fn read_rows(file: &Path, tab_dir: &Path) -> anyhow::Result<Vec<LedgerRow>> {
    let fallback_source = source_tag(file, tab_dir);
    let mut out = Vec::new();
    for raw in read_raw_rows(file)? {
        let Some(date) = parse_date(&raw.date) else {
            log::warn!("skipping row with bad date '{}' in {}", raw.date, file.display());
            continue;
        };
        let (amount, balance) = match (
            parse_decimal(raw.amount.as_deref()),
            parse_decimal(raw.balance.as_deref()),
        ) {
            (Ok(a), Ok(b)) => (a, b),
            (Err(e), _) | (_, Err(e)) => {
                log::warn!("skipping row dated {date} in {}: {e:#}", file.display());
                continue;
            }
        };
        out.push(LedgerRow {
            date,
            description: raw.description.unwrap_or_default(),
            amount,
            category: raw.category.filter(|c| !c.trim().is_empty()),
            comments: raw.comments.unwrap_or_default(),
            balance,
            source: raw
                .source
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| fallback_source.clone()),
        });
    }
    Ok(out)
}

/// Every ledger row of `tab` dated within `period`, oldest first.
///
/// A missing or empty tab directory yields an empty table. Unreadable files and
/// rows with an unreadable date or number are logged and skipped.
pub fn compile_statements(config: &Config, tab: &str, period: Period) -> Vec<LedgerRow> {
    let Some(tab) = config.tab(tab) else {
        log::warn!("no tab named '{tab}'");
        return Vec::new();
    };
    let dir = config.tab_dir(tab);
    if !dir.is_dir() {
        log::warn!("the path {} does not exist", dir.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = WalkDir::new(&dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|e| e.eq_ignore_ascii_case("csv")))
        .filter(|p| !is_excluded(p, &config.excluded_files))
        .collect();
    files.sort();
    if files.is_empty() {
        log::info!("no ledger files under {}", dir.display());
        return Vec::new();
    }

    let mut rows = Vec::new();
    for file in &files {
        match read_rows(file, &dir) {
            Ok(r) => rows.extend(r),
            Err(e) => log::warn!("{e:#}"),
        }
    }
    rows.sort_by_key(|r| r.date);
    rows.retain(|r| period.contains(r.date));
    log::debug!("{} row(s) from {} file(s) in {}", rows.len(), files.len(), tab.name);
    rows
}

/// Positive spend per category. Categories without rows are reported as zero.
pub fn category_table(rows: &[LedgerRow], period: Period, config: &Config) -> CategoryTable {
    let columns = config
        .spend_categories()
        .map(|cat| {
            let spend: Decimal = rows
                .iter()
                .filter(|r| period.contains(r.date) && r.category.as_deref() == Some(cat))
                .filter_map(|r| r.amount)
                .map(|a| -a)
                .sum();
            (cat.to_string(), spend)
        })
        .collect();
    CategoryTable {
        label: period.label(),
        columns,
    }
}

/// Last balance per source per calendar month, keyed on the month end.
pub fn balance_table(rows: &[LedgerRow], period: Period) -> BalanceTable {
    let mut latest: BTreeMap<(NaiveDate, String), (NaiveDate, Decimal)> = BTreeMap::new();
    for row in rows.iter().filter(|r| period.contains(r.date)) {
        let Some(balance) = row.balance else { continue };
        let key = (month_end(row.date), row.source.clone());
        match latest.get(&key) {
            Some((seen, _)) if *seen > row.date => {}
            _ => {
                latest.insert(key, (row.date, balance));
            }
        }
    }

    BalanceTable {
        points: latest
            .into_iter()
            .map(|((date, source), (_, balance))| BalancePoint { date, balance, source })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, day).unwrap()
    }

    fn march() -> Period {
        Period::new(d(3, 1), d(3, 31))
    }

    fn spend(date: NaiveDate, amount: Decimal, category: &str) -> LedgerRow {
        LedgerRow {
            date,
            description: "x".to_string(),
            amount: Some(amount),
            category: Some(category.to_string()),
            comments: String::new(),
            balance: None,
            source: "HSBC".to_string(),
        }
    }

    fn balance(date: NaiveDate, amount: Decimal, source: &str) -> LedgerRow {
        LedgerRow {
            date,
            description: String::new(),
            amount: None,
            category: None,
            comments: String::new(),
            balance: Some(amount),
            source: source.to_string(),
        }
    }

    #[test]
    fn test_category_table_has_every_column() {
        let cfg = Config::example("/tmp/pb");
        let rows = vec![
            spend(d(3, 2), dec!(-10.00), "Dining"),
            spend(d(3, 9), dec!(-5.50), "Dining"),
            spend(d(3, 9), dec!(2.00), "Dining"),
            spend(d(3, 10), dec!(300.00), "Credit Card"),
            spend(d(4, 1), dec!(-99.00), "Dining"),
        ];
        let table = category_table(&rows, march(), &cfg);

        assert_eq!(table.label, "01 Mar 2024 to 31 Mar 2024");
        assert_eq!(table.columns.len(), cfg.categories.len() - 1);
        assert!(table.get("Credit Card").is_none());
        assert_eq!(table.get("Dining"), Some(dec!(13.50)));
        assert_eq!(table.get("Groceries"), Some(Decimal::ZERO));
        assert_eq!(table.total(), dec!(13.50));
    }

    #[test]
    fn test_last_balance_of_month_wins() {
        let rows = vec![balance(d(3, 5), dec!(1000), "DBS"), balance(d(3, 20), dec!(1200), "DBS")];
        let table = balance_table(&rows, march());
        assert_eq!(
            table.points,
            vec![BalancePoint {
                date: d(3, 31),
                balance: dec!(1200),
                source: "DBS".to_string()
            }]
        );
    }

    #[test]
    fn test_balance_grid_gaps_and_forward_fill() {
        let year = Period::new(d(1, 1), d(12, 31));
        let rows = vec![
            balance(d(1, 31), dec!(10), "IBKR"),
            balance(d(1, 15), dec!(500), "DBS"),
            balance(d(3, 31), dec!(12), "IBKR"),
            spend(d(2, 2), dec!(-1), "Dining"),
        ];
        let table = balance_table(&rows, year);
        assert_eq!(table.points.len(), 3);

        let mut grid = table.grid();
        assert_eq!(grid.sources, vec!["DBS", "IBKR"]);
        let months: Vec<_> = grid.rows.iter().map(|(m, _)| *m).collect();
        assert_eq!(months, vec![d(1, 31), d(2, 29), d(3, 31)]);
        assert_eq!(grid.rows[1].1, vec![None, None]);

        grid.forward_fill();
        assert_eq!(grid.rows[1].1, vec![Some(dec!(500)), Some(dec!(10))]);
        assert_eq!(grid.rows[2].1, vec![Some(dec!(500)), Some(dec!(12))]);
    }

    #[test]
    fn test_bad_amount_skips_only_its_row() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::example(dir.path());
        let file = dir.path().join("US/SC/MAR-2024.csv");
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        std::fs::write(
            &file,
            "Date,Description,Amount,Category,Comments\n\
             2024-03-05,COFFEE,-4.50,Dining,\n\
             2024-03-06,TYPO,4.5o,Dining,\n\
             2024-03-07,LUNCH,-12.00,Dining,\n",
        )
        .unwrap();

        let rows = compile_statements(&cfg, "US", march());
        let amounts: Vec<_> = rows.iter().map(|r| r.amount).collect();
        assert_eq!(amounts, vec![Some(dec!(-4.50)), Some(dec!(-12.00))]);
        assert_eq!(category_table(&rows, march(), &cfg).get("Dining"), Some(dec!(16.50)));
    }

    #[test]
    fn test_empty_tab_directory_compiles_to_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::example(dir.path());
        std::fs::create_dir_all(dir.path().join("US")).unwrap();
        assert!(compile_statements(&cfg, "US", march()).is_empty());
    }

    #[test]
    fn test_source_tag() {
        let tab = Path::new("/data/SG");
        assert_eq!(source_tag(Path::new("/data/SG/HSBC/FEB-2024.csv"), tab), "HSBC");
        assert_eq!(source_tag(Path::new("/data/SG/FD/SRS/JAN-2024.csv"), tab), "FD/SRS");
        assert_eq!(source_tag(Path::new("/data/SG/CPF.csv"), tab), "CPF");
    }
}

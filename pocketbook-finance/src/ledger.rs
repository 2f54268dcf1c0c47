//! Flat-file ledger store.
//!
//! Layout: `<data_root>/<tab tag>/<folder>/<name>.csv`, one file per
//! institution and period. The relative path is the key; saving never silently
//! replaces an existing file, and looking up an existing key hands back the
//! saved (possibly hand-corrected) records instead of re-parsing.

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use pocketbook_core::{BalanceRecord, Config, Record, StatementKind, Transaction};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use walkdir::WalkDir;

pub const EXPENSE_HEADER: [&str; 5] = ["Date", "Description", "Amount", "Category", "Comments"];
pub const BALANCE_HEADER: [&str; 3] = ["Date", "Balance", "Comments"];
/// Balance files covering several accounts name each row's source.
pub const MULTI_BALANCE_HEADER: [&str; 4] = ["Date", "Balance", "Source", "Comments"];

/// Where one statement period is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerKey {
    pub tab_tag: String,
    pub folder: String,
    /// File name including the `.csv` extension
    pub name: String,
}

impl LedgerKey {
    pub fn new(tab_tag: impl Into<String>, folder: impl Into<String>, name: impl Into<String>) -> Self {
        let mut name = name.into();
        if !name.ends_with(".csv") {
            name.push_str(".csv");
        }
        Self {
            tab_tag: tab_tag.into(),
            folder: folder.into(),
            name,
        }
    }

    /// Parse a hand-typed `FOLDER/NAME` key, e.g. "HSBC/FEB-2024".
    pub fn parse_manual(tab_tag: &str, input: &str) -> Result<Self> {
        let input = input.trim();
        match input.split('/').collect::<Vec<_>>().as_slice() {
            [folder, name] if !folder.trim().is_empty() && !name.trim().is_empty() => {
                Ok(Self::new(tab_tag, folder.trim(), name.trim()))
            }
            [_] => bail!("'{input}' needs one sub-directory, e.g. HSBC/FEB-2024"),
            _ => bail!("'{input}' may contain only one sub-directory"),
        }
    }

    /// `<folder>/<name>`, unique across the whole data root.
    pub fn short(&self) -> String {
        format!("{}/{}", self.folder, self.name)
    }

    pub fn relative_path(&self) -> PathBuf {
        PathBuf::from(&self.tab_tag).join(&self.folder).join(&self.name)
    }
}

/// Result of a key lookup. `Existing` is the duplicate-upload case.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Existing { path: PathBuf, records: Vec<Record> },
    Missing,
}

/// Key/value view over ledger storage, so the flat files can be replaced
/// without touching parsers or the aggregator.
pub trait RecordStore {
    fn lookup(&self, key: &LedgerKey) -> Result<Lookup>;

    /// Persist records under `key`. Refuses to replace an existing entry unless `overwrite`.
    fn save(&self, key: &LedgerKey, records: &[Record], overwrite: bool) -> Result<PathBuf>;
}

/// Directory tree node for listing the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub label: String,
    pub path: PathBuf,
    pub children: Vec<TreeNode>,
}

pub struct LedgerStore<'a> {
    config: &'a Config,
}

impl<'a> LedgerStore<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    pub fn root(&self) -> &Path {
        &self.config.data_root
    }

    pub fn path_for(&self, key: &LedgerKey) -> PathBuf {
        self.root().join(key.relative_path())
    }

    /// Every `.csv` file under the data root, sorted.
    pub fn list_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = WalkDir::new(self.root())
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| is_csv(p))
            .collect();
        files.sort();
        files
    }

    /// Nested directory listing of the data root.
    pub fn tree(&self) -> Result<Vec<TreeNode>> {
        if !self.root().is_dir() {
            bail!("the path {} does not exist", self.root().display());
        }
        subdirectories(self.root())
    }

    pub fn read(&self, path: &Path) -> Result<Vec<Record>> {
        read_records(path, self.config)
    }
}

impl RecordStore for LedgerStore<'_> {
    fn lookup(&self, key: &LedgerKey) -> Result<Lookup> {
        let exact = self.path_for(key);
        let path = if exact.is_file() {
            Some(exact)
        } else {
            // Same folder/name filed under another tab still counts.
            let suffix = PathBuf::from(&key.folder).join(&key.name);
            let matches: Vec<PathBuf> = self
                .list_files()
                .into_iter()
                .filter(|p| p.ends_with(&suffix))
                .collect();
            match matches.len() {
                0 => None,
                1 => matches.into_iter().next(),
                n => {
                    log::warn!("{n} ledger files match {}; not reusing any", key.short());
                    None
                }
            }
        };

        match path {
            Some(path) => {
                let records = self.read(&path)?;
                Ok(Lookup::Existing { path, records })
            }
            None => Ok(Lookup::Missing),
        }
    }

    fn save(&self, key: &LedgerKey, records: &[Record], overwrite: bool) -> Result<PathBuf> {
        let path = self.path_for(key);
        if path.exists() && !overwrite {
            bail!("a ledger file named {} already exists", key.short());
        }
        write_records(&path, records)?;
        log::info!("saved {} record(s) to {}", records.len(), path.display());
        Ok(path)
    }
}

fn is_csv(p: &Path) -> bool {
    p.extension().is_some_and(|e| e.eq_ignore_ascii_case("csv"))
}

fn subdirectories(dir: &Path) -> Result<Vec<TreeNode>> {
    let mut dirs: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("read {}", dir.display()))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    dirs.sort();

    dirs.into_iter()
        .map(|path| {
            Ok(TreeNode {
                label: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                children: subdirectories(&path)?,
                path,
            })
        })
        .collect()
}

/// Write records with the header matching their kind. An empty list gets the
/// expense header. Balances from more than one source get a `Source` column;
/// otherwise the folder name stands in for it.
pub fn write_records(path: &Path, records: &[Record]) -> Result<()> {
    let kind = records.first().map_or(StatementKind::Expense, Record::kind);
    if records.iter().any(|r| r.kind() != kind) {
        bail!("cannot mix transactions and balances in {}", path.display());
    }
    let sources: BTreeSet<&str> = records
        .iter()
        .filter_map(|r| match r {
            Record::Balance(b) => Some(b.source.as_str()),
            Record::Transaction(_) => None,
        })
        .collect();
    let with_source = sources.len() > 1;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let mut wtr = csv::Writer::from_path(path).with_context(|| format!("write {}", path.display()))?;

    match kind {
        StatementKind::Expense => wtr.write_record(EXPENSE_HEADER)?,
        StatementKind::Balance if with_source => wtr.write_record(MULTI_BALANCE_HEADER)?,
        StatementKind::Balance => wtr.write_record(BALANCE_HEADER)?,
    }
    for record in records {
        match record {
            Record::Transaction(t) => wtr.write_record([
                t.date.format("%Y-%m-%d").to_string(),
                t.description.clone(),
                t.amount.to_string(),
                t.category.as_ref().map(|c| c.to_string()).unwrap_or_default(),
                t.comments.clone(),
            ])?,
            Record::Balance(b) if with_source => wtr.write_record([
                b.date.format("%Y-%m-%d").to_string(),
                b.balance.to_string(),
                b.source.clone(),
                b.comments.clone(),
            ])?,
            Record::Balance(b) => wtr.write_record([
                b.date.format("%Y-%m-%d").to_string(),
                b.balance.to_string(),
                b.comments.clone(),
            ])?,
        }
    }
    wtr.flush()?;
    Ok(())
}

/// Loosely-typed ledger row. Files written by hand or by older versions may
/// carry extra or missing columns.
#[derive(Debug, Deserialize)]
pub(crate) struct RawRow {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Description", default)]
    pub description: Option<String>,
    #[serde(rename = "Amount", default)]
    pub amount: Option<String>,
    #[serde(rename = "Category", default)]
    pub category: Option<String>,
    #[serde(rename = "Comments", default)]
    pub comments: Option<String>,
    #[serde(rename = "Balance", default)]
    pub balance: Option<String>,
    #[serde(rename = "Source", default)]
    pub source: Option<String>,
}

/// Accepts `2024-03-05` and `2024-03-05 00:00:00`.
pub(crate) fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").ok().map(|dt| dt.date()))
}

pub(crate) fn parse_decimal(raw: Option<&str>) -> Result<Option<Decimal>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => Ok(Some(
            Decimal::from_str(&s.replace(',', "")).with_context(|| format!("bad number '{s}'"))?,
        )),
        None => Ok(None),
    }
}

pub(crate) fn read_raw_rows(path: &Path) -> Result<Vec<RawRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let mut rows = Vec::new();
    for row in rdr.deserialize() {
        rows.push(row.with_context(|| format!("reading {}", path.display()))?);
    }
    Ok(rows)
}

fn folder_name(path: &Path) -> String {
    path.parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Read a ledger file back into records. Rows with an unreadable date or
/// number are skipped and categories outside the configured set are dropped,
/// each with a warning.
pub fn read_records(path: &Path, config: &Config) -> Result<Vec<Record>> {
    let mut out = Vec::new();
    for row in read_raw_rows(path)? {
        let Some(date) = parse_date(&row.date) else {
            log::warn!("skipping row with bad date '{}' in {}", row.date, path.display());
            continue;
        };
        let (amount, balance) = match (
            parse_decimal(row.amount.as_deref()),
            parse_decimal(row.balance.as_deref()),
        ) {
            (Ok(a), Ok(b)) => (a, b),
            (Err(e), _) | (_, Err(e)) => {
                log::warn!("skipping row dated {date} in {}: {e:#}", path.display());
                continue;
            }
        };
        let comments = row.comments.unwrap_or_default();

        if let Some(amount) = amount {
            let mut t = Transaction::new(date, row.description.unwrap_or_default(), amount);
            t.comments = comments;
            t.category = match row.category.as_deref().map(str::trim) {
                Some("") | None => None,
                Some(name) => match config.category(name) {
                    Ok(c) => Some(c),
                    Err(e) => {
                        log::warn!("{e} ({})", path.display());
                        None
                    }
                },
            };
            out.push(t.into());
        } else if let Some(balance) = balance {
            let source = row
                .source
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| folder_name(path));
            let mut b = BalanceRecord::new(date, balance, source);
            b.comments = comments;
            out.push(b.into());
        }
    }
    Ok(out)
}

//! Upload flow: classify a document, reuse its saved ledger file if one
//! exists, otherwise extract and parse it.

use anyhow::{anyhow, Context, Result};
use pocketbook_core::{month_label, Config, Record};
use pocketbook_ingest::{Classifier, ExtractionMethod, Statement, StatementUpload};
use std::path::{Path, PathBuf};

use crate::ledger::{LedgerKey, Lookup, RecordStore};

#[derive(Debug)]
pub enum ImportOutcome {
    /// The period was already in the ledger; its saved records are returned as-is.
    Reused {
        key: LedgerKey,
        path: PathBuf,
        records: Vec<Record>,
    },
    /// Freshly parsed and not yet saved.
    Parsed { key: LedgerKey, statement: Statement },
}

impl ImportOutcome {
    pub fn key(&self) -> &LedgerKey {
        match self {
            ImportOutcome::Reused { key, .. } | ImportOutcome::Parsed { key, .. } => key,
        }
    }

    pub fn records(&self) -> &[Record] {
        match self {
            ImportOutcome::Reused { records, .. } => records,
            ImportOutcome::Parsed { statement, .. } => statement.records(),
        }
    }
}

fn ledger_key(config: &Config, upload: &StatementUpload, name: String) -> Result<LedgerKey> {
    let tab = config
        .tab(&upload.profile.tab)
        .ok_or_else(|| anyhow!("institution {} points at unknown tab '{}'", upload.profile.institution, upload.profile.tab))?;
    Ok(LedgerKey::new(&tab.tag, &upload.profile.folder, name))
}

fn reuse(store: &impl RecordStore, key: &LedgerKey) -> Result<Option<ImportOutcome>> {
    match store.lookup(key)? {
        Lookup::Existing { path, records } => {
            log::info!("{} already in the ledger; using saved records", key.short());
            Ok(Some(ImportOutcome::Reused {
                key: key.clone(),
                path,
                records,
            }))
        }
        Lookup::Missing => Ok(None),
    }
}

/// Turn an identified upload into records, checking the ledger before and after parsing.
pub fn import_upload(
    config: &Config,
    store: &impl RecordStore,
    upload: &StatementUpload,
) -> Result<ImportOutcome> {
    if let Some(anchor) = upload.anchor_hint {
        let key = ledger_key(config, upload, format!("{}.csv", month_label(anchor)))?;
        if let Some(found) = reuse(store, &key)? {
            return Ok(found);
        }
    }

    let statement = upload
        .read(&config.extraction)
        .with_context(|| format!("parse {}", upload.path.display()))?;
    let key = ledger_key(config, upload, statement.ledger_name())?;
    if let Some(found) = reuse(store, &key)? {
        return Ok(found);
    }
    Ok(ImportOutcome::Parsed { key, statement })
}

/// Classify `path` and import it.
pub fn import_statement(
    config: &Config,
    classifier: &Classifier,
    store: &impl RecordStore,
    path: &Path,
    method: ExtractionMethod,
) -> Result<ImportOutcome> {
    let upload = classifier
        .classify(path, method, &config.extraction)
        .with_context(|| format!("classify {}", path.display()))?;
    import_upload(config, store, &upload)
}

/// Persist a freshly parsed statement. Reused outcomes are already saved and are left alone.
pub fn save_outcome(store: &impl RecordStore, outcome: &ImportOutcome) -> Result<Option<PathBuf>> {
    match outcome {
        ImportOutcome::Parsed { key, statement } => Ok(Some(store.save(key, statement.records(), false)?)),
        ImportOutcome::Reused { .. } => Ok(None),
    }
}

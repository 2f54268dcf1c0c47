use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use pocketbook_core::{is_fully_classified, Config, Period};
use pocketbook_finance::{
    balance_table, category_table, compile_statements, import_statement, save_outcome, ImportOutcome,
    LedgerKey, LedgerStore, RecordStore,
};
use pocketbook_ingest::{Classifier, ExtractionMethod};
use std::path::PathBuf;

mod config;
mod report;
mod state;

#[derive(Parser, Debug)]
#[command(name = "pocketbook", version, about = "Statement ingestion and spend summaries")]
struct Cli {
    /// Config file (default: ~/.pocketbook/config.toml)
    #[arg(long, global = true, env = "POCKETBOOK_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a starter config and data directory
    InitConfig,

    /// Validate the config and print what it declares
    Check,

    /// Identify a statement, parse it, and optionally file it in the ledger
    Ingest {
        file: PathBuf,

        /// pdf-text, ocr or markdown
        #[arg(long, default_value = "pdf-text")]
        method: ExtractionMethod,

        /// Write parsed records to the ledger
        #[arg(long)]
        save: bool,

        /// File under a hand-picked FOLDER/NAME instead of the derived key
        #[arg(long, requires = "save")]
        key: Option<String>,

        /// Replace an existing ledger file with the same key
        #[arg(long, requires = "key")]
        overwrite: bool,
    },

    /// Spend by category and month-end balances for one tab
    Summary {
        /// Tab name or tag
        #[arg(long)]
        tab: String,

        #[arg(long)]
        from: NaiveDate,

        #[arg(long)]
        to: NaiveDate,
    },

    /// List the ledger directories
    Tree,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn,pocketbook=info"))
        .init();

    let cli = Cli::parse();
    let config_path = config::config_path(cli.config.as_deref())?;

    match cli.command {
        Command::InitConfig => {
            config::init_config(cli.config.as_deref())?;
        }

        Command::Check => {
            let cfg = config::load_config(&config_path)?;
            check(&cfg);
            println!("\nConfig OK: {}", config_path.display());
        }

        Command::Ingest {
            file,
            method,
            save,
            key,
            overwrite,
        } => {
            let cfg = config::load_config(&config_path)?;
            ingest(&cfg, file, method, save, key, overwrite)?;
        }

        Command::Summary { tab, from, to } => {
            let cfg = config::load_config(&config_path)?;
            summary(&cfg, &tab, Period::new(from, to))?;
        }

        Command::Tree => {
            let cfg = config::load_config(&config_path)?;
            println!("{}/", cfg.data_root.display());
            report::print_tree(&LedgerStore::new(&cfg).tree()?, 1);
        }
    }

    Ok(())
}

fn check(cfg: &Config) {
    println!(
        "pocketbook {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("POCKETBOOK_BUILD_SHA")
    );
    println!("Data root: {}\n", cfg.data_root.display());

    println!("Tabs:");
    for tab in &cfg.tabs {
        let rate = cfg.currencies.get(&tab.currency).copied().unwrap_or_default();
        println!("  {} [{}] {} (rate {rate})", tab.name, tab.tag, tab.currency);
    }

    println!("Categories:");
    for c in &cfg.categories {
        let note = if *c == cfg.pass_through_category { " (not counted as spend)" } else { "" };
        println!("  {c}{note}");
    }

    println!("Institutions (in match order):");
    for inst in &cfg.institutions {
        println!(
            "  {} -> {}/{} identifiers={:?}",
            inst.institution,
            inst.tab,
            inst.folder(),
            inst.identifiers
        );
    }
}

fn ingest(
    cfg: &Config,
    file: PathBuf,
    method: ExtractionMethod,
    save: bool,
    key: Option<String>,
    overwrite: bool,
) -> Result<()> {
    if !file.exists() {
        bail!("file not found: {}", file.display());
    }
    let classifier = Classifier::from_config(cfg).context("build classifier")?;
    let store = LedgerStore::new(cfg);

    let outcome = import_statement(cfg, &classifier, &store, &file, method)?;
    println!("{} -> {}", file.display(), outcome.key().short());
    match &outcome {
        ImportOutcome::Parsed { statement, .. } => println!(
            "{} statement dated {} read via {}\n",
            statement.institution(),
            statement.statement_date(),
            statement.method()
        ),
        ImportOutcome::Reused { path, .. } => println!("saved records from {}\n", path.display()),
    }
    report::print_records(outcome.records());

    if !is_fully_classified(outcome.records()) {
        println!("\nSome outgoing transactions have no category yet.");
    }

    if !save {
        return Ok(());
    }
    let saved = match key {
        Some(manual) => {
            let key = LedgerKey::parse_manual(&outcome.key().tab_tag, &manual)?;
            Some(store.save(&key, outcome.records(), overwrite)?)
        }
        None => save_outcome(&store, &outcome)?,
    };
    match saved {
        Some(p) => println!("\nSaved {}", p.display()),
        None => println!("\nAlready in the ledger; nothing written."),
    }
    Ok(())
}

fn summary(cfg: &Config, tab_name: &str, period: Period) -> Result<()> {
    let tab = cfg
        .tab(tab_name)
        .with_context(|| format!("no tab named '{tab_name}'"))?;

    let rows = compile_statements(cfg, tab_name, period);
    println!("# {} ({} rows)\n", tab.name, rows.len());

    let categories = category_table(&rows, period, cfg);
    let base_total = cfg.to_base(categories.total(), &tab.currency);
    report::print_category_table(&categories, tab, base_total);

    println!();
    report::print_balance_table(&balance_table(&rows, period));
    Ok(())
}

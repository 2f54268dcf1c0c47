//! Process-wide configuration: category list, tabs, currency table, institutions.
//!
//! Built once at startup and handed to every component by reference. Nothing in
//! here changes at runtime.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::records::Category;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root of the ledger tree; holds one subdirectory per tab tag.
    pub data_root: PathBuf,

    /// Ordered, closed set of expense categories.
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,

    /// Transfers between own accounts; left out of spend totals.
    #[serde(default = "default_pass_through")]
    pub pass_through_category: String,

    /// Ledger file names skipped when compiling a tab.
    #[serde(default = "default_excluded_files")]
    pub excluded_files: Vec<String>,

    pub tabs: Vec<TabConfig>,

    /// Currency -> conversion rate to the base currency.
    pub currencies: BTreeMap<String, Decimal>,

    /// Classifier priority order: first match wins.
    #[serde(default)]
    pub institutions: Vec<InstitutionConfig>,

    #[serde(default)]
    pub extraction: ExtractionConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabConfig {
    pub name: String,
    /// Short tag, also the directory name under `data_root`
    pub tag: String,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstitutionConfig {
    /// Built-in institution tag ("SC", "HSBC", "IBKR")
    pub institution: String,
    /// Tab name the institution's ledger lives under
    pub tab: String,
    /// Ledger folder name; defaults to the institution tag
    pub folder: Option<String>,
    /// Literal substrings that must all appear in a document's text
    pub identifiers: Vec<String>,
}

impl InstitutionConfig {
    pub fn folder(&self) -> &str {
        self.folder.as_deref().unwrap_or(&self.institution)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub ocr_dpi: u32,
    pub ocr_language: String,
    pub remote_endpoint: String,
    /// Name of the environment variable holding the remote service credential
    pub remote_api_key_env: String,
    pub remote_timeout_secs: u64,
    pub poll_interval_secs: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            ocr_dpi: 300,
            ocr_language: "eng".to_string(),
            remote_endpoint: "https://api.cloud.llamaindex.ai/api/parsing".to_string(),
            remote_api_key_env: "LLAMA_CLOUD_API_KEY".to_string(),
            remote_timeout_secs: 120,
            poll_interval_secs: 2,
        }
    }
}

fn default_categories() -> Vec<String> {
    [
        "Groceries",
        "Dining",
        "Transport",
        "Travel",
        "Entertainment",
        "Investment",
        "Gifts / Family",
        "Credit Card",
        "Personal",
        "Taxes / Bills",
        "Rent / Mortgage",
        "Unsure",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_pass_through() -> String {
    "Credit Card".to_string()
}

fn default_excluded_files() -> Vec<String> {
    vec!["paystubs.csv".to_string()]
}

impl Config {
    /// A starter config with one USD tab.
    pub fn example(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
            categories: default_categories(),
            pass_through_category: default_pass_through(),
            excluded_files: default_excluded_files(),
            tabs: vec![TabConfig {
                name: "United States".to_string(),
                tag: "US".to_string(),
                currency: "USD".to_string(),
            }],
            currencies: BTreeMap::from([("USD".to_string(), Decimal::ONE)]),
            institutions: Vec::new(),
            extraction: ExtractionConfig::default(),
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Read and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let s = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg = Self::from_toml_str(&s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Startup checks: every tab has a conversion rate and a directory,
    /// and every institution points at a declared tab.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for tab in &self.tabs {
            if !self.currencies.contains_key(&tab.currency) {
                return Err(ConfigError::MissingConversion {
                    tab: tab.name.clone(),
                    currency: tab.currency.clone(),
                });
            }
        }

        if !self.categories.contains(&self.pass_through_category) {
            return Err(ConfigError::UnknownCategory(
                self.pass_through_category.clone(),
            ));
        }

        for inst in &self.institutions {
            if self.tab(&inst.tab).is_none() {
                return Err(ConfigError::UnknownTab(inst.tab.clone()));
            }
        }

        if !self.data_root.is_dir() {
            return Err(ConfigError::MissingDataRoot(self.data_root.clone()));
        }
        for tab in &self.tabs {
            let dir = self.tab_dir(tab);
            if !dir.is_dir() {
                return Err(ConfigError::MissingTabDirectory {
                    tab: tab.name.clone(),
                    path: dir,
                });
            }
        }

        Ok(())
    }

    pub fn tab(&self, name: &str) -> Option<&TabConfig> {
        self.tabs.iter().find(|t| t.name == name || t.tag == name)
    }

    pub fn tab_dir(&self, tab: &TabConfig) -> PathBuf {
        self.data_root.join(&tab.tag)
    }

    /// Look up a category by name, rejecting anything outside the configured set.
    pub fn category(&self, name: &str) -> Result<Category, ConfigError> {
        let name = name.trim();
        if self.categories.iter().any(|c| c == name) {
            Ok(Category::new(name))
        } else {
            Err(ConfigError::UnknownCategory(name.to_string()))
        }
    }

    /// Categories that count as spend, in configured order.
    pub fn spend_categories(&self) -> impl Iterator<Item = &str> {
        self.categories
            .iter()
            .map(String::as_str)
            .filter(|c| *c != self.pass_through_category)
    }

    /// Convert an amount to the base currency with the static rate table.
    pub fn to_base(&self, amount: Decimal, currency: &str) -> Option<Decimal> {
        self.currencies.get(currency).map(|rate| amount * rate)
    }
}

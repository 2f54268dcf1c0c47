//! Configuration errors. All of these are fatal at startup.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("data directory does not exist: {0}")]
    MissingDataRoot(PathBuf),

    #[error("tab '{tab}' has no subdirectory at {path}")]
    MissingTabDirectory { tab: String, path: PathBuf },

    #[error("tab '{tab}' uses currency {currency}, which has no conversion rate (rates are static, declare it under [currencies])")]
    MissingConversion { tab: String, currency: String },

    #[error("unknown tab: {0}")]
    UnknownTab(String),

    #[error("'{0}' is not a configured category")]
    UnknownCategory(String),
}

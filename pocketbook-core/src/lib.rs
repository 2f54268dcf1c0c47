//! pocketbook-core: record types, date periods and the startup configuration

pub mod config;
pub mod error;
pub mod period;
pub mod records;

pub use config::{Config, ExtractionConfig, InstitutionConfig, TabConfig};
pub use error::ConfigError;
pub use period::{month_end, month_label, Period};
pub use records::{is_fully_classified, BalanceRecord, Category, Record, StatementKind, Transaction};

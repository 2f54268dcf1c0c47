//! pocketbook-finance: ledger store, cross-account aggregation, and the upload flow

pub mod aggregate;
pub mod import;
pub mod ledger;

pub use aggregate::{
    balance_table, category_table, compile_statements, BalanceGrid, BalancePoint, BalanceTable,
    CategoryTable, LedgerRow,
};
pub use import::{import_statement, import_upload, save_outcome, ImportOutcome};
pub use ledger::{read_records, write_records, LedgerKey, LedgerStore, Lookup, RecordStore, TreeNode};

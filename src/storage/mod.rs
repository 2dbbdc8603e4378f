pub mod database;
pub mod ledger;

pub use database::{Database, PoolConfig};
pub use ledger::{LedgerEntry, LedgerStore, SharedLedger, SqliteLedger};

pub mod database;
pub mod ledger;
pub mod migrator;
pub mod registry;
pub mod row;

pub use database::Database;
pub use ledger::{LEDGER_TABLE, LedgerEntry};
pub use migrator::{MigrationStatus, Migrator, StatusReport, pending};
pub use registry::{Migration, MigrationSource};
pub use row::FromRow;

// Re-exported so `record!` expansions resolve without a direct dependency.
pub use rusqlite;

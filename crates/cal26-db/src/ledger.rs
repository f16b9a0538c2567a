//! The `schema_migrations` table: which versions have been applied, and when.
//!
//! Rows are only ever inserted. A version is recorded in the same
//! transaction that ran its script.

use std::collections::BTreeSet;

use cal26_common::Result;
use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, Row, params};

use crate::row::FromRow;

pub const LEDGER_TABLE: &str = "schema_migrations";

const CREATE_LEDGER: &str = "CREATE TABLE IF NOT EXISTS schema_migrations (
    version TEXT PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);";

/// One applied migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub version: String,
    pub applied_at: DateTime<Utc>,
}

impl FromRow for LedgerEntry {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let applied_at: String = row.get("applied_at")?;
        Ok(Self {
            version: row.get("version")?,
            applied_at: parse_timestamp(&applied_at)?,
        })
    }
}

crate::record! {
    struct AppliedVersion {
        version: String,
    }
}

/// Create the ledger table if it is absent.
pub fn ensure_ledger(conn: &Connection) -> Result<()> {
    conn.execute_batch(CREATE_LEDGER)?;
    Ok(())
}

pub fn ledger_exists(conn: &Connection) -> Result<bool> {
    let exists = conn.query_row(
        "SELECT count(*) > 0 FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [LEDGER_TABLE],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// Versions currently recorded. Creates the ledger first, so a fresh
/// database reports an empty set.
pub fn load_applied(conn: &Connection) -> Result<BTreeSet<String>> {
    ensure_ledger(conn)?;
    let mut stmt = conn.prepare("SELECT version FROM schema_migrations ORDER BY version")?;
    let versions = stmt
        .query_map([], AppliedVersion::from_row)?
        .map(|row| row.map(|r| r.version))
        .collect::<rusqlite::Result<BTreeSet<_>>>()?;
    Ok(versions)
}

/// Every ledger row, without creating the table. Safe on read-only connections.
pub fn load_entries(conn: &Connection) -> Result<Vec<LedgerEntry>> {
    if !ledger_exists(conn)? {
        return Ok(Vec::new());
    }
    let mut stmt =
        conn.prepare("SELECT version, applied_at FROM schema_migrations ORDER BY version")?;
    let entries = stmt
        .query_map([], LedgerEntry::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(entries)
}

/// Record `version` as applied now. Fails if it is already recorded.
pub fn record(conn: &Connection, version: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO schema_migrations (version) VALUES (?1)",
        params![version],
    )?;
    Ok(())
}

/// Parse `CURRENT_TIMESTAMP` output (`YYYY-MM-DD HH:MM:SS`, UTC) or RFC 3339.
fn parse_timestamp(raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))
}

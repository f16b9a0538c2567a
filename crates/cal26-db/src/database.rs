use std::path::{Path, PathBuf};

use cal26_common::Result;
use rusqlite::{Connection, OpenFlags, OptionalExtension, Params, Transaction};
use tracing::debug;

use crate::row::FromRow;

/// Handle to a SQLite database file.
///
/// Holds no open connection: every unit of work opens its own connection,
/// runs inside one transaction, commits when the work succeeds and closes
/// the connection either way.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the database file has been created yet.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn open(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)?;
        // Has no effect inside a transaction, so it must run before `BEGIN`.
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        debug!("opened database at {}", self.path.display());
        Ok(conn)
    }

    /// Run `work` inside one transaction.
    ///
    /// Commits if `work` returns `Ok`. On `Err` the transaction is rolled
    /// back and the error is returned unchanged. The connection is closed
    /// before this returns in both cases.
    pub fn connect<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let mut conn = self.open()?;
        let tx = conn.transaction()?;
        let value = work(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Run `work` against a read-only connection. The file must exist.
    pub fn read<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&self.path, flags)?;
        work(&conn)
    }

    /// Execute a single write statement.
    pub fn execute<P: Params>(&self, query: &str, params: P) -> Result<()> {
        self.connect(|conn| {
            conn.execute(query, params)?;
            Ok(())
        })
    }

    /// Execute one statement once per parameter batch, all in one transaction.
    pub fn execute_many<P, I>(&self, query: &str, batches: I) -> Result<()>
    where
        P: Params,
        I: IntoIterator<Item = P>,
    {
        self.connect(|conn| {
            let mut stmt = conn.prepare(query)?;
            for params in batches {
                stmt.execute(params)?;
            }
            Ok(())
        })
    }

    /// Return the first row of the result, if any.
    pub fn fetch_one<T: FromRow, P: Params>(&self, query: &str, params: P) -> Result<Option<T>> {
        self.connect(|conn| {
            let row = conn.query_row(query, params, T::from_row).optional()?;
            Ok(row)
        })
    }

    /// Return every row of the result.
    pub fn fetch_all<T: FromRow, P: Params>(&self, query: &str, params: P) -> Result<Vec<T>> {
        self.connect(|conn| {
            let mut stmt = conn.prepare(query)?;
            let rows = stmt
                .query_map(params, T::from_row)?
                .collect::<rusqlite::Result<Vec<T>>>()?;
            Ok(rows)
        })
    }

    /// Execute a multi-statement SQL script verbatim.
    pub fn execute_script(&self, script: &str) -> Result<()> {
        self.connect(|conn| {
            conn.execute_batch(script)?;
            Ok(())
        })
    }
}

use std::collections::{BTreeMap, BTreeSet};

use cal26_common::{Error, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

use crate::database::Database;
use crate::ledger::{self, LedgerEntry};
use crate::registry::{Migration, MigrationSource};

/// Applies the migrations of a [`MigrationSource`] to a [`Database`].
///
/// Every `apply` run is a single transaction: either all migrations it
/// selected are applied and recorded, or none are.
pub struct Migrator {
    db: Database,
    source: MigrationSource,
}

/// Applied state of one discovered migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub version: String,
    pub applied: bool,
    pub applied_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusReport {
    /// Every migration on disk, in application order.
    pub migrations: Vec<MigrationStatus>,
    /// Versions in the ledger whose file is no longer on disk.
    pub orphaned: Vec<String>,
}

impl StatusReport {
    pub fn pending(&self) -> impl Iterator<Item = &MigrationStatus> {
        self.migrations.iter().filter(|m| !m.applied)
    }
}

/// Select the migrations an apply run would execute, in order.
///
/// Walks `definitions` in order, taking every version not in `applied`.
/// When `target` is given, the walk stops at that version whether or not it
/// was already applied.
pub fn pending<'a>(
    definitions: &'a [Migration],
    applied: &BTreeSet<String>,
    target: Option<&str>,
) -> Vec<&'a Migration> {
    let mut selected = Vec::new();
    for migration in definitions {
        if !applied.contains(&migration.version) {
            selected.push(migration);
        }
        if target == Some(migration.version.as_str()) {
            break;
        }
    }
    selected
}

impl Migrator {
    pub fn new(db: Database, source: MigrationSource) -> Self {
        Self { db, source }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn source(&self) -> &MigrationSource {
        &self.source
    }

    /// Apply pending migrations, up to and including `target` when given.
    /// A `target` with no file on disk never stops the walk, so every pending
    /// migration runs.
    ///
    /// Returns the newly applied versions in order. If any script fails the
    /// whole run is rolled back and the failure is returned.
    ///
    /// The run already holds a transaction: scripts must not contain their
    /// own `BEGIN` / `COMMIT`, SQLite rejects a nested `BEGIN`.
    pub fn apply(&self, target: Option<&str>) -> Result<Vec<String>> {
        let definitions = self.source.list_definitions()?;
        warn_missing_target(&definitions, target);

        let run_id = Uuid::new_v4();
        let span = info_span!("migrate", %run_id, database = %self.db.path().display());
        let _entered = span.enter();

        let applied_now = self
            .db
            .connect(|conn| {
                let applied = ledger::load_applied(conn)?;
                let selected = pending(&definitions, &applied, target);
                debug!(
                    "{} applied, {} selected for this run",
                    applied.len(),
                    selected.len()
                );

                let mut applied_now = Vec::with_capacity(selected.len());
                for migration in selected {
                    info!(version = %migration.version, "applying migration");
                    conn.execute_batch(&migration.script)
                        .map_err(|source| Error::Migration {
                            version: migration.version.clone(),
                            source,
                        })?;
                    ledger::record(conn, &migration.version)?;
                    applied_now.push(migration.version.clone());
                }
                Ok(applied_now)
            })
            .inspect_err(|e| warn!("migration run rolled back: {e}"))?;

        if applied_now.is_empty() {
            debug!("nothing pending");
        } else {
            info!(count = applied_now.len(), "migration run committed");
        }
        Ok(applied_now)
    }

    /// The versions `apply(target)` would run now. Writes nothing.
    pub fn plan(&self, target: Option<&str>) -> Result<Vec<String>> {
        let definitions = self.source.list_definitions()?;
        warn_missing_target(&definitions, target);

        let applied: BTreeSet<String> = self
            .read_ledger()?
            .into_iter()
            .map(|entry| entry.version)
            .collect();
        Ok(pending(&definitions, &applied, target)
            .into_iter()
            .map(|m| m.version.clone())
            .collect())
    }

    /// Pair every migration on disk with its applied state. Writes nothing,
    /// and does not create the ledger table.
    pub fn status(&self) -> Result<StatusReport> {
        let definitions = self.source.list_definitions()?;
        let mut recorded: BTreeMap<String, DateTime<Utc>> = self
            .read_ledger()?
            .into_iter()
            .map(|entry| (entry.version, entry.applied_at))
            .collect();

        let migrations = definitions
            .into_iter()
            .map(|migration| {
                let applied_at = recorded.remove(&migration.version);
                MigrationStatus {
                    version: migration.version,
                    applied: applied_at.is_some(),
                    applied_at,
                }
            })
            .collect();
        let orphaned = recorded.into_keys().collect();

        Ok(StatusReport {
            migrations,
            orphaned,
        })
    }

    fn read_ledger(&self) -> Result<Vec<LedgerEntry>> {
        if !self.db.exists() {
            return Ok(Vec::new());
        }
        self.db.read(ledger::load_entries)
    }
}

/// Returns whether `target` names a migration on disk.
fn warn_missing_target(definitions: &[Migration], target: Option<&str>) -> bool {
    match target {
        Some(version) if !definitions.iter().any(|m| m.version == version) => {
            warn!(
                target_version = version,
                "target not found on disk, applying all pending migrations"
            );
            false
        }
        _ => true,
    }
}

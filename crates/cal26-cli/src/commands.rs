use std::io::Write;

use anyhow::{Context, Result};
use cal26_db::{Migrator, StatusReport};
use tracing::info;

const APPLIED_MARKER: &str = "✓";
const PENDING_MARKER: &str = "·";
const ORPHANED_MARKER: &str = "!";

pub fn apply(migrator: &Migrator, target: Option<&str>) -> Result<()> {
    let applied = migrator.apply(target).with_context(|| {
        format!(
            "failed to apply migrations to {}",
            migrator.database().path().display()
        )
    })?;

    if applied.is_empty() {
        info!("no migrations to apply");
    } else {
        info!("applied migrations: {}", applied.join(", "));
    }
    Ok(())
}

pub fn plan(migrator: &Migrator, target: Option<&str>, out: &mut impl Write) -> Result<()> {
    let planned = migrator
        .plan(target)
        .context("failed to compute pending migrations")?;

    if planned.is_empty() {
        writeln!(out, "no migrations to apply")?;
    }
    for version in &planned {
        writeln!(out, "would apply {version}")?;
    }
    Ok(())
}

pub fn show(migrator: &Migrator, out: &mut impl Write) -> Result<()> {
    let report = migrator
        .status()
        .context("failed to read migration status")?;
    render_status(&report, out)?;
    Ok(())
}

fn render_status(report: &StatusReport, out: &mut impl Write) -> std::io::Result<()> {
    for migration in &report.migrations {
        let marker = if migration.applied {
            APPLIED_MARKER
        } else {
            PENDING_MARKER
        };
        writeln!(out, "{marker} {}", migration.version)?;
    }
    for version in &report.orphaned {
        writeln!(out, "{ORPHANED_MARKER} {version} (missing from disk)")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use cal26_db::{Database, MigrationSource, MigrationStatus, Migrator, StatusReport};

    use super::*;

    fn status(version: &str, applied: bool) -> MigrationStatus {
        MigrationStatus {
            version: version.into(),
            applied,
            applied_at: None,
        }
    }

    #[test]
    fn renders_one_line_per_migration() {
        let report = StatusReport {
            migrations: vec![status("0001_init", true), status("0002_events", false)],
            orphaned: vec!["0000_legacy".into()],
        };

        let mut out = Vec::new();
        render_status(&report, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "✓ 0001_init\n· 0002_events\n! 0000_legacy (missing from disk)\n"
        );
    }

    #[test]
    fn renders_nothing_for_empty_report() {
        let mut out = Vec::new();
        render_status(&StatusReport::default(), &mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn plan_prints_pending_versions_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let migrations = dir.path().join("migrations");
        std::fs::create_dir(&migrations).unwrap();
        std::fs::write(migrations.join("0001_init.sql"), "CREATE TABLE t (id INTEGER);").unwrap();
        let db_path = dir.path().join("plan.db");
        let migrator = Migrator::new(Database::new(&db_path), MigrationSource::new(&migrations));

        let mut out = Vec::new();
        plan(&migrator, None, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "would apply 0001_init\n");
        assert!(!db_path.exists());

        apply(&migrator, None).unwrap();
        let mut out = Vec::new();
        plan(&migrator, None, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "no migrations to apply\n");
    }

    #[test]
    fn apply_error_names_the_database() {
        let dir = tempfile::tempdir().unwrap();
        let migrations = dir.path().join("migrations");
        std::fs::create_dir(&migrations).unwrap();
        std::fs::write(migrations.join("0001_bad.sql"), "NOT SQL AT ALL;").unwrap();
        let db_path = dir.path().join("bad.db");
        let migrator = Migrator::new(Database::new(&db_path), MigrationSource::new(&migrations));

        let err = apply(&migrator, None).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("failed to apply migrations to"));
        assert!(message.contains("migration 0001_bad failed"));
        assert_eq!(message.matches("syntax error").count(), 1, "{message}");
        let inner = err.downcast_ref::<cal26_common::Error>().unwrap();
        assert_eq!(inner.kind(), cal26_common::ErrorKind::ScriptExecution);
    }
}

use std::fs;
use std::path::{Path, PathBuf};

use cal26_common::{Error, Result};
use tracing::debug;

const MIGRATION_EXTENSION: &str = "sql";

/// One migration script found on disk.
///
/// The version is the file name without its extension. Scripts are trusted,
/// operator-authored SQL and are executed as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    pub version: String,
    pub path: PathBuf,
    pub script: String,
}

/// A directory of `*.sql` migration files.
#[derive(Debug, Clone)]
pub struct MigrationSource {
    dir: PathBuf,
}

impl MigrationSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Read every migration in the directory, ordered lexically by file name.
    ///
    /// Lexical order is the application order, so versions need zero-padded
    /// prefixes (`0002_...` before `0010_...`). Files with another extension
    /// and subdirectories are ignored.
    pub fn list_definitions(&self) -> Result<Vec<Migration>> {
        if !self.dir.exists() {
            return Err(Error::MigrationsDirMissing(self.dir.clone()));
        }
        if !self.dir.is_dir() {
            return Err(Error::Config(format!(
                "migrations path is not a directory: {}",
                self.dir.display()
            )));
        }

        let mut paths = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|e| e == MIGRATION_EXTENSION) {
                paths.push(path);
            }
        }
        paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        let migrations = paths
            .into_iter()
            .map(load_migration)
            .collect::<Result<Vec<_>>>()?;
        debug!(
            "found {} migration(s) in {}",
            migrations.len(),
            self.dir.display()
        );
        Ok(migrations)
    }
}

fn load_migration(path: PathBuf) -> Result<Migration> {
    let version = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| {
            Error::Config(format!(
                "migration file name is not valid UTF-8: {}",
                path.display()
            ))
        })?
        .to_string();
    let script = fs::read_to_string(&path)?;

    Ok(Migration {
        version,
        path,
        script,
    })
}

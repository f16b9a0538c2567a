use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("migrations directory missing: {}", .0.display())]
    MigrationsDirMissing(PathBuf),

    #[error("migration {version} failed")]
    Migration {
        version: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification used by callers that pick exit codes or retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Nothing was attempted: the run was misconfigured.
    Configuration,
    /// A migration script failed and its run was rolled back.
    ScriptExecution,
    /// The store or filesystem failed underneath us.
    Store,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Config(_) | Error::MigrationsDirMissing(_) => ErrorKind::Configuration,
            Error::Migration { .. } => ErrorKind::ScriptExecution,
            Error::Database(_) | Error::Io(_) => ErrorKind::Store,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;
    use std::path::PathBuf;

    use super::{Error, ErrorKind};

    #[test]
    fn error_display_includes_context() {
        let e = Error::Config("bad toml".into());
        assert_eq!(e.to_string(), "configuration error: bad toml");

        let e = Error::MigrationsDirMissing(PathBuf::from("/srv/migrations"));
        assert_eq!(e.to_string(), "migrations directory missing: /srv/migrations");
    }

    #[test]
    fn migration_error_keeps_store_error_as_source() {
        let e = Error::Migration {
            version: "0002".into(),
            source: rusqlite::Error::InvalidQuery,
        };
        assert_eq!(e.to_string(), "migration 0002 failed");
        let source = e.source().expect("store error is the source");
        assert_eq!(source.to_string(), rusqlite::Error::InvalidQuery.to_string());
    }

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(
            Error::MigrationsDirMissing(PathBuf::from("x")).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(Error::Config("x".into()).kind(), ErrorKind::Configuration);
        assert_eq!(
            Error::Migration {
                version: "1".into(),
                source: rusqlite::Error::InvalidQuery,
            }
            .kind(),
            ErrorKind::ScriptExecution
        );
        assert_eq!(
            Error::Database(rusqlite::Error::InvalidQuery).kind(),
            ErrorKind::Store
        );
        let io = std::io::Error::other("disk gone");
        assert_eq!(Error::from(io).kind(), ErrorKind::Store);
    }
}

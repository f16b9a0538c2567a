//! Precedence rules for the settings that can come from several places.
//!
//! Highest first: explicit argument, environment variable, config file,
//! built-in default. Empty environment values count as unset.

use std::path::{Path, PathBuf};

use crate::model::AppConfig;

pub const DATABASE_ENV: &str = "SQLITE_PATH";
pub const MIGRATIONS_DIR_ENV: &str = "CAL26_MIGRATIONS_DIR";
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

pub const DEFAULT_DATABASE_PATH: &str = "cal26.db";
pub const DEFAULT_MIGRATIONS_DIR: &str = "migrations";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Resolve the SQLite database file location.
pub fn resolve_database_path(explicit: Option<&Path>, config: &AppConfig) -> PathBuf {
    database_path_from(explicit, env_value(DATABASE_ENV), config)
}

/// Resolve the directory holding `*.sql` migration files.
pub fn resolve_migrations_dir(explicit: Option<&Path>, config: &AppConfig) -> PathBuf {
    migrations_dir_from(explicit, env_value(MIGRATIONS_DIR_ENV), config)
}

/// Resolve the log filter directive handed to the subscriber.
pub fn resolve_log_level(explicit: Option<&str>, config: &AppConfig) -> String {
    log_level_from(explicit, env_value(LOG_LEVEL_ENV), config)
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn database_path_from(
    explicit: Option<&Path>,
    env: Option<String>,
    config: &AppConfig,
) -> PathBuf {
    pick_path(explicit, env, config.database.path.as_deref(), DEFAULT_DATABASE_PATH)
}

fn migrations_dir_from(
    explicit: Option<&Path>,
    env: Option<String>,
    config: &AppConfig,
) -> PathBuf {
    pick_path(explicit, env, config.migrations.dir.as_deref(), DEFAULT_MIGRATIONS_DIR)
}

fn log_level_from(explicit: Option<&str>, env: Option<String>, config: &AppConfig) -> String {
    explicit
        .map(str::to_string)
        .or(env)
        .or_else(|| config.logging.level.clone())
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
        .to_lowercase()
}

fn pick_path(
    explicit: Option<&Path>,
    env: Option<String>,
    configured: Option<&Path>,
    default: &str,
) -> PathBuf {
    let chosen = explicit
        .map(Path::to_path_buf)
        .or_else(|| env.map(PathBuf::from))
        .or_else(|| configured.map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from(default));
    expand_home(chosen)
}

/// Expand a leading `~` to the user's home directory.
fn expand_home(path: PathBuf) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    path
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use super::*;
    use crate::model::AppConfig;

    fn configured() -> AppConfig {
        let mut config = AppConfig::default();
        config.database.path = Some(PathBuf::from("from-config.db"));
        config.migrations.dir = Some(PathBuf::from("config-migrations"));
        config.logging.level = Some("warn".into());
        config
    }

    #[test]
    fn explicit_path_wins_over_everything() {
        let path = database_path_from(
            Some(Path::new("explicit.db")),
            Some("env.db".into()),
            &configured(),
        );
        assert_eq!(path, PathBuf::from("explicit.db"));
    }

    #[test]
    fn env_beats_config_file() {
        let path = database_path_from(None, Some("env.db".into()), &configured());
        assert_eq!(path, PathBuf::from("env.db"));
    }

    #[test]
    fn config_file_beats_default() {
        let path = database_path_from(None, None, &configured());
        assert_eq!(path, PathBuf::from("from-config.db"));
    }

    #[test]
    fn falls_back_to_built_in_defaults() {
        let config = AppConfig::default();
        assert_eq!(
            database_path_from(None, None, &config),
            PathBuf::from(DEFAULT_DATABASE_PATH)
        );
        assert_eq!(
            migrations_dir_from(None, None, &config),
            PathBuf::from(DEFAULT_MIGRATIONS_DIR)
        );
        assert_eq!(log_level_from(None, None, &config), DEFAULT_LOG_LEVEL);
    }

    #[test]
    fn migrations_dir_follows_same_precedence() {
        assert_eq!(
            migrations_dir_from(None, Some("env-migrations".into()), &configured()),
            PathBuf::from("env-migrations")
        );
        assert_eq!(
            migrations_dir_from(None, None, &configured()),
            PathBuf::from("config-migrations")
        );
    }

    #[test]
    fn log_level_is_lowercased() {
        assert_eq!(log_level_from(Some("DEBUG"), None, &configured()), "debug");
        assert_eq!(log_level_from(None, Some("Error".into()), &configured()), "error");
        assert_eq!(log_level_from(None, None, &configured()), "warn");
    }

    #[test]
    fn tilde_expands_to_home() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        let path = database_path_from(Some(Path::new("~/data/cal26.db")), None, &AppConfig::default());
        assert_eq!(path, home.join("data/cal26.db"));
    }
}

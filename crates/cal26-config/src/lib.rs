pub mod loader;
pub mod model;
pub mod resolve;

pub use loader::ConfigLoader;
pub use model::{AppConfig, DatabaseConfig, LogFormat, LoggingConfig, MigrationsConfig};
pub use resolve::{
    DATABASE_ENV, DEFAULT_DATABASE_PATH, DEFAULT_LOG_LEVEL, DEFAULT_MIGRATIONS_DIR, LOG_LEVEL_ENV,
    MIGRATIONS_DIR_ENV, resolve_database_path, resolve_log_level, resolve_migrations_dir,
};

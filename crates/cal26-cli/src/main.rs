mod commands;
mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use cal26_common::ErrorKind;
use cal26_config::{
    AppConfig, ConfigLoader, LogFormat, resolve_database_path, resolve_log_level,
    resolve_migrations_dir,
};
use cal26_db::{Database, MigrationSource, Migrator};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::error;

#[derive(Parser)]
#[command(name = "cal26-migrate", version, about = "SQLite migration runner for Cal26")]
struct Cli {
    /// Database file (defaults to SQLITE_PATH, then the config file, then cal26.db)
    #[arg(long, global = true, value_name = "PATH")]
    database: Option<PathBuf>,

    /// Directory of *.sql migrations (defaults to CAL26_MIGRATIONS_DIR, then ./migrations)
    #[arg(long, global = true, value_name = "DIR")]
    migrations: Option<PathBuf>,

    /// Config file (defaults to cal26.toml / cal26.yml in the working directory)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `cal26_db=trace` (defaults to LOG_LEVEL, then info)
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,

    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormatArg>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply pending migrations
    Apply {
        /// Apply up to and including this migration version
        #[arg(long, value_name = "VERSION")]
        target: Option<String>,

        /// Print the migrations that would be applied, without applying them
        #[arg(long)]
        dry_run: bool,
    },
    /// Display migration status
    Show,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormatArg {
    Text,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Text => LogFormat::Text,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

fn main() -> ExitCode {
    // A missing .env file is the common case.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = match ConfigLoader::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let level = resolve_log_level(cli.log_level.as_deref(), &config);
    let format = cli
        .log_format
        .map(LogFormat::from)
        .unwrap_or(config.logging.format);
    logging::init(&level, format);

    let migrator = build_migrator(&cli, &config);
    match run(cli.command, &migrator) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            if let Some(kind) = e.downcast_ref::<cal26_common::Error>().map(|e| e.kind()) {
                match kind {
                    ErrorKind::ScriptExecution => {
                        error!("no migration from this run was committed")
                    }
                    ErrorKind::Configuration => error!(
                        "migrations dir resolved to {}, database to {}; check --migrations / CAL26_MIGRATIONS_DIR and --database / SQLITE_PATH",
                        migrator.source().dir().display(),
                        migrator.database().path().display()
                    ),
                    ErrorKind::Store => {}
                }
            }
            ExitCode::FAILURE
        }
    }
}

fn build_migrator(cli: &Cli, config: &AppConfig) -> Migrator {
    let db_path = resolve_database_path(cli.database.as_deref(), config);
    let migrations_dir = resolve_migrations_dir(cli.migrations.as_deref(), config);
    Migrator::new(
        Database::new(db_path),
        MigrationSource::new(migrations_dir),
    )
}

fn run(command: Command, migrator: &Migrator) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    match command {
        Command::Apply {
            target,
            dry_run: false,
        } => commands::apply(migrator, target.as_deref()),
        Command::Apply {
            target,
            dry_run: true,
        } => commands::plan(migrator, target.as_deref(), &mut stdout),
        Command::Show => commands::show(migrator, &mut stdout),
    }
}

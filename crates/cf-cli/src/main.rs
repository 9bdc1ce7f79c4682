use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cf_cli::commands::prefs::PrefsUpdate;
use cf_cli::commands::{
    checkin, delete, drinks, edit, log, patterns, prefs, profile, status, watch,
};
use cf_cli::{Cli, Commands, Config};
use cf_core::Engine;

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(cf_db::Database, Engine)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    let engine = config.engine().context("invalid configuration")?;

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = cf_db::Database::open(&config.database_path).context("failed to open database")?;
    Ok((db, engine))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let config_path = cli.config.as_deref();
    match &cli.command {
        Some(Commands::Log { drink, mg, name, at }) => {
            let (db, engine) = open_database(config_path)?;
            log::run(
                &db,
                &engine,
                drink.as_deref(),
                *mg,
                name.as_deref(),
                at.as_deref(),
            )?;
        }
        Some(Commands::Edit { id, mg, at }) => {
            let (db, _engine) = open_database(config_path)?;
            edit::run(&db, id, *mg, at.as_deref())?;
        }
        Some(Commands::Delete { id }) => {
            let (db, _engine) = open_database(config_path)?;
            delete::run(&db, id)?;
        }
        Some(Commands::Checkin { quality, date }) => {
            let (db, _engine) = open_database(config_path)?;
            checkin::run(&db, quality, date.as_deref())?;
        }
        Some(Commands::Status { json }) => {
            let (db, engine) = open_database(config_path)?;
            status::run(&db, &engine, *json)?;
        }
        Some(Commands::Patterns { days, json }) => {
            let (db, engine) = open_database(config_path)?;
            patterns::run(&db, &engine, *days, *json)?;
        }
        Some(Commands::Profile { json }) => {
            let (mut db, engine) = open_database(config_path)?;
            profile::run(&mut db, &engine, *json)?;
        }
        Some(Commands::Prefs {
            bedtime,
            limit,
            sensitivity,
        }) => {
            let (mut db, _engine) = open_database(config_path)?;
            let update = PrefsUpdate {
                bedtime: bedtime.as_deref(),
                daily_limit_mg: *limit,
                sensitivity: sensitivity.as_deref(),
            };
            prefs::run(&mut db, &update)?;
        }
        Some(Commands::Watch { interval, ticks }) => {
            let (db, engine) = open_database(config_path)?;
            watch::run(&db, &engine, *interval, *ticks)?;
        }
        Some(Commands::Drinks) => {
            // The catalog is built in; no database needed.
            drinks::run()?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}

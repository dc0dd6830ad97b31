use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use wt_cli::commands::{complete, delete, list, new, pause, show, start, status};
use wt_cli::{Cli, Commands, Config};

/// Load config and open the database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(wt_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = wt_db::Database::open(&config.database_path).context("failed to open database")?;
    Ok((db, config))
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
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let mut stdout = std::io::stdout();
    match &cli.command {
        Some(Commands::New {
            description,
            category,
            start,
        }) => {
            let (mut db, config) = open_database(cli.config.as_deref())?;
            let user = cli.user.as_deref().unwrap_or(&config.user);
            new::run(
                &mut stdout,
                &mut db,
                user,
                description.clone(),
                category.clone(),
                *start,
            )?;
        }
        Some(Commands::Start { activity }) => {
            let (mut db, config) = open_database(cli.config.as_deref())?;
            let user = cli.user.as_deref().unwrap_or(&config.user);
            start::run(&mut stdout, &mut db, activity, user)?;
        }
        Some(Commands::Pause { activity }) => {
            let (mut db, config) = open_database(cli.config.as_deref())?;
            let user = cli.user.as_deref().unwrap_or(&config.user);
            pause::run(&mut stdout, &mut db, activity, user)?;
        }
        Some(Commands::Complete {
            activity,
            count,
            notes,
        }) => {
            let (mut db, config) = open_database(cli.config.as_deref())?;
            let user = cli.user.as_deref().unwrap_or(&config.user);
            complete::run(&mut stdout, &mut db, activity, user, *count, notes.as_deref())?;
        }
        Some(Commands::Show { activity, json }) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            let user = cli.user.as_deref().unwrap_or(&config.user);
            show::run(&mut stdout, &db, activity, user, *json)?;
        }
        Some(Commands::List { status, json }) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            let user = cli.user.as_deref().unwrap_or(&config.user);
            list::run(&mut stdout, &db, user, *status, *json)?;
        }
        Some(Commands::Status) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            let user = cli.user.as_deref().unwrap_or(&config.user);
            status::run(&mut stdout, &db, user)?;
        }
        Some(Commands::Delete { activity }) => {
            let (mut db, config) = open_database(cli.config.as_deref())?;
            let user = cli.user.as_deref().unwrap_or(&config.user);
            delete::run(&mut stdout, &mut db, activity, user)?;
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

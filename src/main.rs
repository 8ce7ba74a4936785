mod cli;
mod commands;
mod config;
mod model;
mod store;
mod ui;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use config::{CommandMode, Config};
use std::env;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let dirs = config::default_dirs()?;
    let config_path = args.config.clone().unwrap_or(dirs.config_file);
    let config = config::load_config(&config_path)?;
    init_logging(&config, &dirs.data_dir);

    let command = match args.command {
        Some(command) => command,
        None => match config.command_mode {
            CommandMode::Tui => cli::Command::Tui,
            CommandMode::Cli | CommandMode::Help => {
                cli::Cli::command().print_help()?;
                println!();
                return Ok(());
            }
        },
    };

    let db_path = args
        .db
        .unwrap_or_else(|| config.resolve_db_path(&dirs.data_dir));
    info!(db = %db_path.display(), config = %config_path.display(), "opening store");
    let store = store::SqliteStore::open(&db_path)
        .with_context(|| format!("opening database {:?}", db_path))?;

    match command {
        cli::Command::Start { name, tags } => commands::start(&store, name, tags),
        cli::Command::Stop { name } => commands::stop(&store, name),
        cli::Command::Create {
            kind,
            name,
            description,
            start,
            end,
            tags,
        } => commands::create(
            &store,
            kind,
            commands::CreateArgs {
                name,
                description,
                start,
                end,
                tags,
            },
        ),
        cli::Command::Edit {
            id,
            name,
            description,
            start,
            end,
            tags,
            clear_tags,
        } => commands::edit(
            &store,
            id,
            commands::EditArgs {
                name,
                description,
                start,
                end,
                tags,
                clear_tags,
            },
        ),
        cli::Command::Del { id, kind } => commands::delete(&store, id, kind),
        cli::Command::Read { collection, yaml } => commands::read(&store, collection, yaml),
        cli::Command::Tui => commands::tui(store, config.tick_rate()),
    }
}

/// Logs go to a file when one is configured or `DEBUG` is set. The TUI owns
/// the terminal, so everything else is discarded.
fn init_logging(config: &Config, data_dir: &Path) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let path = log_path(config, data_dir, env::var_os("DEBUG").is_some());
    let file = path.and_then(|path| match open_log_file(&path) {
        Ok(file) => Some(file),
        Err(err) => {
            eprintln!("log_file_error: {err}");
            None
        }
    });
    match file {
        Some(file) => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::sink)
                .try_init();
        }
    }
}

fn log_path(config: &Config, data_dir: &Path, debug: bool) -> Option<PathBuf> {
    match &config.log_file {
        Some(path) if path.is_absolute() => Some(path.clone()),
        Some(path) => Some(data_dir.join(path)),
        None if debug => Some(data_dir.join("debug.log")),
        None => None,
    }
}

fn open_log_file(path: &Path) -> io::Result<fs::File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

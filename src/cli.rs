use crate::model::EntityKind;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "punch", version, about = "Terminal time tracker with timers, entries and tags")]
pub struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Database file to use instead of the configured one
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindArg {
    Entry,
    Timer,
    Tag,
}

impl From<KindArg> for EntityKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Entry => EntityKind::Entry,
            KindArg::Timer => EntityKind::Timer,
            KindArg::Tag => EntityKind::Tag,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Entries,
    Timers,
    Tags,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start a timer
    Start {
        /// Name of the timer
        name: String,
        /// Tags for the timer (repeatable)
        #[arg(long = "tag", short = 't')]
        tags: Vec<String>,
    },
    /// Stop a running timer and record it as an entry
    Stop {
        /// Name of the running timer
        name: String,
    },
    /// Create an entry, timer or tag
    Create {
        #[arg(value_enum)]
        kind: KindArg,
        /// Name of the new record
        #[arg(long)]
        name: String,
        /// Optional description (entries only)
        #[arg(long)]
        description: Option<String>,
        /// Start time in YYYY-MM-DD HH:MM:SS local time
        #[arg(long)]
        start: Option<String>,
        /// End time in YYYY-MM-DD HH:MM:SS local time (entries only)
        #[arg(long)]
        end: Option<String>,
        /// Tags (repeatable)
        #[arg(long = "tag", short = 't')]
        tags: Vec<String>,
    },
    /// Edit an existing entry
    Edit {
        /// Entry id to edit
        #[arg(long)]
        id: i64,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New description
        #[arg(long)]
        description: Option<String>,
        /// New start time (YYYY-MM-DD HH:MM:SS)
        #[arg(long)]
        start: Option<String>,
        /// New end time (YYYY-MM-DD HH:MM:SS)
        #[arg(long)]
        end: Option<String>,
        /// Replace tags (repeatable)
        #[arg(long = "tag", short = 't')]
        tags: Vec<String>,
        /// Clear existing tags
        #[arg(long)]
        clear_tags: bool,
    },
    /// Delete a record by id
    Del {
        /// Id of the record
        id: i64,
        /// Kind of record to delete
        #[arg(long, value_enum, default_value = "entry")]
        kind: KindArg,
    },
    /// Print entries, running timers or tags
    #[command(alias = "list")]
    Read {
        /// Collection to print
        #[arg(long = "type", short = 't', value_enum, default_value = "timers")]
        collection: Collection,
        /// Print as YAML
        #[arg(long)]
        yaml: bool,
    },
    /// Launch the interactive TUI
    Tui,
}

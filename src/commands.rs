use crate::cli::{Collection, KindArg};
use crate::model::{EntityKind, Entry, EntryEdit, NewEntry, StoreError, Tag, Timer};
use crate::store::{SqliteStore, Store};
use crate::ui::{self, format_duration, format_local, parse_local};
use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::info;

pub fn start(store: &impl Store, name: String, tags: Vec<String>) -> Result<()> {
    store
        .create_timer(&name, &tags)
        .with_context(|| format!("starting timer {}", name))?;
    info!(name = %name, "timer started");
    println!("Started timer {}", name);
    Ok(())
}

pub fn stop(store: &impl Store, name: String) -> Result<()> {
    let entry_id = store
        .stop_timer(&name)
        .with_context(|| format!("stopping timer {}", name))?;
    info!(name = %name, entry_id, "timer stopped");
    println!("Stopped timer {} (entry {})", name, entry_id);
    Ok(())
}

pub struct CreateArgs {
    pub name: String,
    pub description: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub tags: Vec<String>,
}

pub fn create(store: &impl Store, kind: KindArg, args: CreateArgs) -> Result<()> {
    match EntityKind::from(kind) {
        EntityKind::Entry => {
            let start = required_time("--start", args.start.as_deref())?;
            let end = required_time("--end", args.end.as_deref())?;
            let id = store
                .create_entry(&NewEntry {
                    name: args.name,
                    description: args.description,
                    start,
                    end,
                    tags: args.tags,
                })
                .context("creating entry")?;
            println!("Created entry {}", id);
        }
        EntityKind::Timer => {
            if args.end.is_some() {
                bail!("timers have no end time; use `punch stop` instead");
            }
            let start = optional_time(args.start.as_deref())?.unwrap_or_else(Utc::now);
            store
                .create_timer_at(&args.name, &args.tags, start)
                .with_context(|| format!("starting timer {}", args.name))?;
            println!("Started timer {}", args.name);
        }
        EntityKind::Tag => {
            store
                .create_tag(&args.name)
                .with_context(|| format!("creating tag {}", args.name))?;
            println!("Created tag {}", args.name);
        }
    }
    Ok(())
}

pub struct EditArgs {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub tags: Vec<String>,
    pub clear_tags: bool,
}

pub fn edit(store: &impl Store, id: i64, args: EditArgs) -> Result<()> {
    let current = store
        .list_entries()
        .context("loading entries")?
        .into_iter()
        .find(|entry| entry.id == id)
        .ok_or(StoreError::NotFound {
            kind: EntityKind::Entry,
            id,
        })?;

    let tags = if args.clear_tags {
        Vec::new()
    } else if args.tags.is_empty() {
        current.tags
    } else {
        args.tags
    };
    let edit = EntryEdit {
        name: args.name.unwrap_or(current.name),
        description: args.description.or(current.description),
        start: optional_time(args.start.as_deref())?.unwrap_or(current.start),
        end: optional_time(args.end.as_deref())?.unwrap_or(current.end),
        tags,
    };
    store
        .edit_entry(id, &edit)
        .with_context(|| format!("editing entry {}", id))?;
    println!("Updated entry {}", id);
    Ok(())
}

pub fn delete(store: &impl Store, id: i64, kind: KindArg) -> Result<()> {
    let kind = EntityKind::from(kind);
    let result = match kind {
        EntityKind::Entry => store.delete_entry(id),
        EntityKind::Timer => store.delete_timer(id),
        EntityKind::Tag => store.delete_tag(id),
    };
    result.with_context(|| format!("deleting {} {}", kind, id))?;
    info!(%kind, id, "deleted");
    println!("Deleted {} {}", kind, id);
    Ok(())
}

pub fn read(store: &impl Store, collection: Collection, yaml: bool) -> Result<()> {
    print!("{}", render_collection(store, collection, yaml)?);
    Ok(())
}

pub fn tui(store: SqliteStore, tick_rate: Duration) -> Result<()> {
    ui::run(store, tick_rate)
}

fn render_collection(store: &impl Store, collection: Collection, yaml: bool) -> Result<String> {
    let out = match collection {
        Collection::Entries => {
            let entries = store.list_entries().context("loading entries")?;
            if yaml {
                serde_yaml::to_string(&entries).context("serializing entries")?
            } else {
                lines(&entries, "no entries", entry_line)
            }
        }
        Collection::Timers => {
            let timers = store.list_timers().context("loading timers")?;
            if yaml {
                serde_yaml::to_string(&timers).context("serializing timers")?
            } else {
                let now = Utc::now();
                lines(&timers, "no running timers", |t| timer_line(t, now))
            }
        }
        Collection::Tags => {
            let tags = store.list_tags().context("loading tags")?;
            if yaml {
                serde_yaml::to_string(&tags).context("serializing tags")?
            } else {
                lines(&tags, "no tags", tag_line)
            }
        }
    };
    Ok(out)
}

fn lines<T>(items: &[T], empty: &str, line: impl Fn(&T) -> String) -> String {
    if items.is_empty() {
        return format!("({})\n", empty);
    }
    items.iter().map(|item| line(item) + "\n").collect()
}

fn entry_line(entry: &Entry) -> String {
    let mut line = format!(
        "{:>4}  {}  {} → {}  {}",
        entry.id,
        entry.name,
        format_local(entry.start),
        format_local(entry.end),
        format_duration(entry.duration())
    );
    push_tags(&mut line, &entry.tags);
    if let Some(description) = &entry.description {
        line.push_str(&format!("  {}", description));
    }
    line
}

fn timer_line(timer: &Timer, now: DateTime<Utc>) -> String {
    let mut line = format!(
        "{:>4}  {}  since {}  {}",
        timer.id,
        timer.name,
        format_local(timer.start),
        format_duration(now - timer.start)
    );
    push_tags(&mut line, &timer.tags);
    line
}

fn tag_line(tag: &Tag) -> String {
    format!("{:>4}  #{}", tag.id, tag.name)
}

fn push_tags(line: &mut String, tags: &[String]) {
    if !tags.is_empty() {
        line.push_str(&format!("  #{}", tags.join(" #")));
    }
}

fn required_time(flag: &str, input: Option<&str>) -> Result<DateTime<Utc>> {
    optional_time(input)?.ok_or_else(|| anyhow!("{} is required for entries", flag))
}

fn optional_time(input: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    match input {
        None => Ok(None),
        Some(raw) => parse_local(raw)
            .map(Some)
            .map_err(|msg| anyhow!("invalid time {:?}: {}", raw, msg)),
    }
}

use crate::model::{
    validate_name, validate_span, EntityKind, Entry, EntryEdit, EntryId, NewEntry, StoreError,
    Tag, TagId, Timer, TimerId,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Transaction};
use std::fs;
use std::path::Path;
use tracing::debug;

pub type StoreResult<T> = Result<T, StoreError>;

const SCHEMA_VERSION: i32 = 1;

/// Persistence contract consumed by the commands and the interactive UI.
///
/// Every call is its own unit of work. Operations that touch several tables
/// (stopping a timer, attaching tags) are transactional inside the
/// implementation, never across calls.
pub trait Store {
    fn list_entries(&self) -> StoreResult<Vec<Entry>>;
    /// Running timers only.
    fn list_timers(&self) -> StoreResult<Vec<Timer>>;
    fn list_tags(&self) -> StoreResult<Vec<Tag>>;

    fn create_entry(&self, entry: &NewEntry) -> StoreResult<EntryId>;
    fn edit_entry(&self, id: EntryId, edit: &EntryEdit) -> StoreResult<()>;
    fn delete_entry(&self, id: EntryId) -> StoreResult<()>;

    fn create_timer_at(
        &self,
        name: &str,
        tags: &[String],
        start: DateTime<Utc>,
    ) -> StoreResult<()>;
    /// Converts the running timer `name` into an entry ending at `end`.
    fn stop_timer_at(&self, name: &str, end: DateTime<Utc>) -> StoreResult<EntryId>;
    fn edit_timer(&self, id: TimerId, name: &str, tags: &[String]) -> StoreResult<()>;
    fn delete_timer(&self, id: TimerId) -> StoreResult<()>;

    fn create_tag(&self, name: &str) -> StoreResult<()>;
    fn rename_tag(&self, id: TagId, name: &str) -> StoreResult<()>;
    fn delete_tag(&self, id: TagId) -> StoreResult<()>;

    fn create_timer(&self, name: &str, tags: &[String]) -> StoreResult<()> {
        self.create_timer_at(name, tags, Utc::now())
    }

    fn stop_timer(&self, name: &str) -> StoreResult<EntryId> {
        self.stop_timer_at(name, Utc::now())
    }

    fn tag_names(&self) -> StoreResult<Vec<String>> {
        Ok(self.list_tags()?.into_iter().map(|t| t.name).collect())
    }
}

impl<S: Store + ?Sized> Store for &S {
    fn list_entries(&self) -> StoreResult<Vec<Entry>> {
        (**self).list_entries()
    }
    fn list_timers(&self) -> StoreResult<Vec<Timer>> {
        (**self).list_timers()
    }
    fn list_tags(&self) -> StoreResult<Vec<Tag>> {
        (**self).list_tags()
    }
    fn create_entry(&self, entry: &NewEntry) -> StoreResult<EntryId> {
        (**self).create_entry(entry)
    }
    fn edit_entry(&self, id: EntryId, edit: &EntryEdit) -> StoreResult<()> {
        (**self).edit_entry(id, edit)
    }
    fn delete_entry(&self, id: EntryId) -> StoreResult<()> {
        (**self).delete_entry(id)
    }
    fn create_timer_at(
        &self,
        name: &str,
        tags: &[String],
        start: DateTime<Utc>,
    ) -> StoreResult<()> {
        (**self).create_timer_at(name, tags, start)
    }
    fn stop_timer_at(&self, name: &str, end: DateTime<Utc>) -> StoreResult<EntryId> {
        (**self).stop_timer_at(name, end)
    }
    fn edit_timer(&self, id: TimerId, name: &str, tags: &[String]) -> StoreResult<()> {
        (**self).edit_timer(id, name, tags)
    }
    fn delete_timer(&self, id: TimerId) -> StoreResult<()> {
        (**self).delete_timer(id)
    }
    fn create_tag(&self, name: &str) -> StoreResult<()> {
        (**self).create_tag(name)
    }
    fn rename_tag(&self, id: TagId, name: &str) -> StoreResult<()> {
        (**self).rename_tag(id, name)
    }
    fn delete_tag(&self, id: TagId) -> StoreResult<()> {
        (**self).delete_tag(id)
    }
}

pub struct SqliteStore {
    conn: Connection,
}

#[derive(Copy, Clone)]
enum TagLink {
    Entry,
    Timer,
}

impl TagLink {
    fn table(self) -> &'static str {
        match self {
            TagLink::Entry => "entry_tags",
            TagLink::Timer => "timer_tags",
        }
    }

    fn owner_column(self) -> &'static str {
        match self {
            TagLink::Entry => "entry_id",
            TagLink::Timer => "timer_id",
        }
    }
}

impl SqliteStore {
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        debug!(path = %path.display(), "opened sqlite store");
        Self::with_connection(conn)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let store = SqliteStore { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> StoreResult<()> {
        let version: i32 = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))?;
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                description TEXT,
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS timers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                start_time TEXT NOT NULL,
                is_running BOOLEAN NOT NULL DEFAULT 1
            );

            CREATE TABLE IF NOT EXISTS tags (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS entry_tags (
                entry_id INTEGER NOT NULL REFERENCES entries(id) ON DELETE CASCADE,
                tag_id INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
                PRIMARY KEY (entry_id, tag_id)
            );

            CREATE TABLE IF NOT EXISTS timer_tags (
                timer_id INTEGER NOT NULL REFERENCES timers(id) ON DELETE CASCADE,
                tag_id INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
                PRIMARY KEY (timer_id, tag_id)
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_timers_running_name
                ON timers(name) WHERE is_running = 1;
            CREATE INDEX IF NOT EXISTS idx_entries_start ON entries(start_time);
            "#,
        )?;
        if version != SCHEMA_VERSION {
            self.conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
            debug!(from = version, to = SCHEMA_VERSION, "initialized schema");
        }
        Ok(())
    }

    fn transaction(&self) -> StoreResult<Transaction<'_>> {
        Ok(self.conn.unchecked_transaction()?)
    }
}

impl Store for SqliteStore {
    fn list_entries(&self) -> StoreResult<Vec<Entry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, description, start_time, end_time FROM entries \
             ORDER BY start_time, id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Entry {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
                start: row.get(3)?,
                end: row.get(4)?,
                tags: Vec::new(),
            })
        })?;
        let mut entries = rows.collect::<Result<Vec<_>, _>>()?;
        for entry in &mut entries {
            entry.tags = tags_for(&self.conn, TagLink::Entry, entry.id)?;
        }
        Ok(entries)
    }

    fn list_timers(&self) -> StoreResult<Vec<Timer>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, start_time FROM timers WHERE is_running = 1 \
             ORDER BY start_time, id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Timer {
                id: row.get(0)?,
                name: row.get(1)?,
                start: row.get(2)?,
                tags: Vec::new(),
            })
        })?;
        let mut timers = rows.collect::<Result<Vec<_>, _>>()?;
        for timer in &mut timers {
            timer.tags = tags_for(&self.conn, TagLink::Timer, timer.id)?;
        }
        Ok(timers)
    }

    fn list_tags(&self) -> StoreResult<Vec<Tag>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM tags ORDER BY name, id")?;
        let rows = stmt.query_map([], |row| {
            Ok(Tag {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn create_entry(&self, entry: &NewEntry) -> StoreResult<EntryId> {
        validate_span(&entry.name, entry.start, entry.end)?;
        let tx = self.transaction()?;
        tx.execute(
            "INSERT INTO entries (name, description, start_time, end_time) VALUES (?1, ?2, ?3, ?4)",
            params![
                entry.name.trim(),
                normalize_description(entry.description.as_deref()),
                entry.start,
                entry.end
            ],
        )?;
        let id = tx.last_insert_rowid();
        link_tags(&tx, TagLink::Entry, id, &entry.tags)?;
        tx.commit()?;
        debug!(id, name = %entry.name, "created entry");
        Ok(id)
    }

    fn edit_entry(&self, id: EntryId, edit: &EntryEdit) -> StoreResult<()> {
        validate_span(&edit.name, edit.start, edit.end)?;
        let tx = self.transaction()?;
        let changed = tx.execute(
            "UPDATE entries SET name = ?1, description = ?2, start_time = ?3, end_time = ?4 \
             WHERE id = ?5",
            params![
                edit.name.trim(),
                normalize_description(edit.description.as_deref()),
                edit.start,
                edit.end,
                id
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound {
                kind: EntityKind::Entry,
                id,
            });
        }
        tx.execute("DELETE FROM entry_tags WHERE entry_id = ?1", params![id])?;
        link_tags(&tx, TagLink::Entry, id, &edit.tags)?;
        tx.commit()?;
        debug!(id, "edited entry");
        Ok(())
    }

    fn delete_entry(&self, id: EntryId) -> StoreResult<()> {
        delete_row(&self.conn, EntityKind::Entry, id)
    }

    fn create_timer_at(
        &self,
        name: &str,
        tags: &[String],
        start: DateTime<Utc>,
    ) -> StoreResult<()> {
        validate_name(name)?;
        let name = name.trim();
        let tx = self.transaction()?;
        if running_timer(&tx, name)?.is_some() {
            return Err(StoreError::TimerAlreadyRunning(name.to_string()));
        }
        tx.execute(
            "INSERT INTO timers (name, start_time, is_running) VALUES (?1, ?2, 1)",
            params![name, start],
        )
        .map_err(|err| running_conflict(err, name))?;
        let id = tx.last_insert_rowid();
        link_tags(&tx, TagLink::Timer, id, tags)?;
        tx.commit()?;
        debug!(id, name, "started timer");
        Ok(())
    }

    fn stop_timer_at(&self, name: &str, end: DateTime<Utc>) -> StoreResult<EntryId> {
        let name = name.trim();
        let tx = self.transaction()?;
        let (timer_id, start) = running_timer(&tx, name)?
            .ok_or_else(|| StoreError::TimerNotRunning(name.to_string()))?;
        validate_span(name, start, end)?;
        let tags = tags_for(&tx, TagLink::Timer, timer_id)?;
        tx.execute(
            "INSERT INTO entries (name, description, start_time, end_time) VALUES (?1, NULL, ?2, ?3)",
            params![name, start, end],
        )?;
        let entry_id = tx.last_insert_rowid();
        link_tags(&tx, TagLink::Entry, entry_id, &tags)?;
        tx.execute(
            "UPDATE timers SET is_running = 0 WHERE id = ?1",
            params![timer_id],
        )?;
        tx.commit()?;
        debug!(timer_id, entry_id, name, "stopped timer");
        Ok(entry_id)
    }

    fn edit_timer(&self, id: TimerId, name: &str, tags: &[String]) -> StoreResult<()> {
        validate_name(name)?;
        let name = name.trim();
        let tx = self.transaction()?;
        if let Some((other, _)) = running_timer(&tx, name)? {
            if other != id {
                return Err(StoreError::TimerAlreadyRunning(name.to_string()));
            }
        }
        let changed = tx
            .execute(
                "UPDATE timers SET name = ?1 WHERE id = ?2 AND is_running = 1",
                params![name, id],
            )
            .map_err(|err| running_conflict(err, name))?;
        if changed == 0 {
            return Err(StoreError::NotFound {
                kind: EntityKind::Timer,
                id,
            });
        }
        tx.execute("DELETE FROM timer_tags WHERE timer_id = ?1", params![id])?;
        link_tags(&tx, TagLink::Timer, id, tags)?;
        tx.commit()?;
        debug!(id, name, "edited timer");
        Ok(())
    }

    fn delete_timer(&self, id: TimerId) -> StoreResult<()> {
        delete_row(&self.conn, EntityKind::Timer, id)
    }

    fn create_tag(&self, name: &str) -> StoreResult<()> {
        validate_name(name)?;
        let name = name.trim();
        self.conn
            .execute("INSERT INTO tags (name) VALUES (?1)", params![name])
            .map_err(|err| duplicate_tag(err, name))?;
        debug!(name, "created tag");
        Ok(())
    }

    fn rename_tag(&self, id: TagId, name: &str) -> StoreResult<()> {
        validate_name(name)?;
        let name = name.trim();
        let changed = self
            .conn
            .execute("UPDATE tags SET name = ?1 WHERE id = ?2", params![name, id])
            .map_err(|err| duplicate_tag(err, name))?;
        if changed == 0 {
            return Err(StoreError::NotFound {
                kind: EntityKind::Tag,
                id,
            });
        }
        debug!(id, name, "renamed tag");
        Ok(())
    }

    fn delete_tag(&self, id: TagId) -> StoreResult<()> {
        delete_row(&self.conn, EntityKind::Tag, id)
    }
}

fn running_timer(conn: &Connection, name: &str) -> StoreResult<Option<(TimerId, DateTime<Utc>)>> {
    Ok(conn
        .query_row(
            "SELECT id, start_time FROM timers WHERE is_running = 1 AND name = ?1",
            params![name],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?)
}

fn tags_for(conn: &Connection, link: TagLink, owner: i64) -> StoreResult<Vec<String>> {
    let sql = format!(
        "SELECT t.name FROM tags t INNER JOIN {table} l ON t.id = l.tag_id \
         WHERE l.{owner_col} = ?1 ORDER BY t.name",
        table = link.table(),
        owner_col = link.owner_column(),
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![owner], |row| row.get(0))?;
    Ok(rows.collect::<Result<Vec<String>, _>>()?)
}

/// Attaches `tags` to `owner`, creating any tag that does not exist yet.
fn link_tags(conn: &Connection, link: TagLink, owner: i64, tags: &[String]) -> StoreResult<()> {
    let sql = format!(
        "INSERT OR IGNORE INTO {table} ({owner_col}, tag_id) VALUES (?1, ?2)",
        table = link.table(),
        owner_col = link.owner_column(),
    );
    for tag in tags {
        let tag = tag.trim();
        if tag.is_empty() {
            continue;
        }
        conn.execute("INSERT OR IGNORE INTO tags (name) VALUES (?1)", params![tag])?;
        let tag_id: TagId =
            conn.query_row("SELECT id FROM tags WHERE name = ?1", params![tag], |row| {
                row.get(0)
            })?;
        conn.execute(&sql, params![owner, tag_id])?;
    }
    Ok(())
}

fn delete_row(conn: &Connection, kind: EntityKind, id: i64) -> StoreResult<()> {
    let sql = match kind {
        EntityKind::Entry => "DELETE FROM entries WHERE id = ?1",
        EntityKind::Timer => "DELETE FROM timers WHERE id = ?1",
        EntityKind::Tag => "DELETE FROM tags WHERE id = ?1",
    };
    let changed = conn.execute(sql, params![id])?;
    if changed == 0 {
        return Err(StoreError::NotFound { kind, id });
    }
    debug!(%kind, id, "deleted row");
    Ok(())
}

fn normalize_description(description: Option<&str>) -> Option<&str> {
    description.map(str::trim).filter(|d| !d.is_empty())
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

fn running_conflict(err: rusqlite::Error, name: &str) -> StoreError {
    if is_constraint_violation(&err) {
        StoreError::TimerAlreadyRunning(name.to_string())
    } else {
        StoreError::Unavailable(err)
    }
}

fn duplicate_tag(err: rusqlite::Error, name: &str) -> StoreError {
    if is_constraint_violation(&err) {
        StoreError::DuplicateTag(name.to_string())
    } else {
        StoreError::Unavailable(err)
    }
}

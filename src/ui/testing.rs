//! Store double for UI tests: a real in-memory SQLite store that can be told
//! to fail every call and that counts writes.

use crate::model::{Entry, EntryEdit, EntryId, NewEntry, StoreError, Tag, TagId, Timer, TimerId};
use crate::store::{SqliteStore, Store, StoreResult};
use chrono::{DateTime, TimeZone, Utc};
use std::cell::Cell;

pub fn ts(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 6, hour, minute, 0).unwrap()
}

pub struct FlakyStore {
    pub inner: SqliteStore,
    failing: Cell<bool>,
    writes: Cell<usize>,
}

impl FlakyStore {
    pub fn new() -> Self {
        FlakyStore {
            inner: SqliteStore::open_in_memory().unwrap(),
            failing: Cell::new(false),
            writes: Cell::new(0),
        }
    }

    pub fn fail(&self, failing: bool) {
        self.failing.set(failing);
    }

    pub fn writes(&self) -> usize {
        self.writes.get()
    }

    fn check(&self) -> StoreResult<()> {
        if self.failing.get() {
            return Err(StoreError::Unavailable(rusqlite::Error::InvalidQuery));
        }
        Ok(())
    }

    fn write(&self) -> StoreResult<()> {
        self.check()?;
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}

impl Store for FlakyStore {
    fn list_entries(&self) -> StoreResult<Vec<Entry>> {
        self.check()?;
        self.inner.list_entries()
    }
    fn list_timers(&self) -> StoreResult<Vec<Timer>> {
        self.check()?;
        self.inner.list_timers()
    }
    fn list_tags(&self) -> StoreResult<Vec<Tag>> {
        self.check()?;
        self.inner.list_tags()
    }
    fn create_entry(&self, entry: &NewEntry) -> StoreResult<EntryId> {
        self.write()?;
        self.inner.create_entry(entry)
    }
    fn edit_entry(&self, id: EntryId, edit: &EntryEdit) -> StoreResult<()> {
        self.write()?;
        self.inner.edit_entry(id, edit)
    }
    fn delete_entry(&self, id: EntryId) -> StoreResult<()> {
        self.write()?;
        self.inner.delete_entry(id)
    }
    fn create_timer_at(
        &self,
        name: &str,
        tags: &[String],
        start: DateTime<Utc>,
    ) -> StoreResult<()> {
        self.write()?;
        self.inner.create_timer_at(name, tags, start)
    }
    fn stop_timer_at(&self, name: &str, end: DateTime<Utc>) -> StoreResult<EntryId> {
        self.write()?;
        self.inner.stop_timer_at(name, end)
    }
    fn edit_timer(&self, id: TimerId, name: &str, tags: &[String]) -> StoreResult<()> {
        self.write()?;
        self.inner.edit_timer(id, name, tags)
    }
    fn delete_timer(&self, id: TimerId) -> StoreResult<()> {
        self.write()?;
        self.inner.delete_timer(id)
    }
    fn create_tag(&self, name: &str) -> StoreResult<()> {
        self.write()?;
        self.inner.create_tag(name)
    }
    fn rename_tag(&self, id: TagId, name: &str) -> StoreResult<()> {
        self.write()?;
        self.inner.rename_tag(id, name)
    }
    fn delete_tag(&self, id: TagId) -> StoreResult<()> {
        self.write()?;
        self.inner.delete_tag(id)
    }
}

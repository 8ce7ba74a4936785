use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type EntryId = i64;
pub type TimerId = i64;
pub type TagId = i64;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Entry {
    pub id: EntryId,
    pub name: String,
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Timer {
    pub id: TimerId,
    pub name: String,
    pub start: DateTime<Utc>,
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
}

/// Input for a directly created entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub name: String,
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub tags: Vec<String>,
}

/// Replacement values for an existing entry. Tags replace the previous set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryEdit {
    pub name: String,
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Entry,
    Timer,
    Tag,
}

impl EntityKind {
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Entry => "entry",
            EntityKind::Timer => "timer",
            EntityKind::Tag => "tag",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Validation,
    Conflict,
    Unavailable,
}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("name cannot be empty")]
    EmptyName,
    #[error("end time cannot be before start time")]
    EndBeforeStart,
    #[error("timer is already running for task: {0}")]
    TimerAlreadyRunning(String),
    #[error("no running timer named {0}")]
    TimerNotRunning(String),
    #[error("tag already exists: {0}")]
    DuplicateTag(String),
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: i64 },
    #[error("store unavailable: {0}")]
    Unavailable(#[from] rusqlite::Error),
    #[error("store unavailable: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub fn class(&self) -> ErrorClass {
        match self {
            StoreError::EmptyName | StoreError::EndBeforeStart => ErrorClass::Validation,
            StoreError::TimerAlreadyRunning(_)
            | StoreError::TimerNotRunning(_)
            | StoreError::DuplicateTag(_)
            | StoreError::NotFound { .. } => ErrorClass::Conflict,
            StoreError::Unavailable(_) | StoreError::Io(_) => ErrorClass::Unavailable,
        }
    }
}

impl Entry {
    pub fn duration(&self) -> chrono::Duration {
        self.end - self.start
    }
}

/// Checks shared by every write path that accepts a name and a time span.
pub fn validate_span(
    name: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<(), StoreError> {
    validate_name(name)?;
    if end < start {
        return Err(StoreError::EndBeforeStart);
    }
    Ok(())
}

pub fn validate_name(name: &str) -> Result<(), StoreError> {
    if name.trim().is_empty() {
        return Err(StoreError::EmptyName);
    }
    Ok(())
}

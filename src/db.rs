use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode};
use thiserror::Error;

use crate::models::Event;
use crate::utils;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("event already stored: {0}")]
    Conflict(String),
    #[error("event rejected: {0}")]
    Validation(String),
    #[error("store error: {0}")]
    Backend(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(inner, _)
                if inner.code == ErrorCode::ConstraintViolation =>
            {
                StoreError::Conflict(err.to_string())
            }
            _ => StoreError::Backend(err.to_string()),
        }
    }
}

/// Where accepted events go.
pub trait EventStore {
    /// Titles already stored, used to seed deduplication.
    fn existing_titles(&self) -> Result<Vec<String>, StoreError>;

    fn insert_event(&mut self, event: &Event) -> Result<(), StoreError>;
}

impl<T: EventStore + ?Sized> EventStore for Box<T> {
    fn existing_titles(&self) -> Result<Vec<String>, StoreError> {
        (**self).existing_titles()
    }

    fn insert_event(&mut self, event: &Event) -> Result<(), StoreError> {
        (**self).insert_event(event)
    }
}

impl<T: EventStore + ?Sized> EventStore for &mut T {
    fn existing_titles(&self) -> Result<Vec<String>, StoreError> {
        (**self).existing_titles()
    }

    fn insert_event(&mut self, event: &Event) -> Result<(), StoreError> {
        (**self).insert_event(event)
    }
}

/// Checks shared by every store before anything is written.
pub fn validate(event: &Event) -> Result<(), StoreError> {
    if event.id.trim().is_empty() {
        return Err(StoreError::Validation("empty id".into()));
    }
    if event.title.trim().is_empty() {
        return Err(StoreError::Validation(format!("empty title for {}", event.id)));
    }
    if !event.coordinates.is_valid() {
        return Err(StoreError::Validation(format!(
            "invalid coordinates for {}",
            event.id
        )));
    }
    Ok(())
}

/// Local SQLite event store.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        utils::ensure_parent(path);
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> rusqlite::Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS events(
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                category TEXT NOT NULL,
                event_type TEXT NOT NULL,
                city TEXT NOT NULL,
                event_date TEXT,
                payload TEXT NOT NULL,
                created_at_utc TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS events_city ON events(city);",
        )?;
        Ok(())
    }

    pub fn get_event(&self, id: &str) -> Result<Event, StoreError> {
        let payload: String = self.conn.query_row(
            "SELECT payload FROM events WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        serde_json::from_str(&payload).map_err(|err| StoreError::Backend(err.to_string()))
    }

    pub fn count_events(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

impl EventStore for Store {
    fn existing_titles(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.conn.prepare("SELECT title FROM events")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn insert_event(&mut self, event: &Event) -> Result<(), StoreError> {
        validate(event)?;
        let payload =
            serde_json::to_string(event).map_err(|err| StoreError::Validation(err.to_string()))?;
        self.conn.execute(
            "INSERT INTO events (id, title, category, event_type, city, event_date, payload, created_at_utc)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                event.id,
                event.title,
                event.category.label(),
                event.event_type.label(),
                event.city,
                event.date.map(|d| d.to_string()),
                payload,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

//! SQLite Store
//!
//! Relational source of truth for dogs, backed by a single `dog` table.
//! Statements are parameterized; correctness under concurrent writes relies
//! on SQLite's own transactions.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, types::Type, Connection, OptionalExtension, Row};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ResourceNotFoundError;
use crate::models::{Dog, DogBreed, Dogs};
use crate::sources::{DogReadStore, DogStore, StoreError, StoreResult};

const DOG_COLUMNS: &str = "id, name, breed, birth_date, owner_id";

// == SQLite Store ==
/// Dog storage in a SQLite database.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens or creates the database at `path` and migrates the schema.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Opening dog database");
        Self::from_connection(Connection::open(path)?)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Wraps an existing connection and migrates the schema.
    pub fn from_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(&schema_sql())?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Returns the number of rows in the `dog` table.
    pub fn count(&self) -> StoreResult<usize> {
        let count: i64 = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM dog", [], |row| row.get(0))?;
        Ok(count.max(0) as usize)
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

/// Schema migration. The CHECK constraints reject empty names and breeds
/// outside [`DogBreed`].
fn schema_sql() -> String {
    let breeds = DogBreed::ALL
        .iter()
        .map(|breed| format!("'{}'", breed.as_str()))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        r#"
        CREATE TABLE IF NOT EXISTS dog (
            id TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL CHECK (length(name) > 0),
            breed TEXT NOT NULL CHECK (breed IN ({breeds})),
            birth_date TEXT NOT NULL,
            owner_id TEXT NOT NULL
        );
        "#
    )
}

fn conversion_error(
    column: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(err))
}

fn row_to_dog(row: &Row<'_>) -> rusqlite::Result<Dog> {
    let id: String = row.get(0)?;
    let breed: String = row.get(2)?;
    Ok(Dog {
        id: Uuid::parse_str(&id).map_err(|e| conversion_error(0, e))?,
        name: row.get(1)?,
        breed: breed.parse().map_err(|e| conversion_error(2, e))?,
        birth_date: row.get::<_, DateTime<Utc>>(3)?,
        owner_id: row.get(4)?,
    })
}

// The driver's no-rows sentinel is turned into `None` by `optional()`.
fn select_dog(conn: &Connection, id: Uuid) -> StoreResult<Dog> {
    let sql = format!("SELECT {DOG_COLUMNS} FROM dog WHERE dog.id = ?1");
    conn.query_row(&sql, params![id.to_string()], row_to_dog)
        .optional()?
        .ok_or_else(|| ResourceNotFoundError::dog(id).into())
}

impl DogReadStore for SqliteStore {
    fn fetch_dogs(&self) -> StoreResult<Dogs> {
        let conn = self.conn()?;
        let sql = format!("SELECT {DOG_COLUMNS} FROM dog ORDER BY rowid");
        let mut stmt = conn.prepare(&sql)?;
        let dogs = stmt
            .query_map([], row_to_dog)?
            .collect::<rusqlite::Result<Dogs>>()?;
        debug!(count = dogs.len(), "Fetched dogs from database");
        Ok(dogs)
    }
}

impl DogStore for SqliteStore {
    fn fetch_dog(&self, id: Uuid) -> StoreResult<Dog> {
        let conn = self.conn()?;
        select_dog(&conn, id)
    }

    fn create_dog(&self, mut dog: Dog) -> StoreResult<Dog> {
        dog.id = Uuid::new_v4();
        self.conn()?.execute(
            "INSERT INTO dog (id, name, breed, birth_date, owner_id) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                dog.id.to_string(),
                dog.name,
                dog.breed.as_str(),
                dog.birth_date,
                dog.owner_id,
            ],
        )?;
        Ok(dog)
    }

    // Owner is not part of the SET list: ownership is fixed at creation.
    fn update_dog(&self, dog: Dog) -> StoreResult<Dog> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "UPDATE dog SET name = ?1, breed = ?2, birth_date = ?3 WHERE dog.id = ?4",
            params![
                dog.name,
                dog.breed.as_str(),
                dog.birth_date,
                dog.id.to_string(),
            ],
        )?;
        if rows == 0 {
            return Err(ResourceNotFoundError::dog(dog.id).into());
        }
        select_dog(&conn, dog.id)
    }
}

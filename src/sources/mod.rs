//! Sources Module
//!
//! Storage contracts for dog resources and their implementations. Every
//! store takes `&self` and guards its own state, so one instance can be
//! shared across request tasks behind an `Arc`.
//!
//! - [`MemoryStore`] - process memory, also usable as a cache store
//! - [`SqliteStore`] - relational source of truth
//! - [`crate::cache::ReadThroughCache`] - composes a cache store and a read store

mod memory;
mod sqlite;

use thiserror::Error;
use uuid::Uuid;

use crate::error::ResourceNotFoundError;
use crate::models::{Dog, Dogs};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

// == Store Error ==
/// Failures raised by a store before the service layer classifies them.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No matching row or entry
    #[error(transparent)]
    NotFound(#[from] ResourceNotFoundError),

    /// The database driver reported a failure
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A store lock was poisoned by a panicking writer
    #[error("store lock poisoned")]
    Poisoned,

    /// The backing store could not be reached
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Convenience Result type for stores.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

// == Capabilities ==
/// Reads the whole dog collection.
pub trait DogReadStore: Send + Sync {
    fn fetch_dogs(&self) -> StoreResult<Dogs>;
}

/// A fast store that can hold a snapshot of the collection.
pub trait DogCacheStore: DogReadStore {
    /// Replaces the stored collection wholesale.
    fn save_dogs(&self, dogs: Dogs) -> StoreResult<()>;
}

/// Full read/write contract for dog resources.
pub trait DogStore: DogReadStore {
    /// Fetches one dog, or [`StoreError::NotFound`].
    fn fetch_dog(&self, id: Uuid) -> StoreResult<Dog>;

    /// Persists a new dog under a freshly assigned ID and returns it.
    fn create_dog(&self, dog: Dog) -> StoreResult<Dog>;

    /// Updates the dog with `dog.id`, or [`StoreError::NotFound`] if there
    /// is no such dog.
    fn update_dog(&self, dog: Dog) -> StoreResult<Dog>;
}

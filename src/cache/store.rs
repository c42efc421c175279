//! Read-Through Cache Store
//!
//! Serves the dog collection from a fast cache store while it is fresh and
//! refreshes it from the read store once the TTL has elapsed.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::models::{Dog, Dogs};
use crate::sources::{DogCacheStore, DogReadStore, DogStore, StoreError, StoreResult};

// == Cache Config ==
/// Constructor parameters for [`ReadThroughCache`].
#[derive(Debug)]
pub struct CacheConfig<C, R> {
    /// How long a refreshed snapshot is served before refetching
    pub ttl: Duration,
    /// Fast store holding the snapshot
    pub cache_store: C,
    /// Source of truth
    pub read_store: R,
}

// == Read-Through Cache ==
/// Composes a cache store and a read store.
///
/// Only the collection read is cached. Single-dog reads and writes go
/// straight to the read store; the snapshot catches up on the next refresh.
pub struct ReadThroughCache<C, R> {
    cache_store: C,
    read_store: R,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    /// When the snapshot was last refreshed, None before the first refresh.
    /// Held for the whole of a refresh so concurrent readers wait for it
    /// instead of hitting the read store themselves.
    updated_at: Mutex<Option<DateTime<Utc>>>,
}

impl<C, R> ReadThroughCache<C, R> {
    // == Constructor ==
    /// Creates a cache that has never been refreshed.
    ///
    /// # Arguments
    /// * `config` - TTL and the two composed stores
    /// * `clock` - Time source for freshness checks
    pub fn new(config: CacheConfig<C, R>, clock: Arc<dyn Clock>) -> Self {
        Self {
            cache_store: config.cache_store,
            read_store: config.read_store,
            ttl: config.ttl,
            clock,
            updated_at: Mutex::new(None),
        }
    }

    /// Time of the last successful refresh.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        *self.updated_at.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn cache_store(&self) -> &C {
        &self.cache_store
    }

    pub fn read_store(&self) -> &R {
        &self.read_store
    }

    // == Is Fresh ==
    /// A snapshot is fresh while `now < updated_at + ttl`. A clock that moved
    /// backwards keeps the snapshot fresh.
    fn is_fresh(&self, updated_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        match updated_at {
            Some(updated_at) => match (now - updated_at).to_std() {
                Ok(elapsed) => elapsed < self.ttl,
                Err(_) => true,
            },
            None => false,
        }
    }
}

impl<C, R> fmt::Debug for ReadThroughCache<C, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadThroughCache")
            .field("ttl", &self.ttl)
            .field("updated_at", &self.updated_at())
            .finish_non_exhaustive()
    }
}

impl<C: DogCacheStore, R: DogReadStore> DogReadStore for ReadThroughCache<C, R> {
    // == Fetch Dogs ==
    /// Returns the cached snapshot while fresh, otherwise refetches.
    ///
    /// If saving the refetched collection fails, the fresh data is still
    /// returned but `updated_at` is left alone, so the next call refetches.
    fn fetch_dogs(&self) -> StoreResult<Dogs> {
        let mut updated_at = self.updated_at.lock().map_err(|_| StoreError::Poisoned)?;

        if self.is_fresh(*updated_at, self.clock.now()) {
            debug!("Serving dogs from cache store");
            return self.cache_store.fetch_dogs();
        }

        let dogs = self.read_store.fetch_dogs()?;
        match self.cache_store.save_dogs(dogs.clone()) {
            Ok(()) => {
                let now = self.clock.now();
                *updated_at = Some(now);
                debug!(count = dogs.len(), updated_at = %now, "Refreshed dog cache");
            }
            Err(err) => {
                warn!(error = %err, "Failed to save dogs to cache store, serving fresh read");
            }
        }
        Ok(dogs)
    }
}

impl<C: DogCacheStore, R: DogStore> DogStore for ReadThroughCache<C, R> {
    fn fetch_dog(&self, id: Uuid) -> StoreResult<Dog> {
        self.read_store.fetch_dog(id)
    }

    fn create_dog(&self, dog: Dog) -> StoreResult<Dog> {
        self.read_store.create_dog(dog)
    }

    fn update_dog(&self, dog: Dog) -> StoreResult<Dog> {
        self.read_store.update_dog(dog)
    }
}

//! Memory Store
//!
//! Keeps the whole dog collection in process memory. Not a production
//! store; it exists to show stores are interchangeable and to back the
//! read-through cache.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use uuid::Uuid;

use crate::error::ResourceNotFoundError;
use crate::models::{Dog, Dogs};
use crate::sources::{DogCacheStore, DogReadStore, DogStore, StoreError, StoreResult};

// == Memory Store ==
/// In-memory dog storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    dogs: RwLock<Dogs>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with `dogs`.
    pub fn with_dogs(dogs: Dogs) -> Self {
        Self {
            dogs: RwLock::new(dogs),
        }
    }

    // == Length ==
    /// Returns the number of dogs held.
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.read()?.is_empty())
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Dogs>> {
        self.dogs.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Dogs>> {
        self.dogs.write().map_err(|_| StoreError::Poisoned)
    }
}

impl DogReadStore for MemoryStore {
    fn fetch_dogs(&self) -> StoreResult<Dogs> {
        Ok(self.read()?.clone())
    }
}

impl DogCacheStore for MemoryStore {
    fn save_dogs(&self, dogs: Dogs) -> StoreResult<()> {
        *self.write()? = dogs;
        Ok(())
    }
}

impl DogStore for MemoryStore {
    fn fetch_dog(&self, id: Uuid) -> StoreResult<Dog> {
        self.read()?
            .iter()
            .find(|dog| dog.id == id)
            .cloned()
            .ok_or_else(|| ResourceNotFoundError::dog(id).into())
    }

    fn create_dog(&self, mut dog: Dog) -> StoreResult<Dog> {
        dog.id = Uuid::new_v4();
        self.write()?.push(dog.clone());
        Ok(dog)
    }

    fn update_dog(&self, dog: Dog) -> StoreResult<Dog> {
        let mut dogs = self.write()?;
        let existing = dogs
            .iter_mut()
            .find(|existing| existing.id == dog.id)
            .ok_or_else(|| StoreError::from(ResourceNotFoundError::dog(dog.id)))?;
        *existing = dog.clone();
        Ok(dog)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DogBreed;
    use chrono::Utc;

    fn dog(name: &str) -> Dog {
        Dog::new(name, DogBreed::Chihuahua, Utc::now()).owned_by("owner")
    }

    #[test]
    fn test_store_new() {
        let store = MemoryStore::new();
        assert_eq!(store.len().unwrap(), 0);
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_save_replaces_collection() {
        let store = MemoryStore::with_dogs(vec![dog("Chihua")]);
        let replacement = vec![dog("Lola"), dog("Taco")];

        store.save_dogs(replacement.clone()).unwrap();

        assert_eq!(store.fetch_dogs().unwrap(), replacement);
    }

    #[test]
    fn test_create_assigns_id() {
        let store = MemoryStore::new();

        let created = store.create_dog(dog("Chihua")).unwrap();

        assert!(!created.id.is_nil());
        assert_eq!(store.fetch_dog(created.id).unwrap(), created);
    }

    #[test]
    fn test_fetch_nonexistent() {
        let store = MemoryStore::new();

        let result = store.fetch_dog(Uuid::new_v4());
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_update_replaces_dog() {
        let store = MemoryStore::new();
        let mut created = store.create_dog(dog("Chihua")).unwrap();

        created.name = "Lola".to_string();
        store.update_dog(created.clone()).unwrap();

        assert_eq!(store.fetch_dog(created.id).unwrap().name, "Lola");
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_update_nonexistent() {
        let store = MemoryStore::new();

        let result = store.update_dog(dog("Ghost"));
        assert!(matches!(result, Err(StoreError::NotFound(_))));
        assert!(store.is_empty().unwrap());
    }
}

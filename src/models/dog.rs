//! Dog Model
//!
//! The dog record, its breed enumeration, and the collection type handed
//! around by stores and services.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// == Dog Breed ==
/// Closed set of breeds a dog may have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DogBreed {
    Chihuahua,
}

impl DogBreed {
    /// Every breed, in declaration order.
    pub const ALL: [DogBreed; 1] = [DogBreed::Chihuahua];

    /// Returns the canonical name stored in the database and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            DogBreed::Chihuahua => "Chihuahua",
        }
    }
}

impl fmt::Display for DogBreed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a breed name is not part of [`DogBreed`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0} is not a valid Breed")]
pub struct UnknownBreed(pub String);

impl FromStr for DogBreed {
    type Err = UnknownBreed;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DogBreed::ALL
            .into_iter()
            .find(|breed| breed.as_str() == s)
            .ok_or_else(|| UnknownBreed(s.to_string()))
    }
}

// == Dog ==
/// A dog owned by a single user.
///
/// `id` is assigned by the store on creation. `owner_id` is stamped by the
/// service layer from the caller's identity and never taken from input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dog {
    pub id: Uuid,
    pub name: String,
    pub breed: DogBreed,
    pub birth_date: DateTime<Utc>,
    pub owner_id: String,
}

impl Dog {
    /// Builds a dog that has not been persisted yet (nil ID, no owner).
    pub fn new(name: impl Into<String>, breed: DogBreed, birth_date: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::nil(),
            name: name.into(),
            breed,
            birth_date,
            owner_id: String::new(),
        }
    }

    /// Sets the owner, consuming and returning the dog.
    pub fn owned_by(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = owner_id.into();
        self
    }
}

/// Ordered collection of dogs. Uniqueness is left to the store.
pub type Dogs = Vec<Dog>;

//! Request DTOs for the dog API
//!
//! Defines the structure of incoming HTTP request bodies.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{Resource, ValidationError};
use crate::models::{Dog, DogBreed};

/// Request body for creating or updating a dog
///
/// Identity and owner are never read from the body: the ID comes from the
/// path (or the store on create) and the owner from the caller.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DogInput {
    /// Display name, must not be empty
    pub name: String,
    /// Breed, one of [`DogBreed`]
    pub breed: DogBreed,
    /// Date of birth
    pub birth_date: DateTime<Utc>,
}

impl DogInput {
    /// Validates the request data
    ///
    /// Returns the validation error if any field fails, None if valid.
    pub fn validate(&self, resource_id: &str) -> Option<ValidationError> {
        let mut err = ValidationError::new("dog input failed validation", Resource::Dog, resource_id);
        if self.name.trim().is_empty() {
            err = err.with_validation("name", "required");
        }
        if err.is_empty() {
            None
        } else {
            Some(err)
        }
    }

    /// Converts the input into an unpersisted dog.
    pub fn into_dog(self) -> Dog {
        Dog::new(self.name, self.breed, self.birth_date)
    }

    /// Converts the input into a dog carrying an existing ID.
    pub fn into_dog_with_id(self, id: Uuid) -> Dog {
        let mut dog = self.into_dog();
        dog.id = id;
        dog
    }
}

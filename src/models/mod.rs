//! Domain models and API DTOs
//!
//! The dog and user records, plus the request/response bodies used for
//! serializing HTTP traffic.

pub mod dog;
pub mod requests;
pub mod responses;
pub mod user;

// Re-export commonly used types
pub use dog::{Dog, DogBreed, Dogs, UnknownBreed};
pub use requests::DogInput;
pub use responses::{ErrorItem, ErrorResponse, HealthResponse};
pub use user::User;

//! Bork - A dog registry API
//!
//! Serves owner-scoped dog records over REST and GraphQL, backed by SQLite
//! behind a read-through cache of the dog collection.

pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod models;
pub mod services;
pub mod sources;

pub use api::{create_router, AppState};
pub use config::Config;

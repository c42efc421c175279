//! API Module
//!
//! HTTP handlers and routing for the dog REST and GraphQL APIs.
//!
//! # Endpoints
//! - `GET /api/v1/healthcheck` - Health check
//! - `GET /api/v1/dogs` - List every dog
//! - `POST /api/v1/dogs` - Create a dog owned by the caller
//! - `GET /api/v1/dog/:dog_id` - Fetch one of the caller's dogs
//! - `PUT /api/v1/dog/:dog_id` - Update one of the caller's dogs
//! - `POST /api/graph/query` - GraphQL queries and mutations
//! - `GET /api/graph/playground` - GraphiQL, outside deployed environments

pub mod graphql;
pub mod handlers;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use crate::config::{BuildInfo, Config};
use crate::services::DogServices;
use crate::sources::DogStore;

pub use graphql::{create_schema, BorkSchema};
pub use handlers::*;
pub use routes::create_router;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Authorized dog operations
    pub services: DogServices,
    /// Reported by the health check
    pub build: BuildInfo,
    pub schema: BorkSchema,
    /// Whether the GraphiQL playground is served
    pub playground: bool,
}

impl AppState {
    /// Creates state over `store` with the playground enabled.
    pub fn new(store: Arc<dyn DogStore>, build: BuildInfo) -> Self {
        let services = DogServices::new(store);
        let schema = create_schema(services.clone());
        Self {
            services,
            build,
            schema,
            playground: true,
        }
    }

    /// Creates state from configuration. Deployed environments do not get
    /// the playground.
    pub fn from_config(store: Arc<dyn DogStore>, config: &Config) -> Self {
        Self {
            playground: !config.environment.deployed(),
            ..Self::new(store, config.build_info())
        }
    }
}

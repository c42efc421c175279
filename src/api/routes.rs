//! API Routes
//!
//! Configures the Axum router with the REST and GraphQL endpoints.

use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::graphql::{graphiql_handler, graphql_handler};
use super::handlers::{
    create_dog_handler, fetch_dog_handler, fetch_dogs_handler, health_handler,
    method_not_allowed_handler, not_found_handler, update_dog_handler,
};
use super::middleware::{fake_authorize_middleware, request_context_middleware};
use super::AppState;

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - Request context: trace ID and the "Request Complete" log line
/// - Fake authorization on the dog and GraphQL query routes
/// - CORS: Allows any origin
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let protected = Router::new()
        .route(
            "/api/v1/dogs",
            get(fetch_dogs_handler)
                .post(create_dog_handler)
                .fallback(method_not_allowed_handler),
        )
        .route(
            "/api/v1/dog/:dog_id",
            get(fetch_dog_handler)
                .put(update_dog_handler)
                .fallback(method_not_allowed_handler),
        )
        .route(
            "/api/graph/query",
            post(graphql_handler).fallback(method_not_allowed_handler),
        )
        .route_layer(from_fn(fake_authorize_middleware));

    let mut router = Router::new()
        .route(
            "/api/v1/healthcheck",
            get(health_handler).fallback(method_not_allowed_handler),
        )
        .merge(protected);

    if state.playground {
        router = router.route("/api/graph/playground", get(graphiql_handler));
    }

    router
        .fallback(not_found_handler)
        .layer(from_fn(request_context_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

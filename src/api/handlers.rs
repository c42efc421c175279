//! API Handlers
//!
//! HTTP request handlers for the REST endpoints. Each handler parses and
//! validates its input, calls the authorized dog services, and renders the
//! result or the classified error.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use super::AppState;
use crate::context::RequestContext;
use crate::error::{
    AppError, BadRequestError, MethodNotAllowedError, Resource, Result, UnknownRouteError,
    ValidationError,
};
use crate::models::{DogInput, HealthResponse};

/// Handler for GET /api/v1/healthcheck
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::pass(&state.build))
}

/// Handler for GET /api/v1/dogs
pub async fn fetch_dogs_handler(State(state): State<AppState>, ctx: RequestContext) -> Response {
    let result = state.services.fetch_dogs(&ctx);
    respond(&ctx, StatusCode::OK, result)
}

/// Handler for POST /api/v1/dogs
///
/// Responds 201 with the stored dog, owned by the caller.
pub async fn create_dog_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    body: std::result::Result<Json<DogInput>, JsonRejection>,
) -> Response {
    let result = parse_body(body).and_then(|input| {
        if let Some(err) = input.validate("") {
            return Err(err.into());
        }
        state.services.create_dog(&ctx, input.into_dog())
    });
    respond(&ctx, StatusCode::CREATED, result)
}

/// Handler for GET /api/v1/dog/:dog_id
pub async fn fetch_dog_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    dog_id: std::result::Result<Path<String>, PathRejection>,
) -> Response {
    let result = dog_id_from_path(dog_id, "GET dog params failed validation")
        .and_then(|id| state.services.fetch_dog(&ctx, id));
    respond(&ctx, StatusCode::OK, result)
}

/// Handler for PUT /api/v1/dog/:dog_id
pub async fn update_dog_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    dog_id: std::result::Result<Path<String>, PathRejection>,
    body: std::result::Result<Json<DogInput>, JsonRejection>,
) -> Response {
    let result = dog_id_from_path(dog_id, "PUT dog params failed validation").and_then(|id| {
        let input = parse_body(body)?;
        if let Some(err) = input.validate(&id.to_string()) {
            return Err(err.into());
        }
        state.services.update_dog(&ctx, input.into_dog_with_id(id))
    });
    respond(&ctx, StatusCode::OK, result)
}

/// Fallback for paths that match no route.
pub async fn not_found_handler(ctx: RequestContext, uri: Uri) -> Response {
    AppError::from(UnknownRouteError {
        path: uri.path().to_string(),
    })
    .into_response_for(&ctx)
}

/// Fallback for known paths called with an unsupported method.
pub async fn method_not_allowed_handler(ctx: RequestContext, method: Method) -> Response {
    AppError::from(MethodNotAllowedError {
        method: method.to_string(),
    })
    .into_response_for(&ctx)
}

// == Helpers ==

fn respond<T: Serialize>(ctx: &RequestContext, status: StatusCode, result: Result<T>) -> Response {
    match result {
        Ok(body) => (status, Json(body)).into_response(),
        Err(err) => err.into_response_for(ctx),
    }
}

fn parse_body(body: std::result::Result<Json<DogInput>, JsonRejection>) -> Result<DogInput> {
    body.map(|Json(input)| input).map_err(|rejection| {
        BadRequestError {
            reason: rejection.body_text(),
        }
        .into()
    })
}

/// A path segment that could not even be decoded is not a UUID either.
fn dog_id_from_path(
    path: std::result::Result<Path<String>, PathRejection>,
    reason: &str,
) -> Result<Uuid> {
    match path {
        Ok(Path(raw)) => parse_dog_id(&raw, reason),
        Err(rejection) => Err(ValidationError::new(reason, Resource::Dog, rejection.body_text())
            .with_validation("dogID", "must be UUID")
            .into()),
    }
}

/// Dog IDs must be present and parse as UUIDs.
fn parse_dog_id(raw: &str, reason: &str) -> Result<Uuid> {
    let raw = raw.trim();
    let err = ValidationError::new(reason, Resource::Dog, raw);
    if raw.is_empty() {
        return Err(err.with_validation("dogID", "required").into());
    }
    Uuid::parse_str(raw).map_err(|_| AppError::from(err.with_validation("dogID", "must be UUID")))
}

//! Error types for the dog API
//!
//! Every failure leaving the service layer is one of the classified kinds
//! below, aggregated in [`AppError`]. Transports map the kind to a status
//! without looking at messages.

use std::collections::BTreeMap;
use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::context::RequestContext;
use crate::models::{ErrorItem, ErrorResponse, User};
use crate::sources::StoreError;

// == Resource Markers ==
/// The kind of resource an operation was attempted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Dog,
    Dogs,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Dog => f.write_str("Dog"),
            Resource::Dogs => f.write_str("Dogs"),
        }
    }
}

/// Store operations that can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOperation {
    Create,
    Save,
    Fetch,
    Update,
}

impl fmt::Display for QueryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QueryOperation::Create => "Create",
            QueryOperation::Save => "Save",
            QueryOperation::Fetch => "Fetch",
            QueryOperation::Update => "Update",
        };
        f.write_str(name)
    }
}

/// Values carried on the request context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextResource {
    User,
    Logger,
}

impl fmt::Display for ContextResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextResource::User => f.write_str("User"),
            ContextResource::Logger => f.write_str("Logger"),
        }
    }
}

/// Access kinds on the request context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextOperation {
    Get,
    Set,
}

impl fmt::Display for ContextOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextOperation::Get => f.write_str("Get"),
            ContextOperation::Set => f.write_str("Set"),
        }
    }
}

// == Classified Errors ==
/// A required request-scoped value was absent. This is an integration
/// fault, not a client error.
#[derive(Debug, Clone, Error)]
#[error("could not {operation} {resource} on context with err: {reason}")]
pub struct ContextError {
    pub resource: ContextResource,
    pub operation: ContextOperation,
    pub reason: String,
}

impl ContextError {
    /// The caller's identity could not be read from the context.
    pub fn missing_user() -> Self {
        Self {
            resource: ContextResource::User,
            operation: ContextOperation::Get,
            reason: "failed to get context".to_string(),
        }
    }

    /// The request context itself was never attached to the request.
    pub fn missing_logger() -> Self {
        Self {
            resource: ContextResource::Logger,
            operation: ContextOperation::Get,
            reason: "request context middleware not applied".to_string(),
        }
    }
}

/// A store operation matched zero rows.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Could not find {resource}{}", .id.map(|id| format!(" {id}")).unwrap_or_default())]
pub struct ResourceNotFoundError {
    pub resource: Resource,
    pub id: Option<Uuid>,
}

impl ResourceNotFoundError {
    pub fn dog(id: Uuid) -> Self {
        Self {
            resource: Resource::Dog,
            id: Some(id),
        }
    }
}

/// A store operation failed. The store failure stays reachable as the
/// error source.
#[derive(Debug, Error)]
#[error("Could not query model {resource} with operation {operation}, received error: {source}")]
pub struct QueryError {
    #[source]
    pub source: StoreError,
    pub resource: Resource,
    pub operation: QueryOperation,
}

impl QueryError {
    pub fn new(source: StoreError, resource: Resource, operation: QueryOperation) -> Self {
        Self {
            source,
            resource,
            operation,
        }
    }

    /// Returns the not-found condition this query error wraps, if any.
    pub fn not_found(&self) -> Option<&ResourceNotFoundError> {
        match &self.source {
            StoreError::NotFound(err) => Some(err),
            _ => None,
        }
    }
}

/// The authorization predicate denied the operation.
#[derive(Debug, Clone, Error)]
#[error(
    "User: {} is unauthorized for operation: {} on resource: {}{}",
    .user.id,
    .operation.map_or_else(|| "any".to_string(), |op| op.to_string()),
    .resource.map_or_else(|| "any".to_string(), |res| res.to_string()),
    .reason.as_ref().map(|r| format!(" with error: {r}")).unwrap_or_default()
)]
pub struct UnauthorizedError {
    pub user: User,
    /// None when the request was refused before its operation was known.
    pub operation: Option<QueryOperation>,
    pub resource: Option<Resource>,
    pub resource_id: Option<Uuid>,
    pub reason: Option<String>,
}

impl UnauthorizedError {
    pub fn new(user: User, operation: QueryOperation, resource: Resource) -> Self {
        Self {
            user,
            operation: Some(operation),
            resource: Some(resource),
            resource_id: None,
            reason: None,
        }
    }

    pub fn with_resource_id(mut self, id: Uuid) -> Self {
        self.resource_id = Some(id);
        self
    }

    /// A request arrived without any identity at all. Operation and
    /// resource stay unset until the caller names them.
    pub fn anonymous(reason: impl Into<String>) -> Self {
        Self {
            user: User::default(),
            operation: None,
            resource: None,
            resource_id: None,
            reason: Some(reason.into()),
        }
    }

    pub fn with_target(mut self, operation: QueryOperation, resource: Resource) -> Self {
        self.operation = Some(operation);
        self.resource = Some(resource);
        self
    }
}

/// Input failed structural validation.
#[derive(Debug, Clone, Error)]
#[error("Could not validate {resource} {resource_id}: {reason} {validations:?}")]
pub struct ValidationError {
    pub resource: Resource,
    pub resource_id: String,
    pub reason: String,
    /// Field name to validation message.
    pub validations: BTreeMap<String, String>,
}

impl ValidationError {
    pub fn new(reason: impl Into<String>, resource: Resource, resource_id: impl Into<String>) -> Self {
        Self {
            resource,
            resource_id: resource_id.into(),
            reason: reason.into(),
            validations: BTreeMap::new(),
        }
    }

    /// Records a failed validation for `field`.
    pub fn with_validation(mut self, field: impl Into<String>, message: impl Into<String>) -> Self {
        self.validations.insert(field.into(), message.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.validations.is_empty()
    }
}

/// The request body could not be understood.
#[derive(Debug, Clone, Error)]
#[error("Request could not be understood: {reason}")]
pub struct BadRequestError {
    pub reason: String,
}

#[derive(Debug, Clone, Error)]
#[error("Method {method} not allowed")]
pub struct MethodNotAllowedError {
    pub method: String,
}

#[derive(Debug, Clone, Error)]
#[error("Route {path} unknown")]
pub struct UnknownRouteError {
    pub path: String,
}

// == App Error Enum ==
/// Unified error type for the service and transport layers.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Context(#[from] ContextError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Unauthorized(#[from] UnauthorizedError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    BadRequest(#[from] BadRequestError),

    #[error(transparent)]
    MethodNotAllowed(#[from] MethodNotAllowedError),

    #[error(transparent)]
    UnknownRoute(#[from] UnknownRouteError),

    /// A failure that is not classified, such as an authorization
    /// predicate that could not reach a decision. Passed through as is.
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl AppError {
    /// HTTP status this error renders as.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Query(err) if err.not_found().is_some() => StatusCode::NOT_FOUND,
            AppError::Query(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Context(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            AppError::UnknownRoute(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to clients.
    pub fn public_message(&self) -> &'static str {
        match self {
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::Query(err) if err.not_found().is_some() => "Resource not found",
            AppError::Validation(_) => "Entity unprocessable",
            AppError::MethodNotAllowed(_) => "Method not allowed",
            AppError::UnknownRoute(_) => "Not found",
            AppError::BadRequest(_) => "Bad request",
            AppError::Query(_) | AppError::Context(_) | AppError::Unexpected(_) => {
                "Something went wrong"
            }
        }
    }

    /// Records the error on the request log. Server faults flag the
    /// request as errored, client faults only add a field.
    pub fn record(&self, ctx: &RequestContext) {
        match self {
            AppError::Query(err) if err.not_found().is_none() => {
                ctx.log_error("DB Query Error", self)
            }
            AppError::Context(_) => ctx.log_error("Context Error", self),
            AppError::Unexpected(_) => ctx.log_error("Unexpected Error", self),
            AppError::BadRequest(_) => ctx.log_field("bad_request_err", self),
            AppError::UnknownRoute(_) => {
                info!(trace_id = %ctx.trace_id(), error = %self, "Returning status not found error from handler")
            }
            _ => {}
        }
    }

    /// Builds the JSON error body for this error.
    pub fn to_error_response(&self, trace_id: Uuid) -> ErrorResponse {
        let mut response =
            ErrorResponse::new(self.status_code().as_u16(), self.public_message(), trace_id);
        if let AppError::Validation(err) = self {
            response.errors = err
                .validations
                .iter()
                .map(|(field, message)| ErrorItem::new(field, message))
                .collect();
        }
        response
    }

    /// Records the error on the request log and renders the HTTP response.
    pub fn into_response_for(self, ctx: &RequestContext) -> Response {
        self.record(ctx);
        let status = self.status_code();
        (status, Json(self.to_error_response(ctx.trace_id()))).into_response()
    }
}

// == IntoResponse Implementation ==
/// Renders with a fresh trace ID. Handlers holding a [`RequestContext`]
/// use [`AppError::into_response_for`] instead.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.into_response_for(&RequestContext::new())
    }
}

// == Result Type Alias ==
/// Convenience Result type for the service layer.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    fn not_found_query() -> QueryError {
        QueryError::new(
            StoreError::NotFound(ResourceNotFoundError::dog(Uuid::nil())),
            Resource::Dog,
            QueryOperation::Fetch,
        )
    }

    #[test]
    fn test_query_error_exposes_not_found() {
        let err = not_found_query();
        assert!(err.not_found().is_some());

        let source = err.source().expect("query error has a source");
        assert!(source.to_string().contains("Could not find Dog"));
    }

    #[test]
    fn test_status_codes_by_kind() {
        let cases: Vec<(AppError, StatusCode)> = vec![
            (
                UnauthorizedError::new(User::new("u"), QueryOperation::Fetch, Resource::Dog).into(),
                StatusCode::UNAUTHORIZED,
            ),
            (not_found_query().into(), StatusCode::NOT_FOUND),
            (
                QueryError::new(StoreError::Poisoned, Resource::Dogs, QueryOperation::Fetch)
                    .into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (ContextError::missing_user().into(), StatusCode::INTERNAL_SERVER_ERROR),
            (
                ValidationError::new("bad", Resource::Dog, "x").into(),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                MethodNotAllowedError {
                    method: "PATCH".into(),
                }
                .into(),
                StatusCode::METHOD_NOT_ALLOWED,
            ),
            (
                UnknownRouteError { path: "/nope".into() }.into(),
                StatusCode::NOT_FOUND,
            ),
            (
                BadRequestError {
                    reason: "eof".into(),
                }
                .into(),
                StatusCode::BAD_REQUEST,
            ),
            (
                anyhow::anyhow!("authorizer offline").into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.status_code(), expected, "wrong status for {err}");
        }
    }

    #[test]
    fn test_validation_response_lists_fields() {
        let err: AppError = ValidationError::new("GET dog params failed validation", Resource::Dog, "")
            .with_validation("dogID", "required")
            .into();
        let trace_id = Uuid::new_v4();
        let response = err.to_error_response(trace_id);

        assert_eq!(response.code, 422);
        assert_eq!(response.trace_id, trace_id);
        assert_eq!(response.errors, vec![ErrorItem::new("dogID", "required")]);
    }

    #[test]
    fn test_server_faults_flag_request_log() {
        let ctx = RequestContext::new();
        AppError::from(ContextError::missing_user()).record(&ctx);
        assert_eq!(ctx.error_info().as_deref(), Some("Context Error"));

        let ctx = RequestContext::new();
        AppError::from(not_found_query()).record(&ctx);
        assert!(ctx.error_info().is_none());
    }

    #[test]
    fn test_unauthorized_message() {
        let err = UnauthorizedError::new(User::new("alice"), QueryOperation::Update, Resource::Dog);
        assert_eq!(
            err.to_string(),
            "User: alice is unauthorized for operation: Update on resource: Dog"
        );
    }

    #[test]
    fn test_anonymous_has_no_target() {
        let err = UnauthorizedError::anonymous("missing authorization header");
        assert_eq!(err.operation, None);
        assert_eq!(err.resource, None);
        assert_eq!(
            err.to_string(),
            "User:  is unauthorized for operation: any on resource: any with error: missing authorization header"
        );

        let err = err.with_target(QueryOperation::Update, Resource::Dog);
        assert_eq!(err.operation, Some(QueryOperation::Update));
        assert_eq!(err.resource, Some(Resource::Dog));
    }
}

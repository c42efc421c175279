//! Request middleware
//!
//! Attaches a [`RequestContext`] to every request, writes the request log
//! line once the response is ready, and resolves the caller from the
//! `Authorization` header on protected routes.

use std::time::Instant;

use axum::{
    extract::{FromRequestParts, Request},
    http::{header::AUTHORIZATION, request::Parts, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{error, info};

use crate::context::RequestContext;
use crate::error::{AppError, ContextError, QueryOperation, Resource, UnauthorizedError};
use crate::models::User;

/// Creates the request context and logs "Request Complete" after the
/// handler ran, at error level if anything flagged the request as failed.
pub async fn request_context_middleware(mut req: Request, next: Next) -> Response {
    let ctx = RequestContext::new();
    req.extensions_mut().insert(ctx.clone());

    let method = req.method().clone();
    let uri = req.uri().clone();
    let start = Instant::now();

    let response = next.run(req).await;

    let status = response.status().as_u16();
    let duration_ms = start.elapsed().as_millis() as u64;
    let fields = format_fields(&ctx.fields());

    match ctx.error_info() {
        Some(message) => error!(
            trace_id = %ctx.trace_id(),
            %method,
            %uri,
            status,
            duration_ms,
            fields = %fields,
            error_message = %message,
            "Request Complete"
        ),
        None => info!(
            trace_id = %ctx.trace_id(),
            %method,
            %uri,
            status,
            duration_ms,
            fields = %fields,
            "Request Complete"
        ),
    }

    response
}

/// Stand-in for a real identity provider: the `Authorization` header value
/// is taken as the caller's user ID.
pub async fn fake_authorize_middleware(mut req: Request, next: Next) -> Response {
    let user_id = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string);
    let target = requested_target(req.method(), req.uri().path());

    let Some(ctx) = req.extensions_mut().get_mut::<RequestContext>() else {
        return AppError::from(ContextError::missing_logger()).into_response();
    };

    match user_id {
        Some(id) => {
            ctx.set_user(User::new(id));
            next.run(req).await
        }
        None => {
            let ctx = ctx.clone();
            let mut err = UnauthorizedError::anonymous("missing authorization header");
            if let Some((operation, resource)) = target {
                err = err.with_target(operation, resource);
            }
            AppError::from(err).into_response_for(&ctx)
        }
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .ok_or_else(|| AppError::from(ContextError::missing_logger()).into_response())
    }
}

/// The dog operation a REST request asks for. GraphQL requests name their
/// operation in the body, so they have none here.
fn requested_target(method: &Method, path: &str) -> Option<(QueryOperation, Resource)> {
    if path == "/api/v1/dogs" {
        return match *method {
            Method::GET => Some((QueryOperation::Fetch, Resource::Dogs)),
            Method::POST => Some((QueryOperation::Create, Resource::Dog)),
            _ => None,
        };
    }
    if path.starts_with("/api/v1/dog/") {
        return match *method {
            Method::GET => Some((QueryOperation::Fetch, Resource::Dog)),
            Method::PUT => Some((QueryOperation::Update, Resource::Dog)),
            _ => None,
        };
    }
    None
}

fn format_fields(fields: &[(String, String)]) -> String {
    fields
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join(" ")
}

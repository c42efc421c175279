//! Response DTOs for the dog API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use uuid::Uuid;

use crate::config::BuildInfo;

/// Response body for the health check endpoint (GET /api/v1/healthcheck)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status, always "pass" when the server answers
    pub status: String,
    /// Build date time
    pub datetime: String,
    /// Crate version
    pub version: String,
    /// Build timestamp
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a passing HealthResponse for the given build
    pub fn pass(build: &BuildInfo) -> Self {
        Self {
            status: "pass".to_string(),
            datetime: build.datetime.clone(),
            version: build.version.clone(),
            timestamp: build.timestamp.clone(),
        }
    }
}

/// A single field level problem in an error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorItem {
    pub field: String,
    pub message: String,
}

impl ErrorItem {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Field level problems, empty unless validation failed
    pub errors: Vec<ErrorItem>,
    /// HTTP status code
    pub code: u16,
    /// Message describing what went wrong
    pub message: String,
    /// Trace ID of the request, for correlating with logs
    #[serde(rename = "traceID")]
    pub trace_id: Uuid,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse with no field errors
    pub fn new(code: u16, message: impl Into<String>, trace_id: Uuid) -> Self {
        Self {
            errors: Vec::new(),
            code,
            message: message.into(),
            trace_id,
        }
    }
}

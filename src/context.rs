//! Request Context
//!
//! Per-request state passed explicitly through handlers and services: the
//! trace ID, the resolved caller, and the request log that is emitted as a
//! single line once the response is ready.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use uuid::Uuid;

use crate::error::ContextError;
use crate::models::User;

// == Request Log ==
/// Fields accumulated while handling a request.
#[derive(Debug, Default)]
pub struct RequestLog {
    fields: Vec<(String, String)>,
    error_message: Option<String>,
    error: bool,
}

// == Request Context ==
/// Request-scoped values.
///
/// Clones share the same [`RequestLog`], so fields recorded by a handler are
/// visible to the middleware that writes the request log line.
#[derive(Debug, Clone)]
pub struct RequestContext {
    trace_id: Uuid,
    user: Option<User>,
    log: Arc<Mutex<RequestLog>>,
}

impl RequestContext {
    /// Creates a context with a fresh trace ID and no caller.
    pub fn new() -> Self {
        Self::with_trace_id(Uuid::new_v4())
    }

    pub fn with_trace_id(trace_id: Uuid) -> Self {
        Self {
            trace_id,
            user: None,
            log: Arc::new(Mutex::new(RequestLog::default())),
        }
    }

    /// Attaches the caller, consuming and returning the context.
    pub fn with_user(mut self, user: User) -> Self {
        self.user = Some(user);
        self
    }

    pub fn set_user(&mut self, user: User) {
        self.user = Some(user);
    }

    pub fn trace_id(&self) -> Uuid {
        self.trace_id
    }

    /// Returns the caller, or a [`ContextError`] if no identity was attached.
    pub fn user(&self) -> Result<&User, ContextError> {
        self.user.as_ref().ok_or_else(ContextError::missing_user)
    }

    /// Adds a field to the request log line.
    pub fn log_field(&self, key: impl Into<String>, value: impl fmt::Display) {
        self.log().fields.push((key.into(), value.to_string()));
    }

    /// Adds the error to the request log line and marks the request as
    /// failed, so the line is written at error level.
    pub fn log_error(&self, message: impl Into<String>, err: impl fmt::Display) {
        let mut log = self.log();
        log.fields.push(("error".to_string(), err.to_string()));
        log.error_message = Some(message.into());
        log.error = true;
    }

    /// All fields recorded so far.
    pub fn fields(&self) -> Vec<(String, String)> {
        self.log().fields.clone()
    }

    /// The error message if the request was marked as failed.
    pub fn error_info(&self) -> Option<String> {
        let log = self.log();
        if log.error {
            Some(log.error_message.clone().unwrap_or_default())
        } else {
            None
        }
    }

    // A panic while holding the lock leaves the log usable.
    fn log(&self) -> MutexGuard<'_, RequestLog> {
        self.log.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

//! Error types for the commercetools client and repositories.
//!
//! Errors are tagged by origin: configuration problems surface at
//! registration time, method-not-allowed errors are raised before any
//! network call, and API errors carry the status and body returned by the
//! platform. Transport headers are never part of an error value.

use serde_json::{json, Value};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required registration field is missing. Raised synchronously
    /// during registration, never during request execution.
    #[error("Missing commercetools.{0}")]
    Config(&'static str),

    /// The resource explicitly disables this operation (HTTP 405
    /// semantics). Raised before any network call.
    #[error("{resource} doesn't allow {operation}")]
    NotAllowed {
        resource: &'static str,
        operation: &'static str,
    },

    /// The platform answered with a non-success status. The response body
    /// is preserved verbatim.
    #[error("api request failed: {status}")]
    Api { status: u16, body: Value },

    /// The request builder has no service registered under this name.
    #[error("unknown service: {0}")]
    UnknownService(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// HTTP status associated with this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::NotAllowed { .. } => Some(405),
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Error body in the platform's `{statusCode, message}` shape, if any.
    pub fn body(&self) -> Option<Value> {
        match self {
            Error::NotAllowed { .. } => Some(json!({
                "statusCode": 405,
                "message": self.to_string(),
            })),
            Error::Api { body, .. } => Some(body.clone()),
            _ => None,
        }
    }
}

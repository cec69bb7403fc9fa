//! HTTP-specific error types for the Exoscale API client.
//!
//! # Error Handling
//!
//! - [`RequestError`]: transport-level failure (connection, TLS, DNS, timeout).
//!   Connection failures are retried by the session's
//!   [`RetryPolicy`](crate::clients::RetryPolicy) before they surface;
//!   timeouts only for idempotent methods.
//! - [`ApiError`]: the API answered with an error status. Never retried
//!   unless the status is in the session's forcelist.
//!   [`ApiError::NotFound`] is reserved for single-resource lookups.
//! - [`InvalidHttpRequestError`]: the request failed validation before sending.
//! - [`HttpError`]: unified error type returned by dispatchers.
//!
//! # Example
//!
//! ```rust,ignore
//! use exoscale::clients::{ApiError, HttpError};
//!
//! match dispatcher.send(request).await {
//!     Ok(resource) => println!("{:?}", resource.snapshot()),
//!     Err(HttpError::Api(ApiError::NotFound)) => println!("gone"),
//!     Err(HttpError::Api(ApiError::Response { status, reason, .. })) => {
//!         println!("API error {status}: {reason}");
//!     }
//!     Err(HttpError::Request(e)) => println!("network error: {e}"),
//!     Err(e) => println!("other error: {e}"),
//! }
//! ```

use thiserror::Error;

use crate::auth::SignError;
use crate::clients::HttpMethod;

/// Fixed reason of [`ApiError::NotFound`].
pub const NOT_FOUND_REASON: &str = "resource not found";

/// Error returned when a request could not be carried out at the transport
/// level.
#[derive(Debug, Error)]
#[error("{reason}")]
pub struct RequestError {
    /// Human-readable description of the failure.
    pub reason: String,
    /// The underlying HTTP client error, when there is one.
    #[source]
    pub error: Option<reqwest::Error>,
}

impl RequestError {
    /// Creates a request error without an underlying cause.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            error: None,
        }
    }

    /// Whether the failure is worth another attempt for a `method` request.
    ///
    /// Connection failures happen before the request reaches the server and
    /// are retried for every method; an error without an underlying cause
    /// counts as one. Timeouts and other failures once the request may have
    /// been written are only retried for idempotent methods.
    #[must_use]
    pub fn is_retryable(&self, method: HttpMethod) -> bool {
        match &self.error {
            None => true,
            Some(e) if e.is_connect() => true,
            Some(e) => method.is_idempotent() && (e.is_timeout() || e.is_request()),
        }
    }
}

impl From<reqwest::Error> for RequestError {
    fn from(error: reqwest::Error) -> Self {
        Self {
            reason: error.to_string(),
            error: Some(error),
        }
    }
}

/// Error returned when the API answered with an error status.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A single-resource lookup returned HTTP 404.
    #[error("resource not found")]
    NotFound,

    /// Any other error response.
    #[error("{reason}")]
    Response {
        /// The HTTP status code.
        status: u16,
        /// The provider's error message, or the HTTP reason phrase.
        reason: String,
        /// The parsed error payload, or the raw body as a JSON string.
        error: serde_json::Value,
    },
}

impl ApiError {
    /// Returns the HTTP status code behind this error.
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::Response { status, .. } => *status,
        }
    }

    /// Returns the human-readable reason.
    #[must_use]
    pub fn reason(&self) -> &str {
        match self {
            Self::NotFound => NOT_FOUND_REASON,
            Self::Response { reason, .. } => reason,
        }
    }
}

/// Error returned when an HTTP request fails validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidHttpRequestError {
    /// A POST, PUT or PATCH request was made without a body.
    #[error("Cannot use {method} without specifying data.")]
    MissingBody {
        /// The HTTP method that requires a body.
        method: String,
    },

    /// A single-resource lookup was requested with a non-read method.
    #[error("Cannot use {method} for a single-resource lookup.")]
    NotALookup {
        /// The offending HTTP method.
        method: String,
    },

    /// The dispatcher endpoint and request path do not form a valid URL.
    #[error("Invalid request URL {url}.")]
    InvalidUrl {
        /// The URL that failed to parse.
        url: String,
    },
}

/// Unified error type for all HTTP-related errors.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Transport-level failure.
    #[error(transparent)]
    Request(#[from] RequestError),

    /// Error response from the API.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Request validation failed.
    #[error(transparent)]
    InvalidRequest(#[from] InvalidHttpRequestError),

    /// The signer could not authenticate the request.
    #[error(transparent)]
    Sign(#[from] SignError),

    /// A successful response body did not match the expected shape.
    #[error("unable to decode response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl HttpError {
    /// Whether this error is the not-found outcome of a lookup.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Api(ApiError::NotFound))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_not_found_has_fixed_reason() {
        let error = ApiError::NotFound;
        assert_eq!(error.to_string(), "resource not found");
        assert_eq!(error.reason(), NOT_FOUND_REASON);
        assert_eq!(error.status(), 404);
    }

    #[test]
    fn test_api_response_error_displays_reason() {
        let error = ApiError::Response {
            status: 500,
            reason: "Internal Server Error".to_string(),
            error: json!("boom"),
        };
        assert_eq!(error.to_string(), "Internal Server Error");
        assert_eq!(error.status(), 500);
    }

    #[test]
    fn test_request_error_without_cause_is_retryable() {
        let error = RequestError::new("connection refused");
        assert!(error.is_retryable(HttpMethod::Get));
        assert!(error.is_retryable(HttpMethod::Post));
        assert_eq!(error.to_string(), "connection refused");
    }

    #[test]
    fn test_http_error_is_not_found() {
        assert!(HttpError::from(ApiError::NotFound).is_not_found());
        assert!(!HttpError::from(RequestError::new("reset")).is_not_found());
    }

    #[test]
    fn test_invalid_request_error_missing_body() {
        let error = InvalidHttpRequestError::MissingBody {
            method: "POST".to_string(),
        };
        assert_eq!(error.to_string(), "Cannot use POST without specifying data.");
    }

    #[test]
    fn test_error_types_implement_std_error() {
        let _: &dyn std::error::Error = &RequestError::new("x");
        let _: &dyn std::error::Error = &ApiError::NotFound;
        let _: &dyn std::error::Error = &InvalidHttpRequestError::MissingBody {
            method: "PUT".to_string(),
        };
    }
}

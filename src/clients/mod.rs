//! HTTP client layer shared by every API family.
//!
//! # Overview
//!
//! - [`Dispatcher`]: per-family request sender (sign, send, map errors)
//! - [`HttpSession`]: pooled transport with retry and tracing
//! - [`RetryPolicy`]: bounded retry with exponential backoff
//! - [`HttpRequest`]: a request relative to a dispatcher endpoint
//! - [`HttpResponse`]: a raw response from the transport
//! - [`HttpError`]: unified error type, see [`ApiError`] and [`RequestError`]
//!
//! # Example
//!
//! ```rust,ignore
//! use exoscale::clients::{HttpError, HttpMethod, HttpRequest};
//!
//! let request = HttpRequest::builder(HttpMethod::Get, "instance/42")
//!     .single_resource()
//!     .build()?;
//!
//! match client.compute.send(request).await {
//!     Ok(instance) => println!("{:?}", instance.snapshot()),
//!     Err(e) if e.is_not_found() => println!("no such instance"),
//!     Err(e) => return Err(e.into()),
//! }
//! ```
//!
//! # Retry Behavior
//!
//! - **Connection failures** (connection refused, DNS, TLS handshake):
//!   retried up to `max_retries` times with exponential backoff.
//! - **Timeouts and other transport failures**: retried the same way for
//!   idempotent methods only; a POST or PATCH that may have reached the
//!   server is never replayed.
//! - **Error statuses**: returned immediately, unless a status forcelist is
//!   configured and the method is idempotent.

mod dispatcher;
mod errors;
mod http_request;
mod http_response;
mod retry;
mod session;
mod user_agent;

pub use dispatcher::{ApiFamily, Dispatcher};
pub use errors::{
    ApiError, HttpError, InvalidHttpRequestError, RequestError, NOT_FOUND_REASON,
};
pub use http_request::{HttpMethod, HttpRequest, HttpRequestBuilder};
pub use http_response::HttpResponse;
pub use retry::{RetryPolicy, BACKOFF_MAX, DEFAULT_BACKOFF_FACTOR, DEFAULT_MAX_RETRIES};
pub use session::{HttpSession, RawRequest, DEFAULT_TIMEOUT, TRACE_TARGET};
pub use user_agent::{user_agent, HTTP_CLIENT_IDENTITY, SDK_VERSION};

//! Pooled HTTP transport with retry and tracing.
//!
//! An [`HttpSession`] owns a handle on a `reqwest::Client` connection pool,
//! a [`RetryPolicy`] and a tracing flag. Cloning a `reqwest::Client` shares
//! its pool, so several sessions built with [`HttpSession::with_client`] from
//! the same client reuse the same connections; the pool lives as long as any
//! session holds it.
//!
//! # Tracing
//!
//! When tracing is enabled, each exchange is logged at `INFO` on the
//! [`TRACE_TARGET`] target as a request block followed by a response block:
//!
//! ```text
//! >>> GET https://api.exoscale.com/v2/zone
//!     headers:{"accept": "application/json", ...}
//! <<< 200 OK
//!     headers:{"content-type": "application/json", ...}
//!     body:{"zones":[...]}
//! ```
//!
//! The request block is rendered before sending and emitted together with the
//! response block once a response arrives, so a trace never contains a
//! request without its response. Failed exchanges are only visible in the
//! `DEBUG` logs.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::time::Duration;

use crate::clients::user_agent::user_agent;
use crate::clients::{HttpMethod, HttpResponse, RequestError, RetryPolicy};

/// Target of the request/response trace events.
pub const TRACE_TARGET: &str = "exoscale::trace";

/// Default timeout applied to each attempt.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// A fully prepared request, ready to go on the wire.
#[derive(Clone, Debug)]
pub struct RawRequest {
    /// The HTTP method.
    pub method: HttpMethod,
    /// The absolute URL, query string included.
    pub url: reqwest::Url,
    /// Request headers.
    pub headers: Vec<(String, String)>,
    /// The serialized body, if any.
    pub body: Option<String>,
}

/// Reusable HTTP transport with bounded retry and optional tracing.
///
/// # Thread Safety
///
/// `HttpSession` is `Send + Sync`; concurrent `send` calls share pooled
/// connections and nothing else.
///
/// # Example
///
/// ```rust
/// use exoscale::clients::{HttpSession, RetryPolicy};
///
/// let pool = HttpSession::build_client(None).unwrap();
/// let compute = HttpSession::with_client(pool.clone(), RetryPolicy::default(), false);
/// let dns = HttpSession::with_client(pool, RetryPolicy::new(5), true);
/// assert!(dns.trace());
/// ```
#[derive(Clone, Debug)]
pub struct HttpSession {
    client: reqwest::Client,
    retry: RetryPolicy,
    trace: bool,
}

// Verify HttpSession is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<HttpSession>();
};

impl HttpSession {
    /// Creates a session with its own connection pool.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError`] if the HTTP client cannot be created (e.g.
    /// TLS backend initialization failure).
    pub fn new(retry: RetryPolicy, trace: bool) -> Result<Self, RequestError> {
        let client = Self::build_client(None)?;
        Ok(Self::with_client(client, retry, trace))
    }

    /// Creates a session on top of an existing connection pool.
    #[must_use]
    pub const fn with_client(client: reqwest::Client, retry: RetryPolicy, trace: bool) -> Self {
        Self {
            client,
            retry,
            trace,
        }
    }

    /// Builds a connection pool identified with the client user agent.
    ///
    /// `timeout` bounds each attempt; `None` means [`DEFAULT_TIMEOUT`].
    ///
    /// # Errors
    ///
    /// Returns the `reqwest` error if the client cannot be created.
    pub fn build_client(timeout: Option<Duration>) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder()
            .use_rustls_tls()
            .user_agent(user_agent())
            .timeout(timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()
    }

    /// Returns the retry policy.
    #[must_use]
    pub const fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Returns whether request/response tracing is enabled.
    #[must_use]
    pub const fn trace(&self) -> bool {
        self.trace
    }

    /// Sends `request`, retrying according to the session policy.
    ///
    /// Any HTTP status is a successful send; interpreting error statuses is
    /// up to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError`] when the request could not be carried out,
    /// after retries are exhausted for transient failures.
    pub async fn send(&self, request: &RawRequest) -> Result<HttpResponse, RequestError> {
        let request_trace = self.trace.then(|| render_request(request));

        let response = self
            .retry
            .run(request.method, |attempt| self.execute(request, attempt))
            .await?;

        if let Some(request_trace) = request_trace {
            tracing::info!(
                target: TRACE_TARGET,
                "{}\n{}",
                request_trace,
                render_response(&response)
            );
        }

        Ok(response)
    }

    async fn execute(&self, request: &RawRequest, attempt: u32) -> Result<HttpResponse, RequestError> {
        let mut builder = self
            .client
            .request(request.method.into(), request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        tracing::debug!(
            attempt,
            method = %request.method,
            url = %request.url,
            "sending HTTP request"
        );

        let res = builder.send().await.map_err(|err| {
            tracing::debug!(attempt, url = %request.url, error = %err, "HTTP request failed");
            RequestError::from(err)
        })?;

        let code = res.status().as_u16();
        let headers = HttpResponse::collect_headers(res.headers());
        let body = res.text().await?;

        tracing::debug!(attempt, url = %request.url, status = code, "received HTTP response");

        Ok(HttpResponse::new(code, headers, body))
    }
}

fn render_request(request: &RawRequest) -> String {
    let headers: BTreeMap<String, &str> = request
        .headers
        .iter()
        .map(|(name, value)| (name.to_lowercase(), value.as_str()))
        .collect();

    let mut out = format!(">>> {} {}\n    headers:{headers:?}", request.method, request.url);
    if let Some(body) = request.body.as_deref().filter(|body| !body.is_empty()) {
        let _ = write!(out, "\n    body:{body}");
    }
    out
}

fn render_response(response: &HttpResponse) -> String {
    let headers: BTreeMap<&str, &Vec<String>> = response
        .headers
        .iter()
        .map(|(name, values)| (name.as_str(), values))
        .collect();

    format!(
        "<<< {} {}\n    headers:{headers:?}\n    body:{}",
        response.code, response.reason, response.body
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn raw_request(body: Option<&str>) -> RawRequest {
        RawRequest {
            method: HttpMethod::Post,
            url: reqwest::Url::parse("https://api.example.com/v2/instance?zone=ch-gva-2").unwrap(),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: body.map(String::from),
        }
    }

    #[test]
    fn test_render_request_with_body() {
        let rendered = render_request(&raw_request(Some(r#"{"name":"web"}"#)));
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines[0], ">>> POST https://api.example.com/v2/instance?zone=ch-gva-2");
        assert!(lines[1].starts_with("    headers:"));
        assert!(lines[1].contains("content-type"));
        assert_eq!(lines[2], r#"    body:{"name":"web"}"#);
    }

    #[test]
    fn test_render_request_omits_missing_body() {
        let rendered = render_request(&raw_request(None));
        assert_eq!(rendered.lines().count(), 2);
        assert!(!rendered.contains("body:"));
    }

    #[test]
    fn test_render_response_includes_status_reason_and_body() {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), vec!["text/plain".to_string()]);
        let response = HttpResponse::new(404, headers, "nope".to_string());

        let rendered = render_response(&response);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "<<< 404 Not Found");
        assert!(lines[1].contains("text/plain"));
        assert_eq!(lines[2], "    body:nope");
    }

    #[test]
    fn test_session_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HttpSession>();
    }

    #[test]
    fn test_with_client_keeps_settings() {
        let client = HttpSession::build_client(Some(Duration::from_secs(5))).unwrap();
        let session = HttpSession::with_client(client, RetryPolicy::new(7), true);

        assert_eq!(session.retry_policy().max_retries(), 7);
        assert!(session.trace());
    }
}

//! Request signing strategies.
//!
//! The dispatcher never computes signatures itself: it hands the outbound
//! request to a [`RequestSigner`] together with the shared [`Credentials`]
//! and merges whatever headers and query parameters the signer returns.
//!
//! [`Exo2Signer`] is the default strategy. It computes an HMAC-SHA256
//! signature over the method, path, body, query values and an expiration
//! timestamp, and sends it in the `Authorization` header:
//!
//! ```text
//! EXO2-HMAC-SHA256 credential=<key>,signed-query-args=<a;b>,expires=<ts>,signature=<base64>
//! ```
//!
//! # Example
//!
//! ```rust
//! use exoscale::auth::{Exo2Signer, SigningRequest};
//! use exoscale::{ApiKey, ApiSecret, Credentials, HttpMethod};
//!
//! let credentials = Credentials::new(
//!     ApiKey::new("EXOabc").unwrap(),
//!     ApiSecret::new("secret").unwrap(),
//! );
//! let request = SigningRequest {
//!     method: HttpMethod::Get,
//!     path: "/v2/zone",
//!     query: &[],
//!     body: None,
//! };
//!
//! let header = Exo2Signer::default().authorization(&credentials, &request, 1_700_000_000);
//! assert!(header.starts_with("EXO2-HMAC-SHA256 credential=EXOabc,expires=1700000000,signature="));
//! ```

use std::fmt;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

use crate::auth::Credentials;
use crate::clients::HttpMethod;

type HmacSha256 = Hmac<Sha256>;

/// Name of the signature scheme, first token of the `Authorization` header.
pub const EXO2_SCHEME: &str = "EXO2-HMAC-SHA256";

/// Version of the signing scheme, advertised in the client user agent.
pub const SIGNER_VERSION: &str = "2";

/// Default validity window of a signature.
pub const DEFAULT_EXPIRATION: Duration = Duration::from_secs(600);

/// Error returned when a signer cannot produce authentication material.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unable to sign request: {reason}")]
pub struct SignError {
    /// Why signing failed.
    pub reason: String,
}

/// The parts of an outbound request a signer is allowed to look at.
#[derive(Clone, Copy, Debug)]
pub struct SigningRequest<'a> {
    /// The HTTP method.
    pub method: HttpMethod,
    /// The absolute URL path (e.g. `/v2/zone`).
    pub path: &'a str,
    /// Query parameters, in any order.
    pub query: &'a [(String, String)],
    /// The serialized request body, if any.
    pub body: Option<&'a str>,
}

/// Authentication material produced by a [`RequestSigner`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SignedParts {
    /// Headers to add to the request.
    pub headers: Vec<(String, String)>,
    /// Query parameters to add to the request.
    pub query: Vec<(String, String)>,
}

/// A pluggable request authentication strategy.
///
/// Given credentials and a request, produce the headers and/or query
/// parameters that authenticate it.
pub trait RequestSigner: fmt::Debug + Send + Sync {
    /// Signs `request` with `credentials`.
    ///
    /// # Errors
    ///
    /// Returns [`SignError`] if authentication material cannot be produced.
    fn sign(
        &self,
        credentials: &Credentials,
        request: &SigningRequest<'_>,
    ) -> Result<SignedParts, SignError>;
}

/// HMAC-SHA256 request signer.
#[derive(Clone, Copy, Debug)]
pub struct Exo2Signer {
    expiration: Duration,
}

impl Default for Exo2Signer {
    fn default() -> Self {
        Self {
            expiration: DEFAULT_EXPIRATION,
        }
    }
}

impl Exo2Signer {
    /// Creates a signer whose signatures stay valid for `expiration`.
    #[must_use]
    pub const fn with_expiration(expiration: Duration) -> Self {
        Self { expiration }
    }

    /// Returns the signature validity window.
    #[must_use]
    pub const fn expiration(&self) -> Duration {
        self.expiration
    }

    /// Builds the `Authorization` header value for a signature expiring at
    /// the `expires` Unix timestamp.
    #[must_use]
    pub fn authorization(
        &self,
        credentials: &Credentials,
        request: &SigningRequest<'_>,
        expires: i64,
    ) -> String {
        let mut query: Vec<&(String, String)> = request.query.iter().collect();
        query.sort_by(|a, b| a.0.cmp(&b.0));

        let message = string_to_sign(request, &query, expires);
        let signature = compute_signature(&message, credentials.secret().as_ref());

        let mut header = format!("{EXO2_SCHEME} credential={}", credentials.key());
        if !query.is_empty() {
            let names: Vec<&str> = query.iter().map(|(name, _)| name.as_str()).collect();
            header.push_str(",signed-query-args=");
            header.push_str(&names.join(";"));
        }
        header.push_str(&format!(",expires={expires},signature={signature}"));
        header
    }
}

impl RequestSigner for Exo2Signer {
    fn sign(
        &self,
        credentials: &Credentials,
        request: &SigningRequest<'_>,
    ) -> Result<SignedParts, SignError> {
        let validity = chrono::Duration::from_std(self.expiration).map_err(|e| SignError {
            reason: format!("invalid expiration: {e}"),
        })?;
        let expires = (chrono::Utc::now() + validity).timestamp();

        Ok(SignedParts {
            headers: vec![(
                "Authorization".to_string(),
                self.authorization(credentials, request, expires),
            )],
            query: Vec::new(),
        })
    }
}

/// Assembles the signed message: request line, body, concatenated query
/// values (sorted by name), signed headers (none) and expiration.
fn string_to_sign(
    request: &SigningRequest<'_>,
    sorted_query: &[&(String, String)],
    expires: i64,
) -> String {
    let query_values: String = sorted_query.iter().map(|(_, value)| value.as_str()).collect();

    format!(
        "{} {}\n{}\n{}\n\n{}",
        request.method.as_str(),
        request.path,
        request.body.unwrap_or_default(),
        query_values,
        expires
    )
}

/// Computes a base64-encoded HMAC-SHA256 signature of `message`.
#[must_use]
#[allow(clippy::missing_panics_doc)] // HMAC accepts any key size, so this never panics
pub fn compute_signature(message: &str, secret: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(message.as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}

//! Authentication types for the Exoscale API client.
//!
//! # Overview
//!
//! - [`Credentials`]: the API key/secret pair shared by all family dispatchers
//! - [`RequestSigner`]: the pluggable signing strategy used by dispatchers
//! - [`Exo2Signer`]: the default HMAC-SHA256 signer
//!
//! A custom strategy only has to turn credentials and a request into headers
//! and query parameters:
//!
//! ```rust
//! use exoscale::auth::{RequestSigner, SignError, SignedParts, SigningRequest};
//! use exoscale::Credentials;
//!
//! #[derive(Debug)]
//! struct KeyHeader;
//!
//! impl RequestSigner for KeyHeader {
//!     fn sign(
//!         &self,
//!         credentials: &Credentials,
//!         _request: &SigningRequest<'_>,
//!     ) -> Result<SignedParts, SignError> {
//!         Ok(SignedParts {
//!             headers: vec![("X-Api-Key".to_string(), credentials.key().to_string())],
//!             query: Vec::new(),
//!         })
//!     }
//! }
//! ```

mod credentials;
pub mod signature;

pub use credentials::Credentials;
pub use signature::{Exo2Signer, RequestSigner, SignError, SignedParts, SigningRequest};

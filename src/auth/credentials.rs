//! API credentials shared by every family dispatcher.

use crate::config::{ApiKey, ApiSecret};

/// An API key/secret pair.
///
/// Credentials are immutable once resolved. A top-level
/// [`Exoscale`](crate::Exoscale) client wraps them in an `Arc` and hands
/// the same instance to every family dispatcher.
///
/// # Example
///
/// ```rust
/// use exoscale::{ApiKey, ApiSecret, Credentials};
///
/// let credentials = Credentials::new(
///     ApiKey::new("EXOabc").unwrap(),
///     ApiSecret::new("secret").unwrap(),
/// );
/// assert_eq!(credentials.key().as_ref(), "EXOabc");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credentials {
    key: ApiKey,
    secret: ApiSecret,
}

impl Credentials {
    /// Creates a credential pair.
    #[must_use]
    pub const fn new(key: ApiKey, secret: ApiSecret) -> Self {
        Self { key, secret }
    }

    /// Returns the API key.
    #[must_use]
    pub const fn key(&self) -> &ApiKey {
        &self.key
    }

    /// Returns the API secret.
    #[must_use]
    pub const fn secret(&self) -> &ApiSecret {
        &self.secret
    }
}

//! Configuration types for the Exoscale API client.
//!
//! # Overview
//!
//! - [`ExoscaleConfig`]: explicit constructor arguments and transport settings
//! - [`ExoscaleConfigBuilder`]: a builder for [`ExoscaleConfig`]
//! - [`resolve`]: merges arguments, configuration file and environment
//! - [`ResolvedConfig`]: the immutable outcome of resolution
//! - [`ConfigFile`] / [`ProfileConfig`]: the TOML configuration file
//! - [`Environment`]: environment variable and home directory lookup
//!
//! # Example
//!
//! ```rust
//! use exoscale::ExoscaleConfig;
//!
//! let config = ExoscaleConfig::builder()
//!     .profile("production")
//!     .max_retries(5)
//!     .trace(true)
//!     .build();
//!
//! assert_eq!(config.max_retries(), 5);
//! ```

mod environment;
mod file;
mod newtypes;
mod resolver;

pub use environment::{
    Environment, ProcessEnvironment, API_KEY_ENVVAR, API_SECRET_ENVVAR,
    COMPUTE_API_ENDPOINT_ENVVAR, CONFIG_FILE_ENVVAR, DNS_API_ENDPOINT_ENVVAR,
    IAM_API_ENDPOINT_ENVVAR, RUNSTATUS_API_ENDPOINT_ENVVAR, STORAGE_API_ENDPOINT_ENVVAR,
    STORAGE_ZONE_ENVVAR,
};
pub use file::{ConfigFile, ProfileConfig, DEFAULT_CONFIG_PATH};
pub use newtypes::{ApiKey, ApiSecret};
pub use resolver::resolve;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{Credentials, RequestSigner};
use crate::clients::{ApiFamily, RetryPolicy, DEFAULT_BACKOFF_FACTOR, DEFAULT_MAX_RETRIES};

/// Per-family endpoint overrides. `None` means "use the family default".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EndpointOverrides {
    /// Compute API endpoint.
    pub compute: Option<String>,
    /// DNS API endpoint.
    pub dns: Option<String>,
    /// Object storage API endpoint.
    pub storage: Option<String>,
    /// Runstatus API endpoint.
    pub runstatus: Option<String>,
    /// IAM API endpoint.
    pub iam: Option<String>,
}

impl EndpointOverrides {
    /// Returns the override for `family`, if any.
    #[must_use]
    pub fn get(&self, family: ApiFamily) -> Option<&str> {
        match family {
            ApiFamily::Compute => self.compute.as_deref(),
            ApiFamily::Dns => self.dns.as_deref(),
            ApiFamily::Storage => self.storage.as_deref(),
            ApiFamily::Runstatus => self.runstatus.as_deref(),
            ApiFamily::Iam => self.iam.as_deref(),
        }
    }
}

/// Explicit client arguments.
///
/// Credential and endpoint fields have the highest precedence during
/// [`resolve`]; empty strings are treated as unset. The transport settings
/// (`max_retries`, `backoff_factor`, `status_forcelist`, `timeout`, `trace`,
/// `signer`) are shared by every family dispatcher.
#[derive(Clone)]
pub struct ExoscaleConfig {
    config_file: Option<PathBuf>,
    profile: Option<String>,
    api_key: Option<String>,
    api_secret: Option<String>,
    endpoints: EndpointOverrides,
    storage_zone: Option<String>,
    max_retries: u32,
    backoff_factor: f64,
    status_forcelist: Option<Vec<u16>>,
    timeout: Option<Duration>,
    trace: bool,
    signer: Option<Arc<dyn RequestSigner>>,
}

impl std::fmt::Debug for ExoscaleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExoscaleConfig")
            .field("config_file", &self.config_file)
            .field("profile", &self.profile)
            .field("api_key", &self.api_key)
            .field("api_secret", &self.api_secret.as_ref().map(|_| "*****"))
            .field("endpoints", &self.endpoints)
            .field("storage_zone", &self.storage_zone)
            .field("max_retries", &self.max_retries)
            .field("backoff_factor", &self.backoff_factor)
            .field("status_forcelist", &self.status_forcelist)
            .field("timeout", &self.timeout)
            .field("trace", &self.trace)
            .field("signer", &self.signer)
            .finish()
    }
}

impl Default for ExoscaleConfig {
    fn default() -> Self {
        ExoscaleConfigBuilder::new().build()
    }
}

impl ExoscaleConfig {
    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> ExoscaleConfigBuilder {
        ExoscaleConfigBuilder::new()
    }

    /// Returns the explicit configuration file path, if set.
    #[must_use]
    pub fn config_file(&self) -> Option<&std::path::Path> {
        self.config_file.as_deref()
    }

    /// Returns the explicit profile name, if set.
    #[must_use]
    pub fn profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    /// Returns the number of retries after the initial attempt.
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Returns the per-attempt timeout, if set.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Returns whether request/response tracing is enabled.
    #[must_use]
    pub const fn trace(&self) -> bool {
        self.trace
    }

    /// Returns the custom request signer, if set.
    #[must_use]
    pub fn signer(&self) -> Option<&Arc<dyn RequestSigner>> {
        self.signer.as_ref()
    }

    /// Builds the retry policy described by this configuration.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        let policy = RetryPolicy::new(self.max_retries).with_backoff_factor(self.backoff_factor);
        match &self.status_forcelist {
            Some(statuses) => policy.with_status_forcelist(statuses.iter().copied()),
            None => policy,
        }
    }
}

/// Builder for [`ExoscaleConfig`].
///
/// # Defaults
///
/// - `max_retries`: 3
/// - `backoff_factor`: 0.3 seconds
/// - `status_forcelist`: none
/// - `timeout`: unset, in which case the session applies
///   [`DEFAULT_TIMEOUT`](crate::clients::DEFAULT_TIMEOUT) (60 seconds)
/// - `trace`: `false`
/// - everything else: unset
#[derive(Debug)]
pub struct ExoscaleConfigBuilder {
    config: ExoscaleConfig,
}

impl Default for ExoscaleConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ExoscaleConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: ExoscaleConfig {
                config_file: None,
                profile: None,
                api_key: None,
                api_secret: None,
                endpoints: EndpointOverrides::default(),
                storage_zone: None,
                max_retries: DEFAULT_MAX_RETRIES,
                backoff_factor: DEFAULT_BACKOFF_FACTOR,
                status_forcelist: None,
                timeout: None,
                trace: false,
                signer: None,
            },
        }
    }

    /// Sets the configuration file path.
    #[must_use]
    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.config_file = Some(path.into());
        self
    }

    /// Sets the configuration profile name.
    #[must_use]
    pub fn profile(mut self, name: impl Into<String>) -> Self {
        self.config.profile = Some(name.into());
        self
    }

    /// Sets the API key.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    /// Sets the API secret.
    #[must_use]
    pub fn api_secret(mut self, secret: impl Into<String>) -> Self {
        self.config.api_secret = Some(secret.into());
        self
    }

    /// Sets an alternative compute API endpoint.
    #[must_use]
    pub fn compute_api_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoints.compute = Some(endpoint.into());
        self
    }

    /// Sets an alternative DNS API endpoint.
    #[must_use]
    pub fn dns_api_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoints.dns = Some(endpoint.into());
        self
    }

    /// Sets an alternative object storage API endpoint.
    #[must_use]
    pub fn storage_api_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoints.storage = Some(endpoint.into());
        self
    }

    /// Sets an alternative runstatus API endpoint.
    #[must_use]
    pub fn runstatus_api_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoints.runstatus = Some(endpoint.into());
        self
    }

    /// Sets an alternative IAM API endpoint.
    #[must_use]
    pub fn iam_api_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoints.iam = Some(endpoint.into());
        self
    }

    /// Sets the object storage zone.
    #[must_use]
    pub fn storage_zone(mut self, zone: impl Into<String>) -> Self {
        self.config.storage_zone = Some(zone.into());
        self
    }

    /// Sets the number of retries after the initial attempt.
    #[must_use]
    pub const fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Sets the retry backoff factor, in seconds.
    #[must_use]
    pub const fn backoff_factor(mut self, factor: f64) -> Self {
        self.config.backoff_factor = factor;
        self
    }

    /// Sets the status codes retried for idempotent requests.
    #[must_use]
    pub fn status_forcelist(mut self, statuses: impl IntoIterator<Item = u16>) -> Self {
        self.config.status_forcelist = Some(statuses.into_iter().collect());
        self
    }

    /// Sets the per-attempt request timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Enables or disables request/response tracing.
    #[must_use]
    pub const fn trace(mut self, trace: bool) -> Self {
        self.config.trace = trace;
        self
    }

    /// Sets the request signing strategy (default: [`Exo2Signer`](crate::auth::Exo2Signer)).
    #[must_use]
    pub fn signer(mut self, signer: Arc<dyn RequestSigner>) -> Self {
        self.config.signer = Some(signer);
        self
    }

    /// Builds the [`ExoscaleConfig`].
    #[must_use]
    pub fn build(self) -> ExoscaleConfig {
        self.config
    }
}

/// The merged outcome of [`resolve`]. Immutable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedConfig {
    credentials: Credentials,
    endpoints: EndpointOverrides,
    storage_zone: Option<String>,
    profile: Option<String>,
}

impl ResolvedConfig {
    /// Creates a resolved configuration directly, bypassing [`resolve`].
    #[must_use]
    pub const fn new(
        credentials: Credentials,
        endpoints: EndpointOverrides,
        storage_zone: Option<String>,
    ) -> Self {
        Self {
            credentials,
            endpoints,
            storage_zone,
            profile: None,
        }
    }

    /// Returns the resolved credentials.
    #[must_use]
    pub const fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Returns the resolved endpoint overrides.
    #[must_use]
    pub const fn endpoints(&self) -> &EndpointOverrides {
        &self.endpoints
    }

    /// Returns the resolved storage zone, if any.
    #[must_use]
    pub fn storage_zone(&self) -> Option<&str> {
        self.storage_zone.as_deref()
    }

    /// Returns the name of the configuration profile used, if any.
    #[must_use]
    pub fn profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }
}

// Verify the configuration types are Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ExoscaleConfig>();
    assert_send_sync::<ResolvedConfig>();
};

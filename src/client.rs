//! The top-level Exoscale client.
//!
//! [`Exoscale`] resolves the configuration once and builds one
//! [`Dispatcher`] per API family. All dispatchers share:
//!
//! - the same `Arc<Credentials>`;
//! - one connection pool, handed explicitly to every family session;
//! - the retry policy, tracing flag and request signer.
//!
//! Only the storage family consumes the storage zone.

use std::fmt;
use std::sync::Arc;

use crate::auth::{Exo2Signer, RequestSigner};
use crate::clients::{ApiFamily, Dispatcher, HttpSession};
use crate::config::{resolve, Environment, ExoscaleConfig, ProcessEnvironment, ResolvedConfig};
use crate::error::ConfigError;

/// Default compute API endpoint.
pub const DEFAULT_COMPUTE_API_ENDPOINT: &str = "https://api.exoscale.com/compute";
/// Default DNS API endpoint.
pub const DEFAULT_DNS_API_ENDPOINT: &str = "https://api.exoscale.com/dns";
/// Default runstatus API endpoint.
pub const DEFAULT_RUNSTATUS_API_ENDPOINT: &str = "https://api.runstatus.com";
/// Default IAM API endpoint.
pub const DEFAULT_IAM_API_ENDPOINT: &str = "https://api.exoscale.com/v2";
/// Default object storage zone.
pub const DEFAULT_STORAGE_ZONE: &str = "ch-gva-2";

/// Returns the compiled-in endpoint of `family`.
///
/// The storage endpoint depends on the zone.
///
/// ```rust
/// use exoscale::clients::ApiFamily;
/// use exoscale::default_endpoint;
///
/// assert_eq!(default_endpoint(ApiFamily::Storage, "de-fra-1"), "https://sos-de-fra-1.exo.io");
/// ```
#[must_use]
pub fn default_endpoint(family: ApiFamily, storage_zone: &str) -> String {
    match family {
        ApiFamily::Compute => DEFAULT_COMPUTE_API_ENDPOINT.to_string(),
        ApiFamily::Dns => DEFAULT_DNS_API_ENDPOINT.to_string(),
        ApiFamily::Storage => format!("https://sos-{storage_zone}.exo.io"),
        ApiFamily::Runstatus => DEFAULT_RUNSTATUS_API_ENDPOINT.to_string(),
        ApiFamily::Iam => DEFAULT_IAM_API_ENDPOINT.to_string(),
    }
}

/// An Exoscale API client.
///
/// # Example
///
/// ```rust,ignore
/// use exoscale::{Exoscale, ExoscaleConfig};
/// use exoscale::clients::{HttpMethod, HttpRequest};
///
/// // Credentials from ~/.config/exoscale/exoscale.toml or EXOSCALE_API_KEY/SECRET
/// let client = Exoscale::new(ExoscaleConfig::builder().trace(true).build())?;
///
/// let request = HttpRequest::builder(HttpMethod::Get, "zone").build()?;
/// let zones = client.compute.send(request).await?;
/// ```
#[derive(Clone)]
pub struct Exoscale {
    resolved: ResolvedConfig,
    /// The compute API dispatcher.
    pub compute: Dispatcher,
    /// The DNS API dispatcher.
    pub dns: Dispatcher,
    /// The object storage API dispatcher.
    pub storage: Dispatcher,
    /// The runstatus API dispatcher.
    pub runstatus: Dispatcher,
    /// The IAM API dispatcher.
    pub iam: Dispatcher,
}

// Verify Exoscale is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Exoscale>();
};

impl fmt::Debug for Exoscale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Exoscale(api_key='{}')",
            self.resolved.credentials().key()
        )
    }
}

impl Exoscale {
    /// Resolves `config` against the process environment and builds the
    /// client.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if resolution fails or the connection pool
    /// cannot be created. No client is built in that case.
    pub fn new(config: ExoscaleConfig) -> Result<Self, ConfigError> {
        Self::with_environment(config, &ProcessEnvironment)
    }

    /// Resolves `config` against `env` and builds the client.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub fn with_environment(
        config: ExoscaleConfig,
        env: &impl Environment,
    ) -> Result<Self, ConfigError> {
        let resolved = resolve(&config, env)?;
        Self::from_resolved(resolved, &config)
    }

    /// Builds the family dispatchers from an already resolved configuration.
    ///
    /// Transport settings (retries, timeout, tracing, signer) are read from
    /// `settings`; its credential and endpoint fields are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::HttpClient`] if the connection pool cannot be
    /// created.
    pub fn from_resolved(
        resolved: ResolvedConfig,
        settings: &ExoscaleConfig,
    ) -> Result<Self, ConfigError> {
        let pool = HttpSession::build_client(settings.timeout()).map_err(ConfigError::HttpClient)?;
        let credentials = Arc::new(resolved.credentials().clone());
        let signer: Arc<dyn RequestSigner> = match settings.signer() {
            Some(signer) => Arc::clone(signer),
            None => Arc::new(Exo2Signer::default()),
        };
        let retry = settings.retry_policy();
        let zone = resolved
            .storage_zone()
            .unwrap_or(DEFAULT_STORAGE_ZONE)
            .to_string();

        let build = |family: ApiFamily| {
            let endpoint = resolved
                .endpoints()
                .get(family)
                .map_or_else(|| default_endpoint(family, &zone), String::from);
            let session = HttpSession::with_client(pool.clone(), retry.clone(), settings.trace());
            tracing::debug!(%family, %endpoint, "building API dispatcher");
            Dispatcher::new(
                family,
                endpoint,
                Arc::clone(&credentials),
                session,
                Arc::clone(&signer),
            )
        };

        let compute = build(ApiFamily::Compute);
        let dns = build(ApiFamily::Dns);
        let storage = build(ApiFamily::Storage).with_zone(zone.clone());
        let runstatus = build(ApiFamily::Runstatus);
        let iam = build(ApiFamily::Iam);

        Ok(Self {
            resolved,
            compute,
            dns,
            storage,
            runstatus,
            iam,
        })
    }

    /// Returns the resolved configuration the client was built from.
    #[must_use]
    pub const fn config(&self) -> &ResolvedConfig {
        &self.resolved
    }

    /// Returns the dispatcher of `family`.
    #[must_use]
    pub const fn dispatcher(&self, family: ApiFamily) -> &Dispatcher {
        match family {
            ApiFamily::Compute => &self.compute,
            ApiFamily::Dns => &self.dns,
            ApiFamily::Storage => &self.storage,
            ApiFamily::Runstatus => &self.runstatus,
            ApiFamily::Iam => &self.iam,
        }
    }
}

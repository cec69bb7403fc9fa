//! Error types for the Exoscale API client.
//!
//! This module contains the configuration error raised while resolving
//! credentials and endpoints, and the crate-level [`Error`] that wraps both
//! configuration and HTTP failures.
//!
//! # Error Handling
//!
//! Configuration errors are raised before any client object exists: an
//! [`Exoscale`](crate::Exoscale) client is either fully built or not built at
//! all. They are never retried.
//!
//! # Example
//!
//! ```rust
//! use exoscale::{ApiKey, ConfigError};
//!
//! let result = ApiKey::new("");
//! assert!(matches!(result, Err(ConfigError::EmptyApiKey)));
//! ```

use std::path::PathBuf;

use thiserror::Error;

use crate::clients::HttpError;

/// Errors that can occur while resolving the client configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// API key cannot be empty.
    #[error("API key cannot be empty. Please provide a valid Exoscale API key.")]
    EmptyApiKey,

    /// API secret cannot be empty.
    #[error("API secret cannot be empty. Please provide a valid Exoscale API secret.")]
    EmptyApiSecret,

    /// A configuration file was found but defines no profile.
    #[error("no profiles configured")]
    NoProfiles,

    /// The requested profile does not exist in the configuration file.
    #[error("profile \"{name}\" not found")]
    ProfileNotFound {
        /// The profile name that was looked up.
        name: String,
    },

    /// The selected profile lacks one of its mandatory keys.
    #[error("profile missing \"{key}\" key")]
    ProfileMissingKey {
        /// The name of the missing key.
        key: &'static str,
    },

    /// Several profiles are configured and none was selected.
    #[error("{count} profiles configured but none selected; set a profile name or \"default_profile\"")]
    AmbiguousProfile {
        /// Number of profiles in the configuration file.
        count: usize,
    },

    /// No API key/secret pair could be found in any source.
    #[error("missing API key/secret")]
    MissingCredentials,

    /// The configuration file could not be read.
    #[error("unable to read configuration file {}: {source}", path.display())]
    Io {
        /// Path of the configuration file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML or has an unexpected shape.
    #[error("unable to parse configuration file {}: {source}", path.display())]
    Parse {
        /// Path of the configuration file.
        path: PathBuf,
        /// The underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// The HTTP connection pool could not be created.
    #[error("unable to create HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Top-level error type for the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be resolved.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An HTTP request failed.
    #[error(transparent)]
    Http(#[from] HttpError),
}

//! # Exoscale API Rust SDK
//!
//! A Rust client for the Exoscale cloud APIs, providing multi-source
//! configuration, request signing, and an async HTTP layer with retries for
//! the compute, DNS, object storage, runstatus and IAM API families.
//!
//! ## Overview
//!
//! This SDK provides:
//! - Configuration resolution from explicit arguments, a TOML profile file
//!   and `EXOSCALE_*` environment variables via [`config::resolve`]
//! - Validated newtypes for API credentials
//! - Exo2 HMAC-SHA256 request signing, replaceable through
//!   [`auth::RequestSigner`]
//! - A pooled async HTTP session with bounded exponential backoff and
//!   optional request/response tracing
//! - One [`Dispatcher`] per API family, all sharing one set of credentials
//! - Shared, resettable [`Resource`] handles for API results
//!
//! ## Quick Start
//!
//! ```rust
//! use std::collections::HashMap;
//! use exoscale::{Exoscale, ExoscaleConfig};
//!
//! let mut env = HashMap::new();
//! env.insert("EXOSCALE_API_KEY".to_string(), "EXOxxxxxxxx".to_string());
//! env.insert("EXOSCALE_API_SECRET".to_string(), "secret".to_string());
//!
//! let config = ExoscaleConfig::builder().storage_zone("de-fra-1").build();
//! let client = Exoscale::with_environment(config, &env).unwrap();
//!
//! assert_eq!(client.compute.endpoint(), "https://api.exoscale.com/compute");
//! assert_eq!(client.storage.endpoint(), "https://sos-de-fra-1.exo.io");
//! ```
//!
//! ## Configuration File
//!
//! Profiles are read from `~/.config/exoscale/exoscale.toml`, from the file
//! named by `EXOSCALE_CONFIG_FILE`, or from an explicit path:
//!
//! ```rust,ignore
//! use exoscale::{Exoscale, ExoscaleConfig};
//!
//! let client = Exoscale::new(
//!     ExoscaleConfig::builder()
//!         .config_file("/etc/exoscale/exoscale.toml")
//!         .profile("production")
//!         .build(),
//! )?;
//! ```
//!
//! ## Making API Requests
//!
//! ```rust,ignore
//! use exoscale::{Exoscale, ExoscaleConfig, HttpMethod, HttpRequest};
//!
//! let client = Exoscale::new(ExoscaleConfig::default())?;
//!
//! let request = HttpRequest::builder(HttpMethod::Get, "instance/42")
//!     .single_resource()
//!     .build()?;
//!
//! match client.compute.find::<serde_json::Value>(request).await? {
//!     Some(instance) => println!("{:?}", instance.snapshot()),
//!     None => println!("no such instance"),
//! }
//! ```
//!
//! ## Tracing
//!
//! Diagnostics go through the [`tracing`] crate. With
//! [`ExoscaleConfigBuilder::trace`] enabled, every exchange is logged at
//! `INFO` on the `exoscale::trace` target once the response arrives.
//!
//! ## Design Principles
//!
//! - **No global state**: Configuration is instance-based and passed explicitly
//! - **All or nothing**: A client is fully configured or not built at all
//! - **Thread-safe**: All types are `Send + Sync`
//! - **Async-first**: Designed for use with Tokio async runtime

pub mod auth;
pub mod client;
pub mod clients;
pub mod config;
pub mod error;
pub mod rest;

// Re-export public types at crate root for convenience
pub use auth::{Credentials, Exo2Signer, RequestSigner};
pub use client::{default_endpoint, Exoscale, DEFAULT_STORAGE_ZONE};
pub use config::{
    ApiKey, ApiSecret, EndpointOverrides, ExoscaleConfig, ExoscaleConfigBuilder, ResolvedConfig,
};
pub use error::{ConfigError, Error};
pub use rest::{Clearable, Resource};

// Re-export HTTP client types
pub use clients::{
    ApiError, ApiFamily, Dispatcher, HttpError, HttpMethod, HttpRequest, HttpRequestBuilder,
    HttpResponse, InvalidHttpRequestError, RequestError, RetryPolicy,
};

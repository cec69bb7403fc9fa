//! Multi-source configuration resolution.
//!
//! Each field is taken from the first source that sets it to a non-empty
//! value:
//!
//! 1. the explicit [`ExoscaleConfig`] argument;
//! 2. the selected configuration file profile;
//! 3. the matching `EXOSCALE_*` environment variable.
//!
//! A field left unset by every source is `None`, which for endpoints means
//! "use the family default".
//!
//! The configuration file is looked up at the explicit `config_file` path,
//! then at `$EXOSCALE_CONFIG_FILE`, then at [`DEFAULT_CONFIG_PATH`] under the
//! home directory (only if it exists). Without a file, profile resolution is
//! skipped entirely.

use std::path::PathBuf;

use crate::auth::Credentials;
use crate::config::environment::{
    API_KEY_ENVVAR, API_SECRET_ENVVAR, COMPUTE_API_ENDPOINT_ENVVAR, CONFIG_FILE_ENVVAR,
    DNS_API_ENDPOINT_ENVVAR, IAM_API_ENDPOINT_ENVVAR, RUNSTATUS_API_ENDPOINT_ENVVAR,
    STORAGE_API_ENDPOINT_ENVVAR, STORAGE_ZONE_ENVVAR,
};
use crate::config::file::{ConfigFile, ProfileConfig, DEFAULT_CONFIG_PATH};
use crate::config::{ApiKey, ApiSecret, EndpointOverrides, Environment, ExoscaleConfig, ResolvedConfig};
use crate::error::ConfigError;

/// Resolves the final connection parameters.
///
/// # Errors
///
/// Returns [`ConfigError`] if:
/// - a configuration file cannot be read or parsed,
/// - the file defines no profile,
/// - the requested or default profile does not exist,
/// - several profiles exist and none is selected,
/// - the selected profile misses `name`, `api_key` or `api_secret`,
/// - no source provides an API key and secret.
///
/// # Example
///
/// ```rust
/// use std::collections::HashMap;
/// use exoscale::config::{resolve, ExoscaleConfig};
///
/// let mut env = HashMap::new();
/// env.insert("EXOSCALE_API_KEY".to_string(), "EXOkey".to_string());
/// env.insert("EXOSCALE_API_SECRET".to_string(), "secret".to_string());
///
/// let resolved = resolve(&ExoscaleConfig::default(), &env).unwrap();
/// assert_eq!(resolved.credentials().key().as_ref(), "EXOkey");
/// assert!(resolved.endpoints().compute.is_none());
/// ```
pub fn resolve(explicit: &ExoscaleConfig, env: &impl Environment) -> Result<ResolvedConfig, ConfigError> {
    let file = locate_config_file(explicit, env)?;

    let profile = match &file {
        Some((path, config)) => {
            let profile = config.select_profile(explicit.profile.as_deref())?;
            profile.validate()?;
            tracing::debug!(
                path = %path.display(),
                profile = profile.name.as_deref().unwrap_or_default(),
                "using configuration profile"
            );
            Some(profile)
        }
        None => None,
    };

    let pick = |explicit: &Option<String>, from_profile: fn(&ProfileConfig) -> &Option<String>, var: &str| {
        non_empty(explicit.as_deref())
            .or_else(|| profile.and_then(|p| non_empty(from_profile(p).as_deref())))
            .map(String::from)
            .or_else(|| env.var(var).filter(|value| !value.is_empty()))
    };

    let api_key = pick(&explicit.api_key, |p| &p.api_key, API_KEY_ENVVAR);
    let api_secret = pick(&explicit.api_secret, |p| &p.api_secret, API_SECRET_ENVVAR);

    let endpoints = EndpointOverrides {
        compute: pick(
            &explicit.endpoints.compute,
            |p| &p.compute_api_endpoint,
            COMPUTE_API_ENDPOINT_ENVVAR,
        ),
        dns: pick(&explicit.endpoints.dns, |p| &p.dns_api_endpoint, DNS_API_ENDPOINT_ENVVAR),
        storage: pick(
            &explicit.endpoints.storage,
            |p| &p.storage_api_endpoint,
            STORAGE_API_ENDPOINT_ENVVAR,
        ),
        runstatus: pick(
            &explicit.endpoints.runstatus,
            |p| &p.runstatus_api_endpoint,
            RUNSTATUS_API_ENDPOINT_ENVVAR,
        ),
        iam: pick(&explicit.endpoints.iam, |p| &p.iam_api_endpoint, IAM_API_ENDPOINT_ENVVAR),
    };
    let storage_zone = pick(&explicit.storage_zone, |p| &p.storage_zone, STORAGE_ZONE_ENVVAR);

    let (Some(api_key), Some(api_secret)) = (api_key, api_secret) else {
        return Err(ConfigError::MissingCredentials);
    };

    Ok(ResolvedConfig {
        credentials: Credentials::new(ApiKey::new(api_key)?, ApiSecret::new(api_secret)?),
        endpoints,
        storage_zone,
        profile: profile.and_then(|p| p.name.clone()),
    })
}

/// Finds and loads the configuration file, if any.
fn locate_config_file(
    explicit: &ExoscaleConfig,
    env: &impl Environment,
) -> Result<Option<(PathBuf, ConfigFile)>, ConfigError> {
    let named = explicit
        .config_file
        .clone()
        .filter(|path| !path.as_os_str().is_empty())
        .or_else(|| {
            env.var(CONFIG_FILE_ENVVAR)
                .filter(|path| !path.is_empty())
                .map(PathBuf::from)
        });

    if let Some(path) = named {
        let config = ConfigFile::load(&path)?;
        return Ok(Some((path, config)));
    }

    let Some(path) = env.home_dir().map(|home| home.join(DEFAULT_CONFIG_PATH)) else {
        return Ok(None);
    };
    if !path.is_file() {
        return Ok(None);
    }
    let config = ConfigFile::load(&path)?;
    Ok(Some((path, config)))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}

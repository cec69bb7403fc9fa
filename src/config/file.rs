//! TOML configuration file with named profiles.
//!
//! ```toml
//! default_profile = "production"
//!
//! [[profiles]]
//! name = "production"
//! api_key = "EXO..."
//! api_secret = "..."
//!
//! [[profiles]]
//! name = "lab"
//! api_key = "EXO..."
//! api_secret = "..."
//! compute_api_endpoint = "https://lab.example.net/compute"
//! storage_zone = "de-fra-1"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

/// Location of the configuration file relative to the home directory.
pub const DEFAULT_CONFIG_PATH: &str = ".config/exoscale/exoscale.toml";

/// The content of a configuration file.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct ConfigFile {
    /// Name of the profile used when none is requested.
    #[serde(default)]
    pub default_profile: Option<String>,
    /// Configured profiles, in file order.
    #[serde(default)]
    pub profiles: Option<Vec<ProfileConfig>>,
}

/// A named bundle of credentials and endpoint overrides.
///
/// Every field is optional at parse time; the profile that ends up selected
/// must carry a non-empty `name`, `api_key` and `api_secret`.
#[derive(Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProfileConfig {
    /// Profile name.
    pub name: Option<String>,
    /// API key.
    pub api_key: Option<String>,
    /// API secret.
    pub api_secret: Option<String>,
    /// Compute API endpoint override.
    pub compute_api_endpoint: Option<String>,
    /// DNS API endpoint override.
    pub dns_api_endpoint: Option<String>,
    /// Storage API endpoint override.
    pub storage_api_endpoint: Option<String>,
    /// Storage zone.
    pub storage_zone: Option<String>,
    /// Runstatus API endpoint override.
    pub runstatus_api_endpoint: Option<String>,
    /// IAM API endpoint override.
    pub iam_api_endpoint: Option<String>,
}

impl std::fmt::Debug for ProfileConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileConfig")
            .field("name", &self.name)
            .field("api_key", &self.api_key)
            .field("api_secret", &self.api_secret.as_ref().map(|_| "*****"))
            .field("compute_api_endpoint", &self.compute_api_endpoint)
            .field("dns_api_endpoint", &self.dns_api_endpoint)
            .field("storage_api_endpoint", &self.storage_api_endpoint)
            .field("storage_zone", &self.storage_zone)
            .field("runstatus_api_endpoint", &self.runstatus_api_endpoint)
            .field("iam_api_endpoint", &self.iam_api_endpoint)
            .finish()
    }
}

impl ProfileConfig {
    /// Checks that `name`, `api_key` and `api_secret` are present and
    /// non-empty, in that order.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ProfileMissingKey`] naming the first missing key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("name", &self.name),
            ("api_key", &self.api_key),
            ("api_secret", &self.api_secret),
        ];
        for (key, value) in required {
            if value.as_deref().map_or(true, str::is_empty) {
                return Err(ConfigError::ProfileMissingKey { key });
            }
        }
        Ok(())
    }
}

impl ConfigFile {
    /// Reads and parses the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it is not a valid configuration document.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    /// Parses configuration `content`; `path` is only used in errors.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if `content` is not a valid
    /// configuration document.
    pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: PathBuf::from(path),
            source,
        })
    }

    /// Selects the profile to use.
    ///
    /// `requested` (or, failing that, `default_profile`) is matched by exact
    /// name. With neither, a lone profile is selected implicitly while
    /// several profiles are ambiguous. An empty `requested` name counts as
    /// unset; a `default_profile` key present in the file is always looked
    /// up, even when empty.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::NoProfiles`] if `profiles` is missing or empty
    /// - [`ConfigError::ProfileNotFound`] if the wanted name does not exist
    /// - [`ConfigError::AmbiguousProfile`] if several profiles exist and none
    ///   was named
    pub fn select_profile(&self, requested: Option<&str>) -> Result<&ProfileConfig, ConfigError> {
        let profiles = match self.profiles.as_deref() {
            Some(profiles) if !profiles.is_empty() => profiles,
            _ => return Err(ConfigError::NoProfiles),
        };

        let wanted = requested
            .filter(|name| !name.is_empty())
            .or(self.default_profile.as_deref());

        match wanted {
            Some(name) => profiles
                .iter()
                .find(|profile| profile.name.as_deref() == Some(name))
                .ok_or_else(|| ConfigError::ProfileNotFound {
                    name: name.to_string(),
                }),
            None if profiles.len() == 1 => Ok(&profiles[0]),
            None => Err(ConfigError::AmbiguousProfile {
                count: profiles.len(),
            }),
        }
    }
}

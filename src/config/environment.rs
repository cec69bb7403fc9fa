//! Access to environment variables and the home directory.

use std::collections::HashMap;
use std::path::PathBuf;

/// Environment variable holding the API key.
pub const API_KEY_ENVVAR: &str = "EXOSCALE_API_KEY";
/// Environment variable holding the API secret.
pub const API_SECRET_ENVVAR: &str = "EXOSCALE_API_SECRET";
/// Environment variable overriding the compute API endpoint.
pub const COMPUTE_API_ENDPOINT_ENVVAR: &str = "EXOSCALE_COMPUTE_API_ENDPOINT";
/// Environment variable overriding the DNS API endpoint.
pub const DNS_API_ENDPOINT_ENVVAR: &str = "EXOSCALE_DNS_API_ENDPOINT";
/// Environment variable overriding the storage API endpoint.
pub const STORAGE_API_ENDPOINT_ENVVAR: &str = "EXOSCALE_STORAGE_API_ENDPOINT";
/// Environment variable overriding the runstatus API endpoint.
pub const RUNSTATUS_API_ENDPOINT_ENVVAR: &str = "EXOSCALE_RUNSTATUS_API_ENDPOINT";
/// Environment variable overriding the IAM API endpoint.
pub const IAM_API_ENDPOINT_ENVVAR: &str = "EXOSCALE_IAM_API_ENDPOINT";
/// Environment variable overriding the storage zone.
pub const STORAGE_ZONE_ENVVAR: &str = "EXOSCALE_STORAGE_ZONE";
/// Environment variable naming the configuration file.
pub const CONFIG_FILE_ENVVAR: &str = "EXOSCALE_CONFIG_FILE";

/// Source of environment variables for configuration resolution.
///
/// [`ProcessEnvironment`] reads the real process environment. A
/// `HashMap<String, String>` can stand in for it, with its `HOME` entry used
/// as the home directory.
pub trait Environment {
    /// Returns the value of variable `name`, if set.
    fn var(&self, name: &str) -> Option<String>;

    /// Returns the current user's home directory.
    fn home_dir(&self) -> Option<PathBuf>;
}

/// The environment of the running process.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        dirs::home_dir()
    }
}

impl Environment for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        self.get("HOME").map(PathBuf::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_environment_lookup() {
        let mut env = HashMap::new();
        env.insert(API_KEY_ENVVAR.to_string(), "EXOkey".to_string());
        env.insert("HOME".to_string(), "/home/alice".to_string());

        assert_eq!(env.var(API_KEY_ENVVAR), Some("EXOkey".to_string()));
        assert_eq!(env.var(API_SECRET_ENVVAR), None);
        assert_eq!(env.home_dir(), Some(PathBuf::from("/home/alice")));
    }

    #[test]
    fn test_map_environment_without_home() {
        let env: HashMap<String, String> = HashMap::new();
        assert!(env.home_dir().is_none());
    }
}

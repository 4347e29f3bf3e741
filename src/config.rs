/// Runtime configuration
///
/// Everything is read from `STOREFRONT_*` environment variables. The
/// database path and public URL are required; storage and preference
/// locations fall back to the platform data directory.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;

pub const DATABASE_PATH_VAR: &str = "STOREFRONT_DATABASE_PATH";
pub const PUBLIC_URL_VAR: &str = "STOREFRONT_PUBLIC_URL";
pub const STORAGE_DIR_VAR: &str = "STOREFRONT_STORAGE_DIR";
pub const PREFS_PATH_VAR: &str = "STOREFRONT_PREFS_PATH";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub database_path: Option<PathBuf>,
    /// Base URL that stored objects are served from
    pub public_url: Option<String>,
    pub storage_dir: Option<PathBuf>,
    pub prefs_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            database_path: get(DATABASE_PATH_VAR).map(PathBuf::from),
            public_url: get(PUBLIC_URL_VAR).map(|url| url.trim_end_matches('/').to_string()),
            storage_dir: get(STORAGE_DIR_VAR).map(PathBuf::from),
            prefs_path: get(PREFS_PATH_VAR).map(PathBuf::from),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.missing().is_empty()
    }

    /// Required variables that are not set
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.database_path.is_none() {
            missing.push(DATABASE_PATH_VAR);
        }
        if self.public_url.is_none() {
            missing.push(PUBLIC_URL_VAR);
        }
        missing
    }

    /// Message shown instead of starting when configuration is incomplete
    pub fn notice(&self) -> String {
        let mut notice = String::from("Storefront is not configured.\n");
        for var in self.missing() {
            notice.push_str(&format!("  {} is not set\n", var));
        }
        notice.push_str("Set the variables above and start again.");
        notice
    }

    pub fn database_path(&self) -> Result<&PathBuf, ConfigError> {
        self.database_path
            .as_ref()
            .ok_or(ConfigError::Missing(DATABASE_PATH_VAR))
    }

    pub fn public_url(&self) -> Result<&str, ConfigError> {
        self.public_url
            .as_deref()
            .ok_or(ConfigError::Missing(PUBLIC_URL_VAR))
    }

    pub fn storage_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.storage_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(default_data_dir()?.join("storage")),
        }
    }

    pub fn prefs_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.prefs_path {
            Some(path) => Ok(path.clone()),
            None => Ok(default_data_dir()?.join("preferences.json")),
        }
    }
}

/// `<platform data dir>/storefront`, or `~/storefront` without one
pub fn default_data_dir() -> Result<PathBuf, ConfigError> {
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .map(|dir| dir.join("storefront"))
        .ok_or(ConfigError::NoDataDir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_missing_required_values() {
        let cfg = config(&[]);
        assert!(!cfg.is_configured());
        assert_eq!(cfg.missing(), vec![DATABASE_PATH_VAR, PUBLIC_URL_VAR]);
        assert!(cfg.notice().contains(PUBLIC_URL_VAR));
        assert!(matches!(cfg.public_url(), Err(ConfigError::Missing(_))));
    }

    #[test]
    fn test_blank_counts_as_missing() {
        let cfg = config(&[(DATABASE_PATH_VAR, "/tmp/store.db"), (PUBLIC_URL_VAR, "  ")]);
        assert_eq!(cfg.missing(), vec![PUBLIC_URL_VAR]);
    }

    #[test]
    fn test_full_config() {
        let cfg = config(&[
            (DATABASE_PATH_VAR, "/tmp/store.db"),
            (PUBLIC_URL_VAR, "https://cdn.example.com/"),
            (STORAGE_DIR_VAR, "/tmp/objects"),
        ]);
        assert!(cfg.is_configured());
        assert_eq!(cfg.public_url().unwrap(), "https://cdn.example.com");
        assert_eq!(cfg.storage_dir().unwrap(), PathBuf::from("/tmp/objects"));
        assert_eq!(cfg.database_path().unwrap(), &PathBuf::from("/tmp/store.db"));
    }
}

//! Configuration management for portalop

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ConfigError, Result};

/// Default portal API host
pub const DEFAULT_API_HOST: &str = "https://do.cert.europa.eu";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Portal API key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Portal host, without the `/api/1.0` suffix
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_host: Option<String>,

    /// User preferences
    #[serde(default)]
    pub preferences: Preferences,
}

/// User preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preferences {
    /// Default output format
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Fields hidden from grid columns
    #[serde(default = "default_exclude_keys")]
    pub exclude_keys: Vec<String>,

    /// Client-side request rate limit
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,

    /// Upper bound on concurrent report fetches
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

fn default_exclude_keys() -> Vec<String> {
    vec!["id".to_string()]
}

fn default_requests_per_second() -> u32 {
    10
}

fn default_max_concurrent() -> usize {
    8
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            format: None,
            exclude_keys: default_exclude_keys(),
            requests_per_second: default_requests_per_second(),
            max_concurrent: default_max_concurrent(),
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::Invalid(
            "Could not determine home directory".to_string(),
        ))?;

        Ok(home.join(".portalop").join("config.yaml"))
    }

    /// Resolve an optional override to a concrete config path
    pub fn resolve_path(path: Option<&str>) -> Result<PathBuf> {
        match path {
            Some(p) => Ok(PathBuf::from(p)),
            None => Self::default_path(),
        }
    }

    /// Load configuration from an optional override path
    pub fn load_at(path: Option<&str>) -> Result<Self> {
        Self::load_from(Self::resolve_path(path)?)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound.into());
        }

        let contents = std::fs::read_to_string(&path)?;
        let config: Config = serde_yaml::from_str(&contents).map_err(ConfigError::from)?;

        Ok(config)
    }

    /// Save configuration to an optional override path
    pub fn save_at(&self, path: Option<&str>) -> Result<()> {
        self.save_to(Self::resolve_path(path)?)
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents =
            serde_yaml::to_string(self).map_err(|e| ConfigError::SaveError(e.to_string()))?;

        std::fs::write(&path, contents)?;

        // Holds the API key
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(&path)?.permissions();
            perms.set_mode(0o600);
            std::fs::set_permissions(&path, perms)?;
        }

        Ok(())
    }

    /// Host to talk to, falling back to the public portal
    pub fn api_host(&self) -> &str {
        self.api_host.as_deref().unwrap_or(DEFAULT_API_HOST)
    }

    /// Validate that required configuration is present
    pub fn validate_auth(&self) -> Result<()> {
        if self.api_key.is_none() {
            return Err(ConfigError::MissingApiKey.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.api_key.is_none());
        assert_eq!(config.api_host(), DEFAULT_API_HOST);
        assert_eq!(config.preferences.exclude_keys, vec!["id"]);
        assert_eq!(config.preferences.requests_per_second, 10);
        assert_eq!(config.preferences.max_concurrent, 8);
    }

    #[test]
    fn test_partial_preferences_use_defaults() {
        let yaml = "api_key: k\npreferences:\n  max_concurrent: 2\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.preferences.max_concurrent, 2);
        assert_eq!(config.preferences.exclude_keys, vec!["id"]);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let config = Config {
            api_key: Some("secret".to_string()),
            api_host: Some("http://localhost:5000".to_string()),
            preferences: Preferences::default(),
        };
        config.save_to(path.clone()).unwrap();

        let loaded = Config::load_from(path).unwrap();
        assert_eq!(loaded.api_key.as_deref(), Some("secret"));
        assert_eq!(loaded.api_host(), "http://localhost:5000");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load_from(dir.path().join("absent.yaml"));

        assert!(matches!(result, Err(Error::Config(ConfigError::NotFound))));
    }

    #[test]
    fn test_validate_auth_requires_key() {
        let config = Config::default();
        assert!(config.validate_auth().is_err());
    }
}

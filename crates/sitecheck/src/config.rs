//! Configuration management for sitecheck.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "sitecheck";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "records.db";

/// Prefix for environment variable overrides.
const ENV_PREFIX: &str = "SITECHECK_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `SITECHECK_`, sections split by `__`)
/// 2. TOML config file at `~/.config/sitecheck/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration.
    pub server: ServerConfig,
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Inspection configuration.
    pub inspection: InspectionConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind: String,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/sitecheck/records.db`
    pub database_path: Option<PathBuf>,
    /// Maximum number of records returned by a list view.
    pub list_limit: usize,
}

/// Inspection-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectionConfig {
    /// Site codes that can be inspected, first is the form default.
    pub sites: Vec<String>,
    /// Optional TOML checklist replacing the built-in catalog.
    pub checklist_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5000".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            list_limit: 200,
        }
    }
}

impl Default for InspectionConfig {
    fn default() -> Self {
        Self {
            sites: vec!["DC1".to_string(), "DC2".to_string()],
            checklist_path: None,
        }
    }
}

impl Config {
    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        self.bind_addr()?;

        if self.storage.list_limit == 0 {
            return Err(Error::ConfigValidation {
                message: "list_limit must be greater than 0".to_string(),
            });
        }

        if self.inspection.sites.is_empty() {
            return Err(Error::ConfigValidation {
                message: "at least one site must be configured".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for site in &self.inspection.sites {
            if site.trim().is_empty() || site.trim() != site {
                return Err(Error::ConfigValidation {
                    message: format!("invalid site code '{site}'"),
                });
            }
            if !seen.insert(site.as_str()) {
                return Err(Error::ConfigValidation {
                    message: format!("duplicate site code '{site}'"),
                });
            }
        }

        Ok(())
    }

    /// Get the bind address as a socket address.
    ///
    /// # Errors
    ///
    /// Returns an error if the address does not parse.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.server
            .bind
            .parse()
            .map_err(|_| Error::ConfigValidation {
                message: format!("invalid bind address: {}", self.server.bind),
            })
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.bind, "127.0.0.1:5000");
        assert_eq!(config.storage.list_limit, 200);
        assert!(config.storage.database_path.is_none());
        assert_eq!(config.inspection.sites, vec!["DC1", "DC2"]);
        assert!(config.inspection.checklist_path.is_none());
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_zero_list_limit() {
        let mut config = Config::default();
        config.storage.list_limit = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("list_limit"));
    }

    #[test]
    fn test_validate_invalid_bind() {
        let mut config = Config::default();
        config.server.bind = "not an address".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("invalid bind address"));
    }

    #[test]
    fn test_validate_no_sites() {
        let mut config = Config::default();
        config.inspection.sites.clear();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("at least one site"));
    }

    #[test]
    fn test_validate_duplicate_site() {
        let mut config = Config::default();
        config.inspection.sites.push("DC1".to_string());

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("duplicate site code 'DC1'"));
    }

    #[test]
    fn test_validate_blank_site() {
        let mut config = Config::default();
        config.inspection.sites.push(" ".to_string());

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bind_addr() {
        let config = Config::default();
        assert_eq!(config.bind_addr().unwrap().port(), 5000);
    }

    #[test]
    fn test_database_path_default() {
        let config = Config::default();
        assert!(config
            .database_path()
            .to_string_lossy()
            .contains("records.db"));
    }

    #[test]
    fn test_database_path_custom() {
        let mut config = Config::default();
        config.storage.database_path = Some(PathBuf::from("/custom/path/db.sqlite"));

        assert_eq!(
            config.database_path(),
            PathBuf::from("/custom/path/db.sqlite")
        );
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("sitecheck"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        let config = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml"))).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[server]
bind = "0.0.0.0:8080"

[storage]
list_limit = 50

[inspection]
sites = ["NORTH", "SOUTH", "EAST"]
"#
        )
        .unwrap();

        let config = Config::load_from(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.storage.list_limit, 50);
        assert_eq!(config.inspection.sites, vec!["NORTH", "SOUTH", "EAST"]);
    }

    #[test]
    fn test_load_rejects_invalid_file_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[storage]\nlist_limit = 0").unwrap();

        let err = Config::load_from(Some(file.path().to_path_buf())).unwrap_err();
        assert!(matches!(err, Error::ConfigValidation { .. }));
    }

    #[test]
    fn test_config_serialize() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(json.contains("list_limit"));
        assert!(json.contains("sites"));
    }

    #[test]
    fn test_storage_config_deserialize_partial() {
        let json = r#"{"list_limit": 25}"#;
        let storage: StorageConfig = serde_json::from_str(json).unwrap();
        assert_eq!(storage.list_limit, 25);
        assert!(storage.database_path.is_none());
    }
}

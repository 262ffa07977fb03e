//! Configuration management for the CLI.
//!
//! Loaded from TOML. Every field has a default, so a missing file is fine:
//!
//! ```toml
//! database = "/home/me/.kinship/kinship.db"
//! log_level = "info"
//! format = "json"
//! ```

use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// SQLite database path
    #[serde(default = "default_database")]
    pub database: PathBuf,

    /// Tracing filter directive used when `KINSHIP_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Default output format
    #[serde(default)]
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON
    Json,
}

fn default_database() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".kinship").join("kinship.db"))
        .unwrap_or_else(|| PathBuf::from("kinship.db"))
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: default_database(),
            log_level: default_log_level(),
            format: OutputFormat::default(),
        }
    }
}

impl Config {
    /// Default configuration file path (`~/.kinship/config.toml`).
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".kinship").join("config.toml"))
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the default path is loaded,
    /// or initialized with built-in defaults on first run.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Ok(path) => Self::load_or_init(&path),
                Err(_) => Ok(Self::default()),
            },
        }
    }

    /// Load `path` if it exists, otherwise write the defaults there.
    ///
    /// A failed write still yields the defaults.
    pub fn load_or_init(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::from_file(path);
        }

        let config = Self::default();
        config.save(path).ok();
        Ok(config)
    }

    /// Parse configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: Config = toml::from_str(&contents)?;

        if config.log_level.trim().is_empty() {
            return Err(CliError::Config("log_level must not be empty".into()));
        }

        Ok(config)
    }

    /// Save configuration to a TOML file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.format, OutputFormat::Text);
        assert!(config.database.ends_with("kinship.db"));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "format = \"json\"\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            database: dir.path().join("graph.db"),
            log_level: "kinship_graph=debug".to_string(),
            format: OutputFormat::Json,
        };

        config.save(&path).unwrap();
        assert_eq!(Config::load(Some(&path)).unwrap(), config);
    }

    #[test]
    fn test_first_run_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".kinship").join("config.toml");

        let config = Config::load_or_init(&path).unwrap();
        assert_eq!(config, Config::default());
        assert!(path.exists(), "defaults should be written on first run");

        // Later runs read the file back, including user edits
        fs::write(&path, "log_level = \"debug\"\n").unwrap();
        assert_eq!(Config::load_or_init(&path).unwrap().log_level, "debug");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load(Some(&dir.path().join("absent.toml")));
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "format = [").unwrap();

        assert!(matches!(Config::load(Some(&path)), Err(CliError::Toml(_))));
    }

    #[test]
    fn test_empty_log_level_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "log_level = \"\"\n").unwrap();

        assert!(matches!(Config::load(Some(&path)), Err(CliError::Config(_))));
    }
}

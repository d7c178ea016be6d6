
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Name reported in `serverInfo` unless configured otherwise
pub const DEFAULT_SERVER_NAME: &str = "My Windsurf MCP Server";

/// Log filter applied when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "starter_mcp=info";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub name: String,
    /// Sent to clients on `initialize`; blank means none
    pub instructions: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_SERVER_NAME.to_string(),
            instructions: "Demonstration server exposing greet_user, add_numbers and list_files"
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found or could not be created")]
    DirectoryError,
    #[error("Invalid server name: {0:?} (cannot be empty)")]
    InvalidServerName(String),
    #[error("Invalid log filter {0:?}: {1}")]
    InvalidLogFilter(String, String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Config {
    /// `~/.starter-mcp`, where the config lives unless `--config-dir` is given
    #[inline]
    pub fn default_dir() -> Result<PathBuf, ConfigError> {
        dirs::home_dir()
            .map(|home| home.join(".starter-mcp"))
            .ok_or(ConfigError::DirectoryError)
    }

    /// Load `config.toml` from `config_dir`, falling back to defaults when absent
    #[inline]
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join("config.toml");

        if !config_path.exists() {
            return Ok(Self {
                base_dir: config_dir.as_ref().to_path_buf(),
                ..Self::default()
            });
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;
        config.base_dir = config_dir.as_ref().to_path_buf();

        config
            .validate()
            .with_context(|| "Configuration validation failed")?;

        Ok(config)
    }

    #[inline]
    pub fn save(&self) -> Result<()> {
        self.validate()
            .context("Configuration validation failed before saving")?;

        let config_dir = self.get_base_dir();

        fs::create_dir_all(config_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                config_dir.display()
            )
        })?;

        let config_path = self.config_file_path();
        let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    /// Get the base directory for the application
    #[inline]
    pub fn get_base_dir(&self) -> &Path {
        &self.base_dir
    }

    #[inline]
    pub fn config_file_path(&self) -> PathBuf {
        self.get_base_dir().join("config.toml")
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Server instructions, if any were configured
    #[inline]
    pub fn instructions(&self) -> Option<String> {
        let instructions = self.server.instructions.trim();
        (!instructions.is_empty()).then(|| instructions.to_string())
    }
}

impl ServerConfig {
    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::InvalidServerName(self.name.clone()));
        }
        Ok(())
    }

    #[inline]
    pub fn set_name(&mut self, name: String) -> Result<(), ConfigError> {
        if name.trim().is_empty() {
            return Err(ConfigError::InvalidServerName(name));
        }
        self.name = name;
        Ok(())
    }
}

impl LoggingConfig {
    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::check_filter(&self.filter)
    }

    /// Build the tracing filter; `RUST_LOG` wins over the configured value
    #[inline]
    pub fn env_filter(&self) -> Result<EnvFilter, ConfigError> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => EnvFilter::try_new(&self.filter)
                .map_err(|e| ConfigError::InvalidLogFilter(self.filter.clone(), e.to_string())),
        }
    }

    #[inline]
    pub fn set_filter(&mut self, filter: String) -> Result<(), ConfigError> {
        Self::check_filter(&filter)?;
        self.filter = filter;
        Ok(())
    }

    fn check_filter(filter: &str) -> Result<(), ConfigError> {
        EnvFilter::try_new(filter)
            .map(|_| ())
            .map_err(|e| ConfigError::InvalidLogFilter(filter.to_string(), e.to_string()))
    }
}

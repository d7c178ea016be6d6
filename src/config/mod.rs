// Configuration management module
// TOML settings on disk plus the interactive editor used by `starter-mcp config`

pub mod interactive;
pub mod settings;

pub use interactive::{run_interactive_config, show_config};
pub use settings::{Config, ConfigError, LoggingConfig, ServerConfig};

/// Get the default configuration directory path
#[inline]
pub fn get_config_dir() -> Result<std::path::PathBuf, ConfigError> {
    Config::default_dir()
}

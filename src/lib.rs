use thiserror::Error;

pub type Result<T> = std::result::Result<T, StarterError>;

#[derive(Error, Debug)]
pub enum StarterError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("MCP error: {0}")]
    Mcp(#[from] mcp::McpError),

    #[error("Tool '{0}' reported an error")]
    ToolFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0:#}")]
    Other(#[from] anyhow::Error),
}

pub mod commands;
pub mod config;
pub mod mcp;
pub mod tools;

//! MCP Error Handling
//!
//! Error classification for the MCP server and the mapping from errors to
//! JSON-RPC error responses.

use crate::mcp::protocol::*;
use thiserror::Error;
use tracing::error;

/// MCP-specific errors that can occur during server operation
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Unknown tool: {name}")]
    ToolNotFound { name: String },

    #[error("Tool already registered: {name}")]
    DuplicateTool { name: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Internal server error: {message}")]
    InternalError { message: String },

    #[error("JSON-RPC parse error: {message}")]
    ParseError { message: String },

    #[error("Method not found: {method}")]
    MethodNotFound { method: String },

    #[error("Invalid parameters: {message}")]
    InvalidParameters { message: String },
}

impl McpError {
    /// Convert MCP error to JSON-RPC error
    #[inline]
    pub fn to_jsonrpc_error(&self) -> JsonRpcError {
        let code = match self {
            Self::ToolNotFound { .. } | Self::InvalidParameters { .. } => {
                error_codes::INVALID_PARAMS
            }
            Self::InvalidRequest { .. } => error_codes::INVALID_REQUEST,
            Self::ParseError { .. } => error_codes::PARSE_ERROR,
            Self::MethodNotFound { .. } => error_codes::METHOD_NOT_FOUND,
            Self::DuplicateTool { .. } | Self::InternalError { .. } => {
                error_codes::INTERNAL_ERROR
            }
        };
        let message = match self {
            Self::InvalidRequest { message }
            | Self::InternalError { message }
            | Self::ParseError { message }
            | Self::InvalidParameters { message } => message.clone(),
            other => other.to_string(),
        };
        JsonRpcError::new(code, message, None)
    }

    /// Create error response message
    #[inline]
    pub fn to_error_response(&self, id: Option<RequestId>) -> JsonRpcMessage {
        let error = self.to_jsonrpc_error();
        let error_response = JsonRpcErrorResponse::new(error, id);
        JsonRpcMessage::ErrorResponse(error_response)
    }

    /// Log the error with appropriate level
    #[inline]
    pub fn log(&self) {
        match self {
            Self::ParseError { .. }
            | Self::InvalidRequest { .. }
            | Self::InvalidParameters { .. } => {
                error!("Client error: {}", self);
            }
            Self::ToolNotFound { .. } | Self::MethodNotFound { .. } => {
                error!("Not found error: {}", self);
            }
            Self::DuplicateTool { .. } | Self::InternalError { .. } => {
                error!("Server error: {}", self);
            }
        }
    }
}

/// Error handler utility for consistent error processing
pub struct ErrorHandler;

impl ErrorHandler {
    /// Handle any error and convert to appropriate JSON-RPC response
    #[inline]
    pub fn handle_error(error: &anyhow::Error, id: Option<RequestId>) -> JsonRpcMessage {
        if let Some(mcp_error) = error.downcast_ref::<McpError>() {
            mcp_error.log();
            return mcp_error.to_error_response(id);
        }

        error!("Unexpected error: {:#}", error);
        let internal_error = McpError::InternalError {
            message: format!("{:#}", error),
        };
        internal_error.to_error_response(id)
    }
}

/// Result type for MCP operations
pub type McpResult<T> = Result<T, McpError>;

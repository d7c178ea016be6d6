//! The tools this server exposes.
//!
//! Each submodule pairs a plain function holding the tool's behavior with a
//! [`ToolHandler`](crate::mcp::ToolHandler) that adapts it to MCP. The
//! functions know nothing about the protocol and can be called directly.

pub mod add;
pub mod greet;
pub mod list_files;


use crate::mcp::{CallToolParams, CallToolResult, McpResult, ToolRegistry};
use serde::de::DeserializeOwned;
use serde_json::Value;

pub use add::{AddNumbersHandler, add_numbers};
pub use greet::{GreetUserHandler, greet_user};
pub use list_files::{DEFAULT_DIRECTORY, ListFilesHandler, list_files};

/// Build the registry holding every tool, in advertisement order
#[inline]
pub fn build_registry() -> McpResult<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register(GreetUserHandler::descriptor(), GreetUserHandler)?;
    registry.register(AddNumbersHandler::descriptor(), AddNumbersHandler)?;
    registry.register(ListFilesHandler::descriptor(), ListFilesHandler)?;
    Ok(registry)
}

/// Deserialize a tool's arguments into its typed argument struct.
///
/// A failure is returned as a ready-made error result for the caller.
fn parse_arguments<T: DeserializeOwned>(params: CallToolParams) -> Result<T, CallToolResult> {
    let arguments = Value::Object(params.arguments.unwrap_or_default());
    serde_json::from_value(arguments).map_err(|e| {
        CallToolResult::error(format!("Invalid arguments for tool '{}': {}", params.name, e))
    })
}

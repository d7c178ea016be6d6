//! MCP (Model Context Protocol) Server Implementation
//!
//! A JSON-RPC 2.0 server speaking MCP over newline-delimited streams. Tools
//! plug in through [`ToolRegistry`] and [`ToolHandler`]; nothing in here
//! knows what the individual tools do.


pub mod errors;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod validation;

pub use errors::{ErrorHandler, McpError, McpResult};
pub use protocol::*;
pub use registry::{ParamSpec, ParamType, ToolDescriptor, ToolHandler, ToolRegistry};
pub use server::{ConnectionState, McpServer, MessageHandler};

//! MCP Protocol Types and Messages
//!
//! This module defines the Model Context Protocol message types used by the
//! server, following the JSON-RPC 2.0 specification.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Latest MCP protocol version understood by the server
pub const MCP_VERSION: &str = "2025-06-18";

/// Every protocol version the server can speak, newest first
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &[MCP_VERSION, "2025-03-26", "2024-11-05"];

/// JSON-RPC 2.0 version identifier
pub const JSONRPC_VERSION: &str = "2.0";

/// Unique identifier for JSON-RPC messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    String(String),
    Number(i64),
}

/// JSON-RPC 2.0 Request message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    pub id: RequestId,
}

/// JSON-RPC 2.0 Response message (success)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub result: Value,
    pub id: RequestId,
}

/// JSON-RPC 2.0 Error object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// JSON-RPC 2.0 Error response
///
/// `id` is serialized as `null` when the request id could not be determined.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcErrorResponse {
    pub jsonrpc: String,
    pub error: JsonRpcError,
    pub id: Option<RequestId>,
}

/// JSON-RPC 2.0 Notification message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// Any JSON-RPC message type
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcMessage {
    Request(JsonRpcRequest),
    Response(JsonRpcResponse),
    ErrorResponse(JsonRpcErrorResponse),
    Notification(JsonRpcNotification),
}

/// MCP Initialize Request parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeParams {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    #[serde(default)]
    pub capabilities: ClientCapabilities,
    #[serde(rename = "clientInfo")]
    pub client_info: Implementation,
}

/// MCP Initialize Response result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeResult {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    #[serde(rename = "serverInfo")]
    pub server_info: Implementation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

/// Client capabilities
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientCapabilities {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experimental: Option<HashMap<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sampling: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roots: Option<Value>,
}

/// Server capabilities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerCapabilities {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolsCapability>,
}

/// Implementation information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Implementation {
    pub name: String,
    pub version: String,
}

/// Tools capability
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsCapability {
    #[serde(rename = "listChanged")]
    pub list_changed: Option<bool>,
}

/// Tool definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Tool call request parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallToolParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Option<Map<String, Value>>,
}

/// Tool call result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallToolResult {
    pub content: Vec<ToolContent>,
    #[serde(
        rename = "structuredContent",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub structured_content: Option<Value>,
    #[serde(rename = "isError")]
    pub is_error: Option<bool>,
}

/// Tool content types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ToolContent {
    #[serde(rename = "text")]
    Text { text: String },
}

/// List tools response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListToolsResult {
    pub tools: Vec<Tool>,
}

/// Standard JSON-RPC error codes
pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
}

impl JsonRpcRequest {
    /// Create a new JSON-RPC request
    #[inline]
    pub fn new(method: String, params: Option<Value>, id: RequestId) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method,
            params,
            id,
        }
    }
}

impl JsonRpcResponse {
    /// Create a new JSON-RPC response
    #[inline]
    pub fn new(result: Value, id: RequestId) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result,
            id,
        }
    }
}

impl JsonRpcErrorResponse {
    /// Create a new JSON-RPC error response
    #[inline]
    pub fn new(error: JsonRpcError, id: Option<RequestId>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            error,
            id,
        }
    }
}

impl JsonRpcNotification {
    /// Create a new JSON-RPC notification
    #[inline]
    pub fn new(method: String, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method,
            params,
        }
    }
}

impl JsonRpcError {
    /// Create a new JSON-RPC error
    #[inline]
    pub fn new(code: i32, message: String, data: Option<Value>) -> Self {
        Self {
            code,
            message,
            data,
        }
    }
}

impl CallToolResult {
    /// Successful result carrying a single text block
    #[inline]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            structured_content: None,
            is_error: Some(false),
        }
    }

    /// Failed result; the message is shown to the model instead of a protocol error
    #[inline]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: message.into(),
            }],
            structured_content: None,
            is_error: Some(true),
        }
    }

    /// Attach `{"result": value}` as structured content
    #[inline]
    #[must_use]
    pub fn with_result(mut self, value: Value) -> Self {
        let mut map = Map::new();
        map.insert("result".to_string(), value);
        self.structured_content = Some(Value::Object(map));
        self
    }

    /// Concatenated text of all text blocks
    #[inline]
    pub fn text_content(&self) -> String {
        self.content
            .iter()
            .map(|content| match content {
                ToolContent::Text { text } => text.as_str(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_without_params_deserializes() {
        let request: JsonRpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":7,"method":"tools/list"}"#)
                .expect("request parses");
        assert_eq!(request.id, RequestId::Number(7));
        assert!(request.params.is_none());
    }

    #[test]
    fn notification_is_not_mistaken_for_request() {
        let message: JsonRpcMessage =
            serde_json::from_str(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
                .expect("message parses");
        assert!(matches!(message, JsonRpcMessage::Notification(_)));
    }

    #[test]
    fn error_response_keeps_null_id() {
        let response = JsonRpcErrorResponse::new(
            JsonRpcError::new(error_codes::PARSE_ERROR, "Parse error".to_string(), None),
            None,
        );
        let value = serde_json::to_value(&response).expect("serializes");
        assert_eq!(value["id"], Value::Null);
        assert_eq!(value["error"]["code"], error_codes::PARSE_ERROR);
        assert!(value["error"].get("data").is_none());
    }

    #[test]
    fn initialize_params_without_capabilities() {
        let params: InitializeParams = serde_json::from_value(json!({
            "protocolVersion": "2024-11-05",
            "clientInfo": {"name": "windsurf", "version": "1.0.0"}
        }))
        .expect("params parse");
        assert_eq!(params.client_info.name, "windsurf");
        assert!(params.capabilities.experimental.is_none());
    }

    #[test]
    fn initialize_result_omits_missing_instructions() {
        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: Some(false),
                }),
            },
            server_info: Implementation {
                name: "starter-mcp".to_string(),
                version: "0.1.0".to_string(),
            },
            instructions: None,
        };
        let value = serde_json::to_value(result).expect("serializes");
        assert_eq!(value["capabilities"]["tools"]["listChanged"], false);
        assert_eq!(value["serverInfo"]["name"], "starter-mcp");
        assert!(value.get("instructions").is_none());
    }

    #[test]
    fn call_tool_result_wire_format() {
        let result = CallToolResult::text("3").with_result(json!(3));
        let value = serde_json::to_value(result).expect("serializes");
        assert_eq!(
            value,
            json!({
                "content": [{"type": "text", "text": "3"}],
                "structuredContent": {"result": 3},
                "isError": false
            })
        );
    }

    #[test]
    fn error_result_has_no_structured_content() {
        let value =
            serde_json::to_value(CallToolResult::error("boom")).expect("serializes");
        assert_eq!(value["isError"], true);
        assert!(value.get("structuredContent").is_none());
    }
}

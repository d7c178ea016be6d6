//! MCP Message Validation
//!
//! JSON schema validation for incoming MCP protocol messages and for tool
//! arguments, plus protocol version negotiation.

use crate::mcp::errors::{McpError, McpResult};
use crate::mcp::protocol::*;
use anyhow::{Result, anyhow};
use jsonschema::{Draft, JSONSchema};
use serde_json::{Value, json};
use std::collections::HashMap;
use tracing::debug;

/// JSON Schema validator for MCP messages
#[derive(Debug)]
pub struct McpValidator {
    schemas: HashMap<String, JSONSchema>,
}

/// Compile a JSON schema using the draft the server validates against
#[inline]
pub fn compile_schema(name: &str, schema: &Value) -> Result<JSONSchema> {
    JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(schema)
        .map_err(|e| anyhow!("Failed to compile schema '{}': {}", name, e))
}

/// Every violation of `schema` by `value`, formatted as `path: message`
#[inline]
pub fn schema_violations(schema: &JSONSchema, value: &Value) -> Vec<String> {
    match schema.validate(value) {
        Ok(()) => Vec::new(),
        Err(errors) => errors
            .map(|e| {
                let path = e.instance_path.to_string();
                if path.is_empty() {
                    e.to_string()
                } else {
                    format!("{}: {}", path, e)
                }
            })
            .collect(),
    }
}

impl McpValidator {
    /// Create a new MCP validator with built-in schemas
    #[inline]
    pub fn new() -> Result<Self> {
        let mut validator = Self {
            schemas: HashMap::new(),
        };

        validator.load_builtin_schemas()?;

        Ok(validator)
    }

    fn load_builtin_schemas(&mut self) -> Result<()> {
        let id_schema = json!({
            "oneOf": [
                {"type": "string"},
                {"type": "integer"}
            ]
        });

        self.add_schema(
            "jsonrpc_request",
            &json!({
                "type": "object",
                "properties": {
                    "jsonrpc": {"type": "string", "const": "2.0"},
                    "method": {"type": "string"},
                    "params": {"type": ["object", "array"]},
                    "id": id_schema
                },
                "required": ["jsonrpc", "method", "id"]
            }),
        )?;

        self.add_schema(
            "jsonrpc_response",
            &json!({
                "type": "object",
                "properties": {
                    "jsonrpc": {"type": "string", "const": "2.0"},
                    "result": {},
                    "id": id_schema
                },
                "required": ["jsonrpc", "result", "id"]
            }),
        )?;

        self.add_schema(
            "jsonrpc_error_response",
            &json!({
                "type": "object",
                "properties": {
                    "jsonrpc": {"type": "string", "const": "2.0"},
                    "error": {
                        "type": "object",
                        "properties": {
                            "code": {"type": "integer"},
                            "message": {"type": "string"},
                            "data": {}
                        },
                        "required": ["code", "message"]
                    }
                },
                "required": ["jsonrpc", "error", "id"]
            }),
        )?;

        self.add_schema(
            "jsonrpc_notification",
            &json!({
                "type": "object",
                "properties": {
                    "jsonrpc": {"type": "string", "const": "2.0"},
                    "method": {"type": "string"},
                    "params": {"type": ["object", "array"]}
                },
                "required": ["jsonrpc", "method"]
            }),
        )?;

        self.add_schema(
            "initialize_params",
            &json!({
                "type": "object",
                "properties": {
                    "protocolVersion": {"type": "string"},
                    "capabilities": {"type": "object"},
                    "clientInfo": {
                        "type": "object",
                        "properties": {
                            "name": {"type": "string"},
                            "version": {"type": "string"}
                        },
                        "required": ["name", "version"]
                    }
                },
                "required": ["protocolVersion", "clientInfo"]
            }),
        )?;

        self.add_schema(
            "call_tool_params",
            &json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string"},
                    "arguments": {"type": ["object", "null"]}
                },
                "required": ["name"]
            }),
        )?;

        debug!("Loaded {} built-in JSON schemas", self.schemas.len());
        Ok(())
    }

    /// Add a JSON schema to the validator
    #[inline]
    pub fn add_schema(&mut self, name: &str, schema: &Value) -> Result<()> {
        let compiled = compile_schema(name, schema)?;
        self.schemas.insert(name.to_string(), compiled);
        Ok(())
    }

    /// Validate the envelope of a JSON-RPC request; params are checked at dispatch
    #[inline]
    pub fn validate_request(&self, request: &JsonRpcRequest) -> Result<()> {
        let request_value = serde_json::to_value(request)?;
        self.validate_with_schema("jsonrpc_request", &request_value)
    }

    /// Validate a JSON-RPC notification
    #[inline]
    pub fn validate_notification(&self, notification: &JsonRpcNotification) -> Result<()> {
        let notification_value = serde_json::to_value(notification)?;
        self.validate_with_schema("jsonrpc_notification", &notification_value)
    }

    /// Validate the params of a well-formed request against its method's schema
    #[inline]
    pub fn validate_params(&self, method: &str, params: &Value) -> McpResult<()> {
        let schema_name = match method {
            "initialize" => "initialize_params",
            "tools/call" => "call_tool_params",
            _ => {
                debug!("No parameter validation schema for method: {}", method);
                return Ok(());
            }
        };

        self.validate_with_schema(schema_name, params)
            .map_err(|e| McpError::InvalidParameters {
                message: e.to_string(),
            })
    }

    /// Validate a value against a named schema
    #[inline]
    pub fn validate_with_schema(&self, schema_name: &str, value: &Value) -> Result<()> {
        let schema = self
            .schemas
            .get(schema_name)
            .ok_or_else(|| anyhow!("Schema '{}' not found", schema_name))?;

        let violations = schema_violations(schema, value);
        if !violations.is_empty() {
            return Err(anyhow!(
                "Schema validation failed for '{}': {}",
                schema_name,
                violations.join(", ")
            ));
        }

        Ok(())
    }

    /// Validate a raw JSON value as a JSON-RPC message
    #[inline]
    pub fn validate_raw_message(&self, value: &Value) -> Result<JsonRpcMessage> {
        if let Ok(request) = serde_json::from_value::<JsonRpcRequest>(value.clone()) {
            self.validate_request(&request)?;
            return Ok(JsonRpcMessage::Request(request));
        }

        if let Ok(response) = serde_json::from_value::<JsonRpcResponse>(value.clone()) {
            self.validate_with_schema("jsonrpc_response", value)?;
            return Ok(JsonRpcMessage::Response(response));
        }

        if let Ok(error_response) = serde_json::from_value::<JsonRpcErrorResponse>(value.clone()) {
            self.validate_with_schema("jsonrpc_error_response", value)?;
            return Ok(JsonRpcMessage::ErrorResponse(error_response));
        }

        // A message with an id is never a notification
        if value.get("id").is_some() {
            return Err(anyhow!(
                "Message has an 'id' but is neither a valid request nor a valid response"
            ));
        }

        if let Ok(notification) = serde_json::from_value::<JsonRpcNotification>(value.clone()) {
            self.validate_notification(&notification)?;
            return Ok(JsonRpcMessage::Notification(notification));
        }

        Err(anyhow!(
            "Value does not match any known JSON-RPC message type"
        ))
    }

    /// Pick the version to answer an `initialize` with.
    ///
    /// A supported version is echoed back; anything else gets the latest one
    /// and the client decides whether it can continue.
    #[inline]
    pub fn negotiate_protocol_version(&self, requested: &str) -> &'static str {
        SUPPORTED_PROTOCOL_VERSIONS
            .iter()
            .copied()
            .find(|supported| *supported == requested)
            .unwrap_or(MCP_VERSION)
    }
}

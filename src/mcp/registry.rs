//! Tool registration and discovery
//!
//! A [`ToolRegistry`] is filled once at startup and then handed to the
//! server, which only ever reads from it. Each entry pairs a
//! [`ToolDescriptor`] with the [`ToolHandler`] that executes it.

use crate::mcp::errors::{McpError, McpResult};
use crate::mcp::protocol::{CallToolParams, CallToolResult, Tool};
use crate::mcp::validation::{compile_schema, schema_violations};
use anyhow::Result;
use async_trait::async_trait;
use jsonschema::JSONSchema;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};

/// Tool handler trait for implementing tool execution
///
/// Handlers receive arguments that already passed the tool's input schema,
/// with declared defaults filled in.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn handle(&self, params: CallToolParams) -> Result<CallToolResult>;
}

/// Primitive parameter and return types a tool can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Integer,
}

impl ParamType {
    /// JSON Schema `type` keyword for this type
    #[inline]
    pub fn schema_type(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
        }
    }
}

impl fmt::Display for ParamType {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.schema_type())
    }
}

/// One declared tool parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub ty: ParamType,
    pub description: String,
    pub default: Option<Value>,
}

impl ParamSpec {
    /// A parameter the caller must supply
    #[inline]
    pub fn required(name: &str, ty: ParamType, description: &str) -> Self {
        Self {
            name: name.to_string(),
            ty,
            description: description.to_string(),
            default: None,
        }
    }

    /// A parameter that falls back to `default` when omitted
    #[inline]
    pub fn optional(name: &str, ty: ParamType, description: &str, default: Value) -> Self {
        Self {
            name: name.to_string(),
            ty,
            description: description.to_string(),
            default: Some(default),
        }
    }
}

/// Everything the server needs to advertise a tool
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParamSpec>,
    pub returns: ParamType,
}

impl ToolDescriptor {
    #[inline]
    pub fn new(name: &str, description: &str, parameters: Vec<ParamSpec>, returns: ParamType) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            parameters,
            returns,
        }
    }

    /// JSON Schema for the tool's arguments, properties in declaration order
    #[inline]
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for param in &self.parameters {
            let mut property = Map::new();
            property.insert("type".to_string(), Value::from(param.ty.schema_type()));
            property.insert(
                "description".to_string(),
                Value::from(param.description.as_str()),
            );
            match &param.default {
                Some(default) => {
                    property.insert("default".to_string(), default.clone());
                }
                None => required.push(Value::from(param.name.as_str())),
            }
            properties.insert(param.name.clone(), Value::Object(property));
        }

        let mut schema = Map::new();
        schema.insert("type".to_string(), Value::from("object"));
        schema.insert("properties".to_string(), Value::Object(properties));
        schema.insert("required".to_string(), Value::Array(required));
        Value::Object(schema)
    }

    /// The MCP `Tool` definition advertised by `tools/list`
    #[inline]
    pub fn tool_definition(&self) -> Tool {
        Tool {
            name: self.name.clone(),
            description: Some(self.description.clone()),
            input_schema: self.input_schema(),
        }
    }

    /// Human readable signature, e.g. `list_files(directory: string = ".") -> string`
    #[inline]
    pub fn signature(&self) -> String {
        let params = self
            .parameters
            .iter()
            .map(|param| match &param.default {
                Some(default) => format!("{}: {} = {}", param.name, param.ty, default),
                None => format!("{}: {}", param.name, param.ty),
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}({}) -> {}", self.name, params, self.returns)
    }

    /// Copy `arguments`, filling every omitted parameter that has a default
    fn with_defaults(&self, arguments: Option<Map<String, Value>>) -> Map<String, Value> {
        let mut arguments = arguments.unwrap_or_default();
        for param in &self.parameters {
            if let Some(default) = &param.default {
                arguments
                    .entry(param.name.clone())
                    .or_insert_with(|| default.clone());
            }
        }
        arguments
    }
}

struct RegisteredTool {
    descriptor: ToolDescriptor,
    schema: JSONSchema,
    handler: Box<dyn ToolHandler>,
}

/// Tool registry mapping unique names to descriptors and handlers
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Create an empty tool registry
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under its descriptor's name
    #[inline]
    pub fn register<H>(&mut self, descriptor: ToolDescriptor, handler: H) -> McpResult<()>
    where
        H: ToolHandler + 'static,
    {
        if self.index.contains_key(&descriptor.name) {
            return Err(McpError::DuplicateTool {
                name: descriptor.name,
            });
        }

        let schema = compile_schema(&descriptor.name, &descriptor.input_schema()).map_err(|e| {
            McpError::InternalError {
                message: e.to_string(),
            }
        })?;

        debug!("Registered tool: {}", descriptor.signature());
        self.index.insert(descriptor.name.clone(), self.tools.len());
        self.tools.push(RegisteredTool {
            descriptor,
            schema,
            handler: Box::new(handler),
        });
        Ok(())
    }

    /// Tool definitions in registration order
    #[inline]
    pub fn list_tools(&self) -> Vec<Tool> {
        self.tools
            .iter()
            .map(|tool| tool.descriptor.tool_definition())
            .collect()
    }

    /// Descriptors in registration order
    #[inline]
    pub fn descriptors(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.iter().map(|tool| &tool.descriptor)
    }

    /// Look up a descriptor by tool name
    #[inline]
    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.index.get(name).map(|&i| &self.tools[i].descriptor)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Validate arguments and invoke the named tool.
    ///
    /// An unknown tool is a protocol error. Arguments that violate the input
    /// schema come back as an `isError` result so the caller can correct them.
    #[inline]
    pub async fn call(&self, params: CallToolParams) -> Result<CallToolResult> {
        let tool = self
            .index
            .get(&params.name)
            .map(|&i| &self.tools[i])
            .ok_or_else(|| McpError::ToolNotFound {
                name: params.name.clone(),
            })?;

        let arguments = tool.descriptor.with_defaults(params.arguments);
        let violations = schema_violations(&tool.schema, &Value::Object(arguments.clone()));
        if !violations.is_empty() {
            warn!(
                "Rejected arguments for tool '{}': {}",
                params.name,
                violations.join("; ")
            );
            return Ok(CallToolResult::error(format!(
                "Invalid arguments for tool '{}': {}",
                params.name,
                violations.join("; ")
            )));
        }

        debug!("Calling tool '{}'", params.name);
        tool.handler
            .handle(CallToolParams {
                name: params.name,
                arguments: Some(arguments),
            })
            .await
    }
}

impl fmt::Debug for ToolRegistry {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field(
                "tools",
                &self.tools.iter().map(|t| &t.descriptor.name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

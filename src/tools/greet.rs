use crate::mcp::{CallToolParams, CallToolResult, ParamSpec, ParamType, ToolDescriptor, ToolHandler};
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

/// Greet a user by name
#[inline]
pub fn greet_user(name: &str) -> String {
    format!("Hello, {}! Welcome from your MCP server.", name)
}

#[derive(Debug, Deserialize)]
struct GreetArgs {
    name: String,
}

/// `greet_user` tool handler
pub struct GreetUserHandler;

impl GreetUserHandler {
    #[inline]
    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor::new(
            "greet_user",
            "Greet a user by name",
            vec![ParamSpec::required(
                "name",
                ParamType::String,
                "Name of the person to greet",
            )],
            ParamType::String,
        )
    }
}

#[async_trait]
impl ToolHandler for GreetUserHandler {
    #[inline]
    async fn handle(&self, params: CallToolParams) -> Result<CallToolResult> {
        let args: GreetArgs = match super::parse_arguments(params) {
            Ok(args) => args,
            Err(result) => return Ok(result),
        };

        let greeting = greet_user(&args.name);
        Ok(CallToolResult::text(greeting.clone()).with_result(Value::String(greeting)))
    }
}

use anyhow::{Context, anyhow};
use console::style;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{error, info};

use crate::config::Config;
use crate::mcp::{CallToolParams, McpServer};
use crate::tools::build_registry;
use crate::{Result, StarterError};

/// Start the MCP server on stdio and run until EOF or Ctrl+C
#[inline]
pub async fn serve_mcp(config: &Config) -> Result<()> {
    let registry = build_registry()?;
    let tool_names: Vec<String> = registry.descriptors().map(|d| d.name.clone()).collect();

    let server = Arc::new(
        McpServer::new(
            config.server.name.clone(),
            env!("CARGO_PKG_VERSION").to_string(),
            registry,
        )
        .context("Failed to create MCP server")?
        .with_instructions(config.instructions()),
    );

    info!(
        server = %config.server.name,
        tools = %tool_names.join(", "),
        "MCP server initialized"
    );

    tokio::select! {
        result = Arc::clone(&server).serve_stdio() => {
            match result {
                Ok(()) => info!("MCP server stopped normally"),
                Err(e) => {
                    error!("MCP server error: {:#}", e);
                    return Err(e.into());
                }
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received interrupt signal, shutting down");
        }
    }

    Ok(())
}

/// Print the registered tools, either as signatures or as MCP definitions
#[inline]
pub fn list_tools(as_json: bool) -> Result<()> {
    let registry = build_registry()?;

    if as_json {
        let definitions = serde_json::to_string_pretty(&registry.list_tools())
            .context("Failed to serialize tool definitions")?;
        println!("{}", definitions);
        return Ok(());
    }

    println!("Tools ({} total):", registry.len());
    for descriptor in registry.descriptors() {
        println!();
        println!("  {}", style(descriptor.signature()).bold().cyan());
        println!("    {}", descriptor.description);
    }

    Ok(())
}

/// Parse `--args` into an argument object; absent means no arguments
fn parse_call_arguments(args: Option<&str>) -> Result<Option<Map<String, Value>>> {
    let Some(raw) = args else {
        return Ok(None);
    };

    let value: Value = serde_json::from_str(raw).context("Tool arguments are not valid JSON")?;
    match value {
        Value::Object(map) => Ok(Some(map)),
        Value::Null => Ok(None),
        other => Err(anyhow!("Tool arguments must be a JSON object, got {}", other).into()),
    }
}

/// Invoke a tool locally and print its text result
#[inline]
pub async fn call_tool(tool: &str, args: Option<&str>) -> Result<()> {
    let registry = build_registry()?;
    let arguments = parse_call_arguments(args)?;

    let params = CallToolParams {
        name: tool.to_string(),
        arguments,
    };
    let result = registry.call(params).await.map_err(|e| {
        e.downcast::<crate::mcp::McpError>()
            .map_or_else(StarterError::Other, StarterError::Mcp)
    })?;

    if result.is_error == Some(true) {
        eprintln!("{}", style(result.text_content()).red());
        return Err(StarterError::ToolFailed(tool.to_string()));
    }

    println!("{}", result.text_content());
    Ok(())
}

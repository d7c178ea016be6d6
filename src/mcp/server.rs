//! MCP Server Implementation
//!
//! Connection handling, message routing and protocol compliance for a
//! newline-delimited JSON-RPC transport.

use crate::mcp::errors::{ErrorHandler, McpError};
use crate::mcp::protocol::*;
use crate::mcp::registry::ToolRegistry;
use crate::mcp::validation::McpValidator;
use anyhow::Result;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

/// MCP Server state and configuration
pub struct McpServer {
    /// Server implementation information
    pub server_info: Implementation,
    /// Optional usage hint returned from `initialize`
    pub instructions: Option<String>,
    /// Server capabilities
    pub capabilities: ServerCapabilities,
    /// Registered tools, frozen for the server's lifetime
    pub registry: Arc<ToolRegistry>,
    /// Connection state
    pub connection_state: Arc<RwLock<ConnectionState>>,
    /// Message validator
    pub validator: Arc<McpValidator>,
}

/// Connection state tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Uninitialized,
    Initializing,
    Ready,
    Closed,
}

/// Message handler for processing incoming messages
pub struct MessageHandler {
    server: Arc<McpServer>,
}

impl McpServer {
    /// Create a new MCP server around an already populated registry
    #[inline]
    pub fn new(name: String, version: String, registry: ToolRegistry) -> Result<Self> {
        let capabilities = ServerCapabilities {
            tools: Some(ToolsCapability {
                list_changed: Some(false),
            }),
        };

        let validator = McpValidator::new()?;

        Ok(Self {
            server_info: Implementation { name, version },
            instructions: None,
            capabilities,
            registry: Arc::new(registry),
            connection_state: Arc::new(RwLock::new(ConnectionState::Uninitialized)),
            validator: Arc::new(validator),
        })
    }

    /// Set the instructions sent to clients on `initialize`
    #[inline]
    #[must_use]
    pub fn with_instructions(mut self, instructions: Option<String>) -> Self {
        self.instructions = instructions.filter(|text| !text.trim().is_empty());
        self
    }

    /// Start the server using stdio transport
    #[inline]
    pub async fn serve_stdio(self: Arc<Self>) -> Result<()> {
        info!("Starting MCP server with stdio transport");
        self.serve(BufReader::new(io::stdin()), io::stdout()).await
    }

    /// Serve newline-delimited JSON-RPC messages until the reader hits EOF
    #[inline]
    pub async fn serve<R, W>(self: Arc<Self>, mut reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWriteExt + Unpin,
    {
        let mut line = String::new();
        let outcome = loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) => {
                    info!("EOF reached, closing connection");
                    break Ok(());
                }
                Ok(_) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    if let Err(e) = self.process_line(line, &mut writer).await {
                        error!("Failed to write response: {}", e);
                        break Err(e);
                    }
                }
                Err(e) => {
                    error!("Error reading from input: {}", e);
                    break Err(e.into());
                }
            }
        };

        {
            let mut state = self.connection_state.write().await;
            *state = ConnectionState::Closed;
        }

        info!("MCP server stopped");
        outcome
    }

    /// Parse, validate and dispatch one raw line.
    ///
    /// Only write failures are returned; everything else is answered in-band.
    async fn process_line<W>(self: &Arc<Self>, line: &str, writer: &mut W) -> Result<()>
    where
        W: AsyncWriteExt + Unpin,
    {
        let raw_value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                let error = McpError::ParseError {
                    message: format!("Parse error: {}", e),
                };
                error.log();
                return self.send_message(writer, &error.to_error_response(None)).await;
            }
        };

        match self.validator.validate_raw_message(&raw_value) {
            Ok(message) => {
                let handler = MessageHandler::new(Arc::clone(self));
                handler.process_message(message, writer).await
            }
            Err(e) => {
                let id = raw_value
                    .get("id")
                    .and_then(|id| serde_json::from_value::<RequestId>(id.clone()).ok());
                let error = McpError::InvalidRequest {
                    message: format!("Invalid Request: {}", e),
                };
                error.log();
                self.send_message(writer, &error.to_error_response(id)).await
            }
        }
    }

    /// Send a message to the client
    async fn send_message<W>(&self, writer: &mut W, message: &JsonRpcMessage) -> Result<()>
    where
        W: AsyncWriteExt + Unpin,
    {
        let json = serde_json::to_string(message)?;
        writer.write_all(json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        Ok(())
    }

    /// Get current connection state
    #[inline]
    pub async fn connection_state(&self) -> ConnectionState {
        *self.connection_state.read().await
    }
}

impl MessageHandler {
    /// Create a new message handler
    #[inline]
    pub fn new(server: Arc<McpServer>) -> Self {
        Self { server }
    }

    /// Process an incoming message
    #[inline]
    pub async fn process_message<W>(&self, message: JsonRpcMessage, writer: &mut W) -> Result<()>
    where
        W: AsyncWriteExt + Unpin,
    {
        match message {
            JsonRpcMessage::Request(request) => self.handle_request(request, writer).await,
            JsonRpcMessage::Notification(notification) => {
                self.handle_notification(&notification).await;
                Ok(())
            }
            JsonRpcMessage::Response(_) | JsonRpcMessage::ErrorResponse(_) => {
                warn!("Received unexpected response message from client");
                Ok(())
            }
        }
    }

    /// Handle a JSON-RPC request
    async fn handle_request<W>(&self, request: JsonRpcRequest, writer: &mut W) -> Result<()>
    where
        W: AsyncWriteExt + Unpin,
    {
        debug!("Handling request {} ({:?})", request.method, request.id);
        let outcome = self.dispatch(&request.method, request.params).await;

        let message = match outcome {
            Ok(result) => JsonRpcMessage::Response(JsonRpcResponse::new(result, request.id)),
            Err(e) => ErrorHandler::handle_error(&e, Some(request.id)),
        };
        self.server.send_message(writer, &message).await
    }

    /// Route a request to its method handler once its params pass the method schema
    async fn dispatch(&self, method: &str, params: Option<Value>) -> Result<Value> {
        if let Some(params) = &params {
            self.server.validator.validate_params(method, params)?;
        }

        match method {
            "initialize" => self.handle_initialize(params).await,
            "ping" => Ok(Self::handle_ping()),
            "tools/list" => self.handle_list_tools(),
            "tools/call" => self.handle_call_tool(params).await,
            "resources/list" => Ok(json!({ "resources": [] })),
            "resources/templates/list" => Ok(json!({ "resourceTemplates": [] })),
            "prompts/list" => Ok(json!({ "prompts": [] })),
            _ => Err(McpError::MethodNotFound {
                method: method.to_string(),
            }
            .into()),
        }
    }

    /// Handle a JSON-RPC notification
    async fn handle_notification(&self, notification: &JsonRpcNotification) {
        match notification.method.as_str() {
            "notifications/initialized" | "initialized" => self.handle_initialized().await,
            "notifications/cancelled" => {
                debug!("Received cancellation notification");
            }
            _ => {
                warn!("Unknown notification method: {}", notification.method);
            }
        }
    }

    /// Handle initialize request
    #[inline]
    pub async fn handle_initialize(&self, params: Option<Value>) -> Result<Value> {
        let params: InitializeParams = match params {
            Some(p) => serde_json::from_value(p).map_err(|e| McpError::InvalidParameters {
                message: format!("Invalid initialize parameters: {}", e),
            })?,
            None => {
                return Err(McpError::InvalidParameters {
                    message: "Initialize request missing parameters".to_string(),
                }
                .into());
            }
        };

        let protocol_version = self
            .server
            .validator
            .negotiate_protocol_version(&params.protocol_version);
        if protocol_version != params.protocol_version {
            warn!(
                "Client requested unsupported protocol version {}, offering {}",
                params.protocol_version, protocol_version
            );
        }

        {
            let mut state = self.server.connection_state.write().await;
            *state = ConnectionState::Initializing;
        }

        let result = InitializeResult {
            protocol_version: protocol_version.to_string(),
            capabilities: self.server.capabilities.clone(),
            server_info: self.server.server_info.clone(),
            instructions: self.server.instructions.clone(),
        };

        info!(
            "Client initialized: {} {}",
            params.client_info.name, params.client_info.version
        );
        Ok(serde_json::to_value(result)?)
    }

    async fn handle_initialized(&self) {
        {
            let mut state = self.server.connection_state.write().await;
            *state = ConnectionState::Ready;
        }

        info!("Server ready to handle requests");
    }

    /// Handle list tools request
    #[inline]
    pub fn handle_list_tools(&self) -> Result<Value> {
        let result = ListToolsResult {
            tools: self.server.registry.list_tools(),
        };
        Ok(serde_json::to_value(result)?)
    }

    /// Handle call tool request
    #[inline]
    pub async fn handle_call_tool(&self, params: Option<Value>) -> Result<Value> {
        let params: CallToolParams = match params {
            Some(p) => serde_json::from_value(p).map_err(|e| McpError::InvalidParameters {
                message: format!("Invalid tool call parameters: {}", e),
            })?,
            None => {
                return Err(McpError::InvalidParameters {
                    message: "Tool call request missing parameters".to_string(),
                }
                .into());
            }
        };

        let result = self.server.registry.call(params).await?;
        Ok(serde_json::to_value(result)?)
    }

    /// Handle ping request
    #[inline]
    pub fn handle_ping() -> Value {
        json!({})
    }
}

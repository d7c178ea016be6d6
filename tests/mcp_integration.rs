#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

//! MCP Server Integration Tests
//!
//! Drives a real server over an in-memory duplex stream, speaking
//! newline-delimited JSON-RPC exactly as a stdio client would.

use serde_json::{Value, json};
use starter_mcp::mcp::{ConnectionState, McpServer, error_codes};
use starter_mcp::tools::build_registry;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::io::{
    AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines, ReadHalf, WriteHalf,
};
use tokio::task::JoinHandle;

/// Client side of an in-memory connection to a running server
struct TestClient {
    writer: WriteHalf<DuplexStream>,
    lines: Lines<BufReader<ReadHalf<DuplexStream>>>,
    server: Arc<McpServer>,
    task: JoinHandle<anyhow::Result<()>>,
}

impl TestClient {
    fn start() -> Self {
        let registry = build_registry().expect("Failed to build registry");
        let server = Arc::new(
            McpServer::new(
                "My Windsurf MCP Server".to_string(),
                "0.1.0".to_string(),
                registry,
            )
            .expect("Failed to create MCP server"),
        );

        let (client_side, server_side) = tokio::io::duplex(64 * 1024);
        let (server_read, server_write) = tokio::io::split(server_side);
        let task = tokio::spawn(
            Arc::clone(&server).serve(BufReader::new(server_read), server_write),
        );

        let (client_read, writer) = tokio::io::split(client_side);
        Self {
            writer,
            lines: BufReader::new(client_read).lines(),
            server,
            task,
        }
    }

    async fn send_raw(&mut self, line: &str) {
        self.writer
            .write_all(line.as_bytes())
            .await
            .expect("Failed to write request");
        self.writer
            .write_all(b"\n")
            .await
            .expect("Failed to write newline");
        self.writer.flush().await.expect("Failed to flush");
    }

    async fn send(&mut self, message: &Value) {
        self.send_raw(&message.to_string()).await;
    }

    async fn receive(&mut self) -> Value {
        let line = self
            .lines
            .next_line()
            .await
            .expect("Failed to read response")
            .expect("Server closed the stream");
        serde_json::from_str(&line).expect("Response is not valid JSON")
    }

    async fn request(&mut self, id: u64, method: &str, params: Value) -> Value {
        self.send(&json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params}))
            .await;
        self.receive().await
    }

    async fn initialize(&mut self) -> Value {
        let response = self
            .request(
                1,
                "initialize",
                json!({
                    "protocolVersion": "2025-06-18",
                    "capabilities": {},
                    "clientInfo": {"name": "integration-test", "version": "1.0.0"}
                }),
            )
            .await;
        self.send(&json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
            .await;
        response
    }

    async fn call_tool(&mut self, id: u64, name: &str, arguments: Value) -> Value {
        self.request(id, "tools/call", json!({"name": name, "arguments": arguments}))
            .await
    }

    async fn shutdown(mut self) -> Arc<McpServer> {
        self.writer.shutdown().await.expect("Failed to close stream");
        self.task
            .await
            .expect("Server task panicked")
            .expect("Server returned an error");
        self.server
    }
}

fn text_of(response: &Value) -> &str {
    response["result"]["content"][0]["text"]
        .as_str()
        .expect("Expected text content")
}

#[tokio::test]
async fn initialize_handshake() {
    let mut client = TestClient::start();
    let response = client.initialize().await;

    assert_eq!(response["jsonrpc"], "2.0");
    assert_eq!(response["id"], 1);
    assert_eq!(response["result"]["protocolVersion"], "2025-06-18");
    assert_eq!(
        response["result"]["serverInfo"]["name"],
        "My Windsurf MCP Server"
    );
    assert!(response["result"]["capabilities"]["tools"].is_object());

    // A ping round-trip guarantees the notification was processed
    let pong = client.request(2, "ping", json!({})).await;
    assert_eq!(pong["result"], json!({}));
    assert_eq!(client.server.connection_state().await, ConnectionState::Ready);

    let server = client.shutdown().await;
    assert_eq!(server.connection_state().await, ConnectionState::Closed);
}

#[tokio::test]
async fn tools_are_advertised_with_schemas() {
    let mut client = TestClient::start();
    client.initialize().await;

    let response = client.request(2, "tools/list", json!({})).await;
    let tools = response["result"]["tools"]
        .as_array()
        .expect("tools is an array");

    let names: Vec<&str> = tools
        .iter()
        .map(|tool| tool["name"].as_str().expect("tool has a name"))
        .collect();
    assert_eq!(names, ["greet_user", "add_numbers", "list_files"]);

    let greet = &tools[0];
    assert_eq!(greet["inputSchema"]["required"], json!(["name"]));
    assert_eq!(greet["inputSchema"]["properties"]["name"]["type"], "string");

    let add = &tools[1];
    assert_eq!(add["inputSchema"]["required"], json!(["a", "b"]));
    assert_eq!(add["inputSchema"]["properties"]["a"]["type"], "integer");

    let list = &tools[2];
    assert_eq!(list["inputSchema"]["required"], json!([]));
    assert_eq!(list["inputSchema"]["properties"]["directory"]["default"], ".");

    client.shutdown().await;
}

#[tokio::test]
async fn greet_and_add_over_the_wire() {
    let mut client = TestClient::start();
    client.initialize().await;

    let greeting = client.call_tool(2, "greet_user", json!({"name": "Alice"})).await;
    assert_eq!(greeting["result"]["isError"], false);
    assert_eq!(
        text_of(&greeting),
        "Hello, Alice! Welcome from your MCP server."
    );

    let sum = client.call_tool(3, "add_numbers", json!({"a": 2, "b": 3})).await;
    assert_eq!(text_of(&sum), "5");
    assert_eq!(sum["result"]["structuredContent"]["result"], 5);

    let negative = client
        .call_tool(4, "add_numbers", json!({"a": -7, "b": 4}))
        .await;
    assert_eq!(text_of(&negative), "-3");

    client.shutdown().await;
}

#[tokio::test]
async fn list_files_over_the_wire() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    std::fs::write(temp_dir.path().join("a.txt"), "a").expect("Failed to write file");
    std::fs::create_dir_all(temp_dir.path().join("sub")).expect("Failed to create dir");

    let mut client = TestClient::start();
    client.initialize().await;

    let listing = client
        .call_tool(
            2,
            "list_files",
            json!({"directory": temp_dir.path().to_string_lossy()}),
        )
        .await;
    assert_eq!(listing["result"]["isError"], false);
    let mut entries: Vec<&str> = text_of(&listing).split('\n').collect();
    entries.sort_unstable();
    assert_eq!(entries, ["a.txt", "sub"]);

    let missing = temp_dir.path().join("does-not-exist");
    let failure = client
        .call_tool(
            3,
            "list_files",
            json!({"directory": missing.to_string_lossy()}),
        )
        .await;
    assert!(failure.get("error").is_none());
    assert!(text_of(&failure).starts_with("Error: "));

    client.shutdown().await;
}

#[tokio::test]
async fn invalid_arguments_are_tool_errors() {
    let mut client = TestClient::start();
    client.initialize().await;

    let missing = client.call_tool(2, "greet_user", json!({})).await;
    assert_eq!(missing["result"]["isError"], true);
    assert!(text_of(&missing).contains("greet_user"));

    let wrong_type = client
        .call_tool(3, "add_numbers", json!({"a": "two", "b": 3}))
        .await;
    assert_eq!(wrong_type["result"]["isError"], true);

    client.shutdown().await;
}

#[tokio::test]
async fn protocol_errors() {
    let mut client = TestClient::start();
    client.initialize().await;

    client.send_raw("{this is not json").await;
    let parse_error = client.receive().await;
    assert_eq!(parse_error["error"]["code"], error_codes::PARSE_ERROR);
    assert_eq!(parse_error["id"], Value::Null);

    let unknown_method = client.request(2, "sampling/createMessage", json!({})).await;
    assert_eq!(unknown_method["error"]["code"], error_codes::METHOD_NOT_FOUND);
    assert_eq!(unknown_method["id"], 2);

    let unknown_tool = client.call_tool(3, "make_coffee", json!({})).await;
    assert_eq!(unknown_tool["error"]["code"], error_codes::INVALID_PARAMS);
    assert!(
        unknown_tool["error"]["message"]
            .as_str()
            .expect("error has a message")
            .contains("make_coffee")
    );

    client
        .send(&json!({"jsonrpc": "1.0", "id": 4, "method": "ping"}))
        .await;
    let invalid = client.receive().await;
    assert_eq!(invalid["error"]["code"], error_codes::INVALID_REQUEST);
    assert_eq!(invalid["id"], 4);

    client.shutdown().await;
}

#[tokio::test]
async fn blank_lines_are_ignored() {
    let mut client = TestClient::start();

    client.send_raw("").await;
    client.send_raw("   ").await;
    let pong = client.request(7, "ping", json!({})).await;
    assert_eq!(pong["id"], 7);
    assert_eq!(pong["result"], json!({}));

    client.shutdown().await;
}

#[tokio::test]
async fn unreadable_request_ids_still_get_an_answer() {
    let mut client = TestClient::start();
    client.initialize().await;

    client
        .send_raw(r#"{"jsonrpc":"2.0","id":1.5,"method":"ping"}"#)
        .await;
    let fractional = client.receive().await;
    assert_eq!(fractional["error"]["code"], error_codes::INVALID_REQUEST);
    assert_eq!(fractional["id"], Value::Null);

    client
        .send_raw(r#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#)
        .await;
    let null_id = client.receive().await;
    assert_eq!(null_id["error"]["code"], error_codes::INVALID_REQUEST);
    assert_eq!(null_id["id"], Value::Null);

    // The connection keeps working afterwards
    let pong = client.request(9, "ping", json!({})).await;
    assert_eq!(pong["id"], 9);
    assert_eq!(pong["result"], json!({}));

    client.shutdown().await;
}

#[tokio::test]
async fn malformed_params_are_invalid_params() {
    let mut client = TestClient::start();

    let bad_initialize = client
        .request(4, "initialize", json!({"protocolVersion": "2025-06-18"}))
        .await;
    assert_eq!(bad_initialize["error"]["code"], error_codes::INVALID_PARAMS);
    assert_eq!(bad_initialize["id"], 4);

    client.initialize().await;

    let numeric_name = client.request(5, "tools/call", json!({"name": 5})).await;
    assert_eq!(numeric_name["error"]["code"], error_codes::INVALID_PARAMS);
    assert_eq!(numeric_name["id"], 5);

    let missing_name = client
        .request(6, "tools/call", json!({"arguments": {"a": 1}}))
        .await;
    assert_eq!(missing_name["error"]["code"], error_codes::INVALID_PARAMS);
    assert_eq!(missing_name["id"], 6);

    client.shutdown().await;
}

#[tokio::test]
async fn lenient_tool_arguments() {
    let mut client = TestClient::start();
    client.initialize().await;

    let integral_float = client
        .call_tool(2, "add_numbers", json!({"a": 2.0, "b": 1}))
        .await;
    assert_eq!(integral_float["result"]["isError"], false);
    assert_eq!(text_of(&integral_float), "3");

    let fractional = client
        .call_tool(3, "add_numbers", json!({"a": 1.5, "b": 1}))
        .await;
    assert_eq!(fractional["result"]["isError"], true);

    let extra = client
        .call_tool(4, "greet_user", json!({"name": "Bob", "mood": "cheerful"}))
        .await;
    assert_eq!(extra["result"]["isError"], false);
    assert_eq!(text_of(&extra), "Hello, Bob! Welcome from your MCP server.");

    client.shutdown().await;
}

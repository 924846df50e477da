//! MCP JSON-RPC server over stdio.
//!
//! Newline-delimited JSON-RPC 2.0 on stdin/stdout; logging goes to stderr so
//! stdout stays clean for the protocol. Tool failures are reported inside a
//! successful `tools/call` response with `isError` set; JSON-RPC errors are
//! reserved for protocol-level faults.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::catalog::catalog;
use crate::dispatch::Dispatcher;
use crate::platform::PlatformOperations;
use crate::{PROTOCOL_VERSION, SERVER_NAME, SERVER_VERSION};

#[derive(Debug, thiserror::Error)]
pub enum McpError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// JSON-RPC request
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

/// JSON-RPC response
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

impl JsonRpcResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Option<Value>, code: i32, message: &str) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.to_string(),
            }),
        }
    }
}

/// The Discord MCP server, generic over the platform session so tests can
/// substitute a mock.
pub struct McpServer<P: PlatformOperations> {
    dispatcher: Dispatcher<P>,
}

impl<P: PlatformOperations> McpServer<P> {
    pub fn new(platform: Arc<P>) -> Self {
        Self {
            dispatcher: Dispatcher::new(platform),
        }
    }

    /// Override the readiness-guard bound (mainly for tests and CLI flags).
    pub fn with_ready_timeout(mut self, timeout: Duration) -> Self {
        self.dispatcher = self.dispatcher.with_ready_timeout(timeout);
        self
    }

    fn handle_initialize(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": SERVER_VERSION
            },
            "instructions": "Discord administration and messaging bridge. Recommended workflow:\n\
                 1) list_servers - see every server the bot is in\n\
                 2) get_channels / list_members / list_roles - explore one server\n\
                 3) send_message / read_messages - talk in a channel\n\
                 Moderation: moderate_message (delete + optional timeout), get_audit_log\n\
                 Roles: add_role, remove_role, inspect_role\n\
                 Channels: inspect_channel, create_text_channel, delete_channel\n\
                 All IDs are numeric Discord snowflakes passed as strings."
        })
    }

    fn handle_tools_list(&self) -> Value {
        json!({ "tools": catalog() })
    }

    async fn handle_tools_call(&self, params: Value) -> Result<Value, String> {
        let Some(name) = params.get("name").and_then(Value::as_str) else {
            return Err("Missing tool name".to_string());
        };
        let arguments = params
            .get("arguments")
            .cloned()
            .unwrap_or_else(|| json!({}));

        debug!("calling tool {name} with args {arguments}");

        let (text, is_error) = match self.dispatcher.dispatch(name, arguments).await {
            Ok(text) => (text, false),
            Err(e) => {
                warn!("tool {name} failed: {e}");
                (format!("Error: {e}"), true)
            }
        };

        Ok(json!({
            "content": [{
                "type": "text",
                "text": text
            }],
            "isError": is_error
        }))
    }

    /// Handle a single JSON-RPC request. `None` means the request was a
    /// notification and gets no response.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        debug!("handling request: {}", request.method);

        match request.method.as_str() {
            "initialize" => Some(JsonRpcResponse::success(
                request.id,
                self.handle_initialize(),
            )),
            "initialized" | "notifications/initialized" => None,
            "tools/list" => Some(JsonRpcResponse::success(
                request.id,
                self.handle_tools_list(),
            )),
            "tools/call" => match self.handle_tools_call(request.params).await {
                Ok(result) => Some(JsonRpcResponse::success(request.id, result)),
                Err(message) => Some(JsonRpcResponse::error(request.id, -32602, &message)),
            },
            "resources/list" => Some(JsonRpcResponse::success(
                request.id,
                json!({ "resources": [] }),
            )),
            "resources/read" => {
                let uri = request
                    .params
                    .get("uri")
                    .and_then(Value::as_str)
                    .unwrap_or("<missing>");
                Some(JsonRpcResponse::error(
                    request.id,
                    -32002,
                    &format!("Resource not found: {uri}"),
                ))
            }
            "ping" => Some(JsonRpcResponse::success(request.id, json!({}))),
            other => {
                warn!("unknown method: {other}");
                Some(JsonRpcResponse::error(
                    request.id,
                    -32601,
                    &format!("Method not found: {other}"),
                ))
            }
        }
    }

    /// Serve MCP over stdio until stdin closes.
    pub async fn run_stdio(&self) -> Result<(), McpError> {
        let stdin = tokio::io::stdin();
        let mut stdout = tokio::io::stdout();
        let reader = BufReader::new(stdin);
        let mut lines = reader.lines();

        info!("MCP server ready, listening on stdio...");

        while let Some(line) = lines.next_line().await? {
            if line.is_empty() {
                continue;
            }

            let request: JsonRpcRequest = match serde_json::from_str(&line) {
                Ok(request) => request,
                Err(e) => {
                    error!("failed to parse request: {e}");
                    let response = JsonRpcResponse::error(None, -32700, "Parse error");
                    let response_json = serde_json::to_string(&response)?;
                    stdout.write_all(response_json.as_bytes()).await?;
                    stdout.write_all(b"\n").await?;
                    stdout.flush().await?;
                    continue;
                }
            };

            if let Some(response) = self.handle_request(request).await {
                let response_json = serde_json::to_string(&response)?;
                stdout.write_all(response_json.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::MockPlatform;

    fn server() -> McpServer<MockPlatform> {
        McpServer::new(Arc::new(MockPlatform::new()))
    }

    fn request(method: &str, params: Value) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(json!(1)),
            method: method.to_string(),
            params,
        }
    }

    #[tokio::test]
    async fn initialize_reports_protocol_and_server_info() {
        let response = server()
            .handle_request(request("initialize", json!({})))
            .await
            .unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], SERVER_NAME);
        assert!(result["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn initialized_notification_has_no_response() {
        assert!(server()
            .handle_request(request("initialized", json!({})))
            .await
            .is_none());
        assert!(server()
            .handle_request(request("notifications/initialized", json!({})))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn tools_list_returns_catalog() {
        let response = server()
            .handle_request(request("tools/list", json!({})))
            .await
            .unwrap();
        let tools = response.result.unwrap()["tools"].clone();
        assert_eq!(tools.as_array().unwrap().len(), catalog().len());
        assert_eq!(tools[0]["name"], "list_servers");
        assert!(tools[0]["inputSchema"].is_object());
    }

    #[tokio::test]
    async fn tools_call_without_name_is_invalid_params() {
        let response = server()
            .handle_request(request("tools/call", json!({"arguments": {}})))
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, -32602);
    }

    #[tokio::test]
    async fn unknown_method_is_rejected() {
        let response = server()
            .handle_request(request("bogus/method", json!({})))
            .await
            .unwrap();
        let error = response.error.unwrap();
        assert_eq!(error.code, -32601);
        assert!(error.message.contains("bogus/method"));
    }

    #[tokio::test]
    async fn ping_pongs() {
        let response = server().handle_request(request("ping", json!({}))).await.unwrap();
        assert_eq!(response.result.unwrap(), json!({}));
    }

    #[tokio::test]
    async fn resources_surface_is_empty() {
        let response = server()
            .handle_request(request("resources/list", json!({})))
            .await
            .unwrap();
        assert_eq!(response.result.unwrap()["resources"], json!([]));

        let response = server()
            .handle_request(request("resources/read", json!({"uri": "discord://x"})))
            .await
            .unwrap();
        assert!(response.error.unwrap().message.contains("discord://x"));
    }
}

//! Integration tests for the MCP server.
//!
//! Drives the JSON-RPC entry point against a `MockPlatform` to exercise tool
//! routing, the readiness guard, argument decoding, and response formatting
//! end-to-end. The mock's spy log verifies which platform operations each
//! tool actually issued.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use discord_mcp::platform::mock::MockPlatform;
use discord_mcp::server::{JsonRpcRequest, JsonRpcResponse};
use discord_mcp::McpServer;

// ── Test harness ─────────────────────────────────────────────────────

struct TestHarness {
    server: McpServer<MockPlatform>,
    platform: Arc<MockPlatform>,
}

impl TestHarness {
    fn new() -> Self {
        Self::with_mock(MockPlatform::new())
    }

    fn with_mock(mock: MockPlatform) -> Self {
        let platform = Arc::new(mock);
        let server = McpServer::new(platform.clone());
        Self { server, platform }
    }

    /// Same harness with a short readiness bound so not-ready tests finish fast.
    fn with_short_ready_timeout(mock: MockPlatform) -> Self {
        let platform = Arc::new(mock);
        let server =
            McpServer::new(platform.clone()).with_ready_timeout(Duration::from_millis(30));
        Self { server, platform }
    }

    async fn request(&self, method: &str, params: Value) -> Option<JsonRpcResponse> {
        self.server
            .handle_request(JsonRpcRequest {
                jsonrpc: "2.0".to_string(),
                id: Some(json!(1)),
                method: method.to_string(),
                params,
            })
            .await
    }

    /// Call a tool and return the full `tools/call` result value.
    async fn call(&self, tool_name: &str, arguments: Value) -> Value {
        let response = self
            .request("tools/call", json!({"name": tool_name, "arguments": arguments}))
            .await
            .expect("tools/call must produce a response");
        assert!(response.error.is_none(), "tool calls never surface JSON-RPC errors");
        response.result.expect("tools/call result")
    }

    /// Call a tool and return `(text, is_error)`.
    async fn call_text(&self, tool_name: &str, arguments: Value) -> (String, bool) {
        let result = self.call(tool_name, arguments).await;
        (result_text(&result), result["isError"].as_bool().unwrap())
    }
}

/// Extract the first text content block from a tools/call result.
fn result_text(result: &Value) -> String {
    result["content"][0]["text"]
        .as_str()
        .expect("text content")
        .to_string()
}

// ════════════════════════════════════════════════════════════════════
// Protocol surface
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn initialize_handshake() {
    let h = TestHarness::new();
    let response = h.request("initialize", json!({})).await.unwrap();
    let result = response.result.unwrap();

    assert_eq!(result["protocolVersion"], "2024-11-05");
    assert_eq!(result["serverInfo"]["name"], "discord-mcp");
    assert!(result["instructions"].as_str().unwrap().contains("list_servers"));
}

#[tokio::test]
async fn list_tools_returns_expected_tools() {
    let h = TestHarness::new();
    let response = h.request("tools/list", json!({})).await.unwrap();
    let tools = response.result.unwrap()["tools"].clone();
    let tool_names: Vec<String> = tools
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap().to_string())
        .collect();

    for expected in [
        "list_servers",
        "get_server_info",
        "get_channels",
        "get_user_info",
        "list_members",
        "list_roles",
        "inspect_role",
        "inspect_channel",
        "get_audit_log",
        "add_role",
        "remove_role",
        "create_text_channel",
        "delete_channel",
        "send_message",
        "read_messages",
        "add_reaction",
        "add_multiple_reactions",
        "remove_reaction",
        "moderate_message",
    ] {
        assert!(tool_names.contains(&expected.to_string()), "missing {expected}");
    }

    // No duplicates.
    let mut deduped = tool_names.clone();
    deduped.sort();
    deduped.dedup();
    assert_eq!(deduped.len(), tool_names.len());
}

#[tokio::test]
async fn catalog_names_equal_handler_names() {
    let registry = discord_mcp::tools::registry::<MockPlatform>();
    let mut registered: Vec<String> = registry.names().iter().map(|n| n.to_string()).collect();
    let mut declared: Vec<String> = discord_mcp::catalog::catalog()
        .iter()
        .map(|t| t.name.clone())
        .collect();
    registered.sort();
    declared.sort();
    assert_eq!(registered, declared);
}

// ════════════════════════════════════════════════════════════════════
// Dispatch failure modes
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn unknown_tool_names_the_tool_and_touches_nothing() {
    let h = TestHarness::new();
    let (text, is_error) = h.call_text("definitely_not_a_tool", json!({})).await;

    assert!(is_error);
    assert!(text.contains("unknown tool"));
    assert!(text.contains("definitely_not_a_tool"));
    assert!(h.platform.calls().is_empty(), "no handler may run: {:?}", h.platform.calls());
}

#[tokio::test]
async fn not_ready_session_short_circuits_every_tool() {
    let mock = MockPlatform::new();
    mock.set_ready(false);
    let h = TestHarness::with_short_ready_timeout(mock);

    for tool in ["list_servers", "send_message", "moderate_message"] {
        let (text, is_error) = h.call_text(tool, json!({})).await;
        assert!(is_error, "{tool} must fail while disconnected");
        assert!(
            text.contains("not connected"),
            "{tool} must return the fixed not-ready text, got: {text}"
        );
    }
    assert!(h.platform.calls().is_empty(), "handlers must never run while disconnected");
}

#[tokio::test]
async fn session_becoming_ready_mid_wait_unblocks_dispatch() {
    let mock = MockPlatform::new();
    mock.set_ready(false);
    let h = TestHarness::with_mock(mock);
    let platform = h.platform.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        platform.set_ready(true);
    });

    let (text, is_error) = h.call_text("list_servers", json!({})).await;
    assert!(!is_error);
    assert!(text.contains("Test Guild"));
}

#[tokio::test]
async fn missing_required_argument_is_reported() {
    let h = TestHarness::new();
    let (text, is_error) = h.call_text("send_message", json!({"channel_id": "10"})).await;

    assert!(is_error);
    assert!(text.contains("invalid arguments"));
    assert!(text.contains("content"));
    assert!(h.platform.calls().is_empty());
}

#[tokio::test]
async fn non_numeric_id_is_reported_before_any_platform_call() {
    let h = TestHarness::new();
    let (text, is_error) = h
        .call_text("get_server_info", json!({"server_id": "not-a-number"}))
        .await;

    assert!(is_error);
    assert!(text.contains("server_id"));
    assert!(h.platform.calls().is_empty());
}

#[tokio::test]
async fn entity_not_found_is_reported_as_error_text() {
    let h = TestHarness::new();
    let (text, is_error) = h.call_text("get_server_info", json!({"server_id": "424242"})).await;

    assert!(is_error);
    assert!(text.contains("guild 424242"));
    assert!(text.contains("not found"));
}

// ════════════════════════════════════════════════════════════════════
// Tool behavior
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn list_servers_with_zero_guilds_is_ok() {
    let h = TestHarness::with_mock(MockPlatform::empty());
    let (text, is_error) = h.call_text("list_servers", json!({})).await;

    assert!(!is_error, "an empty server list is a success, got: {text}");
    assert!(text.contains("(0)"));
}

#[tokio::test]
async fn list_servers_renders_one_line_per_guild() {
    let h = TestHarness::new();
    let (text, _) = h.call_text("list_servers", json!({})).await;
    assert_eq!(text, "Connected servers (1):\nTest Guild (ID: 100) - Members: 2");
}

#[tokio::test]
async fn read_messages_clamps_limit_and_renders_all_messages() {
    let h = TestHarness::new();
    let (text, is_error) = h
        .call_text("read_messages", json!({"channel_id": "10", "limit": 500}))
        .await;

    assert!(!is_error);
    // Channel has 3 messages; all come back as formatted lines.
    let lines: Vec<&str> = text.lines().filter(|l| l.contains(" UTC): ")).collect();
    assert_eq!(lines.len(), 3);
    // The platform was asked for the clamp ceiling, never the raw 500.
    assert_eq!(h.platform.calls_with_prefix("channel_messages(10,100)"), 1);
    assert_eq!(h.platform.calls_with_prefix("channel_messages(10,500)"), 0);
}

#[tokio::test]
async fn moderate_message_deletes_and_times_out_in_one_block() {
    let h = TestHarness::new();
    let (text, is_error) = h
        .call_text(
            "moderate_message",
            json!({
                "channel_id": "10",
                "message_id": "1001",
                "reason": "spam",
                "timeout_minutes": 10
            }),
        )
        .await;

    assert!(!is_error);
    assert!(text.contains("deleted"));
    assert!(text.contains("10 minutes"));
    assert_eq!(h.platform.calls_with_prefix("delete_message"), 1);
    assert_eq!(h.platform.calls_with_prefix("timeout_member(100,1,10)"), 1);
    assert_eq!(h.platform.calls_with_prefix("timeout_member"), 1);
}

#[tokio::test]
async fn add_role_with_unknown_role_issues_no_mutation() {
    let h = TestHarness::new();
    let (text, is_error) = h
        .call_text(
            "add_role",
            json!({"server_id": "100", "user_id": "2", "role_id": "31337"}),
        )
        .await;

    assert!(is_error);
    assert!(text.contains("role 31337"));
    assert_eq!(h.platform.calls_with_prefix("add_member_role"), 0);
}

#[tokio::test]
async fn add_role_happy_path_names_role_and_member() {
    let h = TestHarness::new();
    let (text, is_error) = h
        .call_text(
            "add_role",
            json!({"server_id": "100", "user_id": "2", "role_id": "200"}),
        )
        .await;

    assert!(!is_error);
    assert_eq!(text, "Added role moderator to user bob");
    assert_eq!(h.platform.calls_with_prefix("add_member_role(100,2,200)"), 1);
}

#[tokio::test]
async fn send_message_reports_new_message_id() {
    let h = TestHarness::new();
    let (text, is_error) = h
        .call_text("send_message", json!({"channel_id": "10", "content": "hello world"}))
        .await;

    assert!(!is_error);
    assert_eq!(text, "Message sent successfully. Message ID: 9999");
}

#[tokio::test]
async fn get_channels_lists_types() {
    let h = TestHarness::new();
    let (text, _) = h.call_text("get_channels", json!({"server_id": "100"})).await;

    assert!(text.contains("Channels in Test Guild (2):"));
    assert!(text.contains("#general (ID: 10) - text"));
    assert!(text.contains("#Voice Lounge (ID: 20) - voice"));
}

#[tokio::test]
async fn inspect_channel_renders_overwrites_and_voice_presence() {
    let h = TestHarness::new();

    let (text, _) = h
        .call_text("inspect_channel", json!({"server_id": "100", "channel_id": "10"}))
        .await;
    assert!(text.contains("Role 'moderator':"));
    assert!(text.contains("Allowed: send_messages"));
    assert!(text.contains("Denied: manage_messages"));

    let (voice_text, _) = h
        .call_text("inspect_channel", json!({"server_id": "100", "channel_id": "20"}))
        .await;
    assert!(voice_text.contains("bitrate: 64kbps"));
    assert!(voice_text.contains("connected_members: alice (Alice)"));
}

#[tokio::test]
async fn get_audit_log_filters_and_resolves_actors() {
    let h = TestHarness::new();

    let (text, _) = h.call_text("get_audit_log", json!({"server_id": "100"})).await;
    assert!(text.contains("alice: channel_delete -> 10"));
    assert!(text.contains("bob: member_ban_add -> 3"));

    let (filtered, _) = h
        .call_text(
            "get_audit_log",
            json!({"server_id": "100", "action_type": "ban"}),
        )
        .await;
    assert!(filtered.contains("member_ban_add"));
    assert!(!filtered.contains("channel_delete"));
}

#[tokio::test]
async fn get_audit_log_clamps_limit() {
    let h = TestHarness::new();
    let _ = h
        .call_text("get_audit_log", json!({"server_id": "100", "limit": 5000}))
        .await;
    assert_eq!(h.platform.calls_with_prefix("fetch_audit_log(100,100)"), 1);
}

#[tokio::test]
async fn list_members_clamps_to_member_ceiling() {
    let h = TestHarness::new();
    let _ = h
        .call_text("list_members", json!({"server_id": "100", "limit": 999999}))
        .await;
    assert_eq!(h.platform.calls_with_prefix("guild_members(100,1000)"), 1);
}

#[tokio::test]
async fn delete_channel_reports_deleted_channel() {
    let h = TestHarness::new();
    let (text, is_error) = h
        .call_text("delete_channel", json!({"channel_id": "10", "reason": "cleanup"}))
        .await;

    assert!(!is_error);
    assert_eq!(text, "Deleted channel #general (ID: 10)");
    assert_eq!(h.platform.calls_with_prefix("delete_channel(10)"), 1);
}

#[tokio::test]
async fn every_tool_produces_nonempty_text() {
    let h = TestHarness::new();
    let calls: Vec<(&str, Value)> = vec![
        ("list_servers", json!({})),
        ("get_server_info", json!({"server_id": "100"})),
        ("get_channels", json!({"server_id": "100"})),
        ("get_user_info", json!({"user_id": "1"})),
        ("list_members", json!({"server_id": "100"})),
        ("list_roles", json!({"server_id": "100"})),
        ("inspect_role", json!({"server_id": "100", "role_id": "200"})),
        ("inspect_channel", json!({"server_id": "100", "channel_id": "10"})),
        ("get_audit_log", json!({"server_id": "100"})),
        ("add_role", json!({"server_id": "100", "user_id": "2", "role_id": "200"})),
        ("remove_role", json!({"server_id": "100", "user_id": "1", "role_id": "200"})),
        ("create_text_channel", json!({"server_id": "100", "name": "new-channel"})),
        ("delete_channel", json!({"channel_id": "20"})),
        ("send_message", json!({"channel_id": "10", "content": "hi"})),
        ("read_messages", json!({"channel_id": "10"})),
        ("add_reaction", json!({"channel_id": "10", "message_id": "1001", "emoji": "👍"})),
        (
            "add_multiple_reactions",
            json!({"channel_id": "10", "message_id": "1001", "emojis": ["👍", "🎉"]}),
        ),
        ("remove_reaction", json!({"channel_id": "10", "message_id": "1003", "emoji": "👍"})),
        (
            "moderate_message",
            json!({"channel_id": "10", "message_id": "1002", "reason": "test"}),
        ),
    ];

    for (tool, arguments) in calls {
        let (text, is_error) = h.call_text(tool, arguments).await;
        assert!(!is_error, "{tool} failed: {text}");
        assert!(!text.is_empty(), "{tool} returned empty text");
    }
}

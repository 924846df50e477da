//! Static tool catalog served by `tools/list`.
//!
//! The catalog is pure data: it can be produced before the Discord session
//! exists, and its order is stable so clients can rely on the display order.
//! The schemas document the contract for the calling agent; actual argument
//! validation happens when each handler decodes its typed input.

use serde::Serialize;
use serde_json::{json, Value};

/// One MCP tool descriptor.
#[derive(Debug, Clone, Serialize)]
pub struct Tool {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl Tool {
    fn new(name: &str, description: &str, input_schema: Value) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            input_schema,
        }
    }
}

/// The full ordered tool catalog.
pub fn catalog() -> Vec<Tool> {
    vec![
        Tool::new(
            "list_servers",
            "Get a list of all Discord servers the bot has access to",
            json!({
                "type": "object",
                "properties": {},
            }),
        ),
        // Server information tools
        Tool::new(
            "get_server_info",
            "Get information about a Discord server",
            json!({
                "type": "object",
                "properties": {
                    "server_id": {"type": "string", "description": "Discord server (guild) ID"},
                },
                "required": ["server_id"],
            }),
        ),
        Tool::new(
            "get_channels",
            "Get a list of all channels in a Discord server",
            json!({
                "type": "object",
                "properties": {
                    "server_id": {"type": "string", "description": "Discord server (guild) ID"},
                },
                "required": ["server_id"],
            }),
        ),
        Tool::new(
            "get_user_info",
            "Get information about a Discord user",
            json!({
                "type": "object",
                "properties": {
                    "user_id": {"type": "string", "description": "Discord user ID"},
                },
                "required": ["user_id"],
            }),
        ),
        Tool::new(
            "list_members",
            "Get a list of members in a server",
            json!({
                "type": "object",
                "properties": {
                    "server_id": {"type": "string", "description": "Discord server (guild) ID"},
                    "limit": {
                        "type": "number",
                        "description": "Maximum number of members to fetch (max 1000)",
                        "default": 100,
                    },
                },
                "required": ["server_id"],
            }),
        ),
        Tool::new(
            "list_roles",
            "Get a list of all roles in a Discord server",
            json!({
                "type": "object",
                "properties": {
                    "server_id": {"type": "string", "description": "Discord server (guild) ID"},
                },
                "required": ["server_id"],
            }),
        ),
        Tool::new(
            "inspect_role",
            "Get detailed information about a specific role in a Discord server",
            json!({
                "type": "object",
                "properties": {
                    "server_id": {"type": "string", "description": "Discord server (guild) ID"},
                    "role_id": {"type": "string", "description": "Discord role ID"},
                },
                "required": ["server_id", "role_id"],
            }),
        ),
        Tool::new(
            "inspect_channel",
            "Get detailed information about a channel, including permission overwrites",
            json!({
                "type": "object",
                "properties": {
                    "server_id": {"type": "string", "description": "Discord server (guild) ID"},
                    "channel_id": {"type": "string", "description": "Discord channel ID"},
                },
                "required": ["server_id", "channel_id"],
            }),
        ),
        Tool::new(
            "get_audit_log",
            "Get recent audit log entries from the server",
            json!({
                "type": "object",
                "properties": {
                    "server_id": {"type": "string", "description": "Discord server (guild) ID"},
                    "limit": {
                        "type": "number",
                        "description": "Number of entries to fetch (max 100)",
                        "minimum": 1,
                        "maximum": 100,
                    },
                    "action_type": {
                        "type": "string",
                        "description": "Optional filter for action type (e.g. 'member_update', 'message_delete')",
                    },
                },
                "required": ["server_id"],
            }),
        ),
        // Role management tools
        Tool::new(
            "add_role",
            "Add a role to a user",
            json!({
                "type": "object",
                "properties": {
                    "server_id": {"type": "string", "description": "Discord server ID"},
                    "user_id": {"type": "string", "description": "User to add role to"},
                    "role_id": {"type": "string", "description": "Role ID to add"},
                },
                "required": ["server_id", "user_id", "role_id"],
            }),
        ),
        Tool::new(
            "remove_role",
            "Remove a role from a user",
            json!({
                "type": "object",
                "properties": {
                    "server_id": {"type": "string", "description": "Discord server ID"},
                    "user_id": {"type": "string", "description": "User to remove role from"},
                    "role_id": {"type": "string", "description": "Role ID to remove"},
                },
                "required": ["server_id", "user_id", "role_id"],
            }),
        ),
        // Channel management tools
        Tool::new(
            "create_text_channel",
            "Create a new text channel",
            json!({
                "type": "object",
                "properties": {
                    "server_id": {"type": "string", "description": "Discord server ID"},
                    "name": {"type": "string", "description": "Channel name"},
                    "category_id": {
                        "type": "string",
                        "description": "Optional category ID to place channel in",
                    },
                    "topic": {"type": "string", "description": "Optional channel topic"},
                },
                "required": ["server_id", "name"],
            }),
        ),
        Tool::new(
            "delete_channel",
            "Delete a channel",
            json!({
                "type": "object",
                "properties": {
                    "channel_id": {"type": "string", "description": "ID of channel to delete"},
                    "reason": {"type": "string", "description": "Reason for deletion"},
                },
                "required": ["channel_id"],
            }),
        ),
        // Message tools
        Tool::new(
            "send_message",
            "Send a message to a specific channel",
            json!({
                "type": "object",
                "properties": {
                    "channel_id": {"type": "string", "description": "Discord channel ID"},
                    "content": {"type": "string", "description": "Message content"},
                },
                "required": ["channel_id", "content"],
            }),
        ),
        Tool::new(
            "read_messages",
            "Read recent messages from a channel",
            json!({
                "type": "object",
                "properties": {
                    "channel_id": {"type": "string", "description": "Discord channel ID"},
                    "limit": {
                        "type": "number",
                        "description": "Number of messages to fetch (max 100)",
                        "default": 50,
                    },
                    "fetch_reaction_users": {
                        "type": "boolean",
                        "description": "Accepted for compatibility; reactions are always summarized",
                    },
                },
                "required": ["channel_id"],
            }),
        ),
        // Reaction tools
        Tool::new(
            "add_reaction",
            "Add a reaction to a message",
            json!({
                "type": "object",
                "properties": {
                    "channel_id": {"type": "string", "description": "Channel containing the message"},
                    "message_id": {"type": "string", "description": "Message to react to"},
                    "emoji": {
                        "type": "string",
                        "description": "Emoji to react with (Unicode or custom emoji name:id)",
                    },
                },
                "required": ["channel_id", "message_id", "emoji"],
            }),
        ),
        Tool::new(
            "add_multiple_reactions",
            "Add multiple reactions to a message",
            json!({
                "type": "object",
                "properties": {
                    "channel_id": {"type": "string", "description": "Channel containing the message"},
                    "message_id": {"type": "string", "description": "Message to react to"},
                    "emojis": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Emojis to react with",
                    },
                },
                "required": ["channel_id", "message_id", "emojis"],
            }),
        ),
        Tool::new(
            "remove_reaction",
            "Remove the bot's own reaction from a message",
            json!({
                "type": "object",
                "properties": {
                    "channel_id": {"type": "string", "description": "Channel containing the message"},
                    "message_id": {"type": "string", "description": "Message to remove reaction from"},
                    "emoji": {"type": "string", "description": "Emoji reaction to remove"},
                },
                "required": ["channel_id", "message_id", "emoji"],
            }),
        ),
        // Moderation tools
        Tool::new(
            "moderate_message",
            "Delete a message and optionally timeout the user",
            json!({
                "type": "object",
                "properties": {
                    "channel_id": {"type": "string", "description": "Channel ID containing the message"},
                    "message_id": {"type": "string", "description": "ID of message to moderate"},
                    "reason": {"type": "string", "description": "Reason for moderation"},
                    "timeout_minutes": {
                        "type": "number",
                        "description": "Optional timeout duration in minutes (max 40320)",
                    },
                },
                "required": ["channel_id", "message_id", "reason"],
            }),
        ),
    ]
}

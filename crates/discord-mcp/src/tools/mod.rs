//! Tool handlers.
//!
//! One async handler per catalog entry, grouped by the Discord resource it
//! operates on. Every handler decodes a typed argument struct first, resolves
//! the entities it references (cache-preferring fetches), and only then
//! issues any mutation, so argument and resolution failures never leave
//! partial side effects.

pub(crate) mod channel;
pub(crate) mod guild;
pub(crate) mod member;
pub(crate) mod message;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::dispatch::{Registry, ToolError};
use crate::platform::PlatformOperations;

/// Upper bound for message-history reads.
pub const MESSAGE_LIMIT_MAX: u64 = 100;
/// Upper bound for audit-log reads.
pub const AUDIT_LIMIT_MAX: u64 = 100;
/// Upper bound for member listing.
pub const MEMBER_LIMIT_MAX: u64 = 1000;

/// Build the name → handler table. Must stay in lockstep with
/// [`crate::catalog::catalog`]; the dispatch tests enforce the equality.
pub fn registry<P: PlatformOperations>() -> Registry<P> {
    let mut registry = Registry::new();
    registry.insert("list_servers", guild::list_servers::<P>);
    registry.insert("get_server_info", guild::get_server_info::<P>);
    registry.insert("get_channels", guild::get_channels::<P>);
    registry.insert("get_user_info", member::get_user_info::<P>);
    registry.insert("list_members", guild::list_members::<P>);
    registry.insert("list_roles", guild::list_roles::<P>);
    registry.insert("inspect_role", guild::inspect_role::<P>);
    registry.insert("inspect_channel", channel::inspect_channel::<P>);
    registry.insert("get_audit_log", guild::get_audit_log::<P>);
    registry.insert("add_role", member::add_role::<P>);
    registry.insert("remove_role", member::remove_role::<P>);
    registry.insert("create_text_channel", channel::create_text_channel::<P>);
    registry.insert("delete_channel", channel::delete_channel::<P>);
    registry.insert("send_message", message::send_message::<P>);
    registry.insert("read_messages", message::read_messages::<P>);
    registry.insert("add_reaction", message::add_reaction::<P>);
    registry.insert("add_multiple_reactions", message::add_multiple_reactions::<P>);
    registry.insert("remove_reaction", message::remove_reaction::<P>);
    registry.insert("moderate_message", message::moderate_message::<P>);
    registry
}

/// Decode the raw argument object into a tool's typed input.
pub(crate) fn decode<T: DeserializeOwned>(arguments: Value) -> Result<T, ToolError> {
    serde_json::from_value(arguments).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

/// Parse a caller-supplied ID string into a snowflake.
pub(crate) fn parse_id(raw: &str, field: &str) -> Result<u64, ToolError> {
    raw.trim().parse().map_err(|_| {
        ToolError::InvalidArguments(format!("{field} must be a numeric Discord ID, got {raw:?}"))
    })
}

/// Clamp a caller-supplied page size into `1..=max`.
pub(crate) fn clamp_limit(requested: Option<u64>, default: u64, max: u64) -> u64 {
    requested.unwrap_or(default).clamp(1, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_accepts_snowflakes() {
        assert_eq!(parse_id("123456789", "server_id").unwrap(), 123456789);
        assert_eq!(parse_id(" 42 ", "user_id").unwrap(), 42);
    }

    #[test]
    fn parse_id_rejects_garbage() {
        let err = parse_id("not-a-number", "server_id").unwrap_err();
        assert!(err.to_string().contains("server_id"));
        assert!(err.to_string().contains("not-a-number"));
        assert!(parse_id("-5", "role_id").is_err());
        assert!(parse_id("", "role_id").is_err());
    }

    #[test]
    fn clamp_limit_bounds() {
        assert_eq!(clamp_limit(None, 50, 100), 50);
        assert_eq!(clamp_limit(Some(500), 50, 100), 100);
        assert_eq!(clamp_limit(Some(0), 50, 100), 1);
        assert_eq!(clamp_limit(Some(70), 50, 100), 70);
        assert_eq!(clamp_limit(Some(5000), 100, 1000), 1000);
    }

    #[test]
    fn decode_reports_missing_fields() {
        #[derive(serde::Deserialize, Debug)]
        struct Args {
            #[allow(dead_code)]
            server_id: String,
        }
        let err = decode::<Args>(serde_json::json!({})).unwrap_err();
        assert!(err.to_string().contains("server_id"));
    }
}

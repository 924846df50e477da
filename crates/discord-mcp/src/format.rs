//! Timestamp and audit-log rendering helpers shared by the tool handlers.

use chrono::{DateTime, Utc};

/// Milliseconds between the Unix epoch and the Discord epoch (2015-01-01).
const DISCORD_EPOCH_MS: u64 = 1_420_070_400_000;

/// Format a datetime the way every tool output renders times.
pub fn format_dt(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Creation time encoded in a snowflake ID (top 42 bits, ms since Discord epoch).
pub fn snowflake_timestamp(id: u64) -> DateTime<Utc> {
    let ms = (id >> 22) + DISCORD_EPOCH_MS;
    DateTime::from_timestamp_millis(ms as i64).unwrap_or_default()
}

/// Render a snowflake's creation time.
pub fn snowflake_created_at(id: u64) -> String {
    format_dt(snowflake_timestamp(id))
}

/// Render an ISO-8601 timestamp from the REST API; falls back to the raw
/// string when Discord sends something unparseable.
pub fn format_iso(ts: &str) -> String {
    match DateTime::parse_from_rfc3339(ts) {
        Ok(dt) => format_dt(dt.with_timezone(&Utc)),
        Err(_) => ts.to_string(),
    }
}

/// Human name for an audit-log action code.
///
/// Unknown codes render as `action_<code>` so new API actions still produce
/// a filterable line.
pub fn audit_action_name(code: u32) -> String {
    let name = match code {
        1 => "guild_update",
        10 => "channel_create",
        11 => "channel_update",
        12 => "channel_delete",
        13 => "channel_overwrite_create",
        14 => "channel_overwrite_update",
        15 => "channel_overwrite_delete",
        20 => "member_kick",
        21 => "member_prune",
        22 => "member_ban_add",
        23 => "member_ban_remove",
        24 => "member_update",
        25 => "member_role_update",
        26 => "member_move",
        27 => "member_disconnect",
        28 => "bot_add",
        30 => "role_create",
        31 => "role_update",
        32 => "role_delete",
        40 => "invite_create",
        41 => "invite_update",
        42 => "invite_delete",
        50 => "webhook_create",
        51 => "webhook_update",
        52 => "webhook_delete",
        60 => "emoji_create",
        61 => "emoji_update",
        62 => "emoji_delete",
        72 => "message_delete",
        73 => "message_bulk_delete",
        74 => "message_pin",
        75 => "message_unpin",
        80 => "integration_create",
        81 => "integration_update",
        82 => "integration_delete",
        83 => "stage_instance_create",
        84 => "stage_instance_update",
        85 => "stage_instance_delete",
        90 => "sticker_create",
        91 => "sticker_update",
        92 => "sticker_delete",
        100 => "guild_scheduled_event_create",
        101 => "guild_scheduled_event_update",
        102 => "guild_scheduled_event_delete",
        110 => "thread_create",
        111 => "thread_update",
        112 => "thread_delete",
        121 => "application_command_permission_update",
        140 => "auto_moderation_rule_create",
        141 => "auto_moderation_rule_update",
        142 => "auto_moderation_rule_delete",
        143 => "auto_moderation_block_message",
        _ => return format!("action_{}", code),
    };
    name.to_string()
}

/// Verification level name as Discord documents them.
pub fn verification_level_name(level: u8) -> &'static str {
    match level {
        0 => "none",
        1 => "low",
        2 => "medium",
        3 => "high",
        4 => "very_high",
        _ => "unknown",
    }
}

//! Discord entity types as the tool handlers consume them.
//!
//! These mirror the REST API v10 / gateway JSON shapes, trimmed to the fields
//! the tools render. Snowflake IDs and permission bitsets arrive as JSON
//! strings and are stored as `u64` via the serde helpers below.

use serde::{Deserialize, Serialize};

/// Serde adapter for Discord's string-encoded u64 values (snowflake IDs and
/// permission bitsets). Accepts a bare number too, which the gateway emits
/// for a few fields.
pub mod str_u64 {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::String(s) => s
                .parse()
                .map_err(|_| D::Error::custom(format!("invalid u64 string: {s:?}"))),
            serde_json::Value::Number(n) => n
                .as_u64()
                .ok_or_else(|| D::Error::custom("expected unsigned integer")),
            other => Err(D::Error::custom(format!(
                "expected string-encoded u64, got {other}"
            ))),
        }
    }
}

/// Same as [`str_u64`] for optional fields; `null` and absent both map to `None`.
pub mod str_u64_opt {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.collect_str(v),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<u64>, D::Error> {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::Null => Ok(None),
            serde_json::Value::String(s) => s
                .parse()
                .map(Some)
                .map_err(|_| D::Error::custom(format!("invalid u64 string: {s:?}"))),
            serde_json::Value::Number(n) => n
                .as_u64()
                .map(Some)
                .ok_or_else(|| D::Error::custom("expected unsigned integer")),
            other => Err(D::Error::custom(format!(
                "expected string-encoded u64 or null, got {other}"
            ))),
        }
    }
}

/// Same as [`str_u64`] for arrays (member role lists).
pub mod str_u64_vec {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(values: &[u64], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(values.iter().map(|v| v.to_string()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u64>, D::Error> {
        let raw = Vec::<serde_json::Value>::deserialize(deserializer)?;
        raw.into_iter()
            .map(|value| match value {
                serde_json::Value::String(s) => s
                    .parse()
                    .map_err(|_| D::Error::custom(format!("invalid u64 string: {s:?}"))),
                serde_json::Value::Number(n) => n
                    .as_u64()
                    .ok_or_else(|| D::Error::custom("expected unsigned integer")),
                other => Err(D::Error::custom(format!(
                    "expected string-encoded u64, got {other}"
                ))),
            })
            .collect()
    }
}

// ── Guilds ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Guild {
    #[serde(with = "str_u64")]
    pub id: u64,
    pub name: String,
    #[serde(default, with = "str_u64_opt")]
    pub owner_id: Option<u64>,
    #[serde(default)]
    pub verification_level: u8,
    /// Exact count from the gateway GUILD_CREATE payload.
    #[serde(default)]
    pub member_count: Option<u64>,
    /// Approximate count from `GET /guilds/{id}?with_counts=true`.
    #[serde(default)]
    pub approximate_member_count: Option<u64>,
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl Guild {
    /// Best available member count; 0 when neither source reported one.
    pub fn members(&self) -> u64 {
        self.member_count
            .or(self.approximate_member_count)
            .unwrap_or(0)
    }
}

// ── Channels ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Channel {
    #[serde(with = "str_u64")]
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, with = "str_u64_opt")]
    pub guild_id: Option<u64>,
    #[serde(default)]
    pub position: Option<i64>,
    #[serde(default, with = "str_u64_opt")]
    pub parent_id: Option<u64>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub nsfw: bool,
    /// Slowmode, in seconds.
    #[serde(default)]
    pub rate_limit_per_user: Option<u64>,
    #[serde(default)]
    pub bitrate: Option<u64>,
    #[serde(default)]
    pub user_limit: Option<u64>,
    #[serde(default)]
    pub permission_overwrites: Vec<PermissionOverwrite>,
}

impl Channel {
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed")
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            0 => "text",
            1 => "dm",
            2 => "voice",
            3 => "group_dm",
            4 => "category",
            5 => "announcement",
            10 | 11 | 12 => "thread",
            13 => "stage",
            14 => "directory",
            15 => "forum",
            16 => "media",
            _ => "unknown",
        }
    }

    pub fn is_text_like(&self) -> bool {
        matches!(self.kind, 0 | 5 | 10 | 11 | 12 | 15 | 16)
    }

    pub fn is_voice_like(&self) -> bool {
        matches!(self.kind, 2 | 13)
    }
}

/// Per-channel permission override for one role or member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionOverwrite {
    #[serde(with = "str_u64")]
    pub id: u64,
    /// 0 = role, 1 = member.
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(with = "str_u64")]
    pub allow: u64,
    #[serde(with = "str_u64")]
    pub deny: u64,
}

impl PermissionOverwrite {
    pub fn is_role(&self) -> bool {
        self.kind == 0
    }
}

// ── Users, members, roles ───────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct User {
    #[serde(with = "str_u64")]
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub global_name: Option<String>,
    #[serde(default)]
    pub bot: bool,
}

impl User {
    pub fn display_name(&self) -> &str {
        self.global_name.as_deref().unwrap_or(&self.username)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Member {
    pub user: User,
    #[serde(default)]
    pub nick: Option<String>,
    #[serde(default, with = "str_u64_vec")]
    pub roles: Vec<u64>,
    #[serde(default)]
    pub joined_at: Option<String>,
    #[serde(default)]
    pub communication_disabled_until: Option<String>,
}

impl Member {
    pub fn display_name(&self) -> &str {
        self.nick.as_deref().unwrap_or_else(|| self.user.display_name())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Role {
    #[serde(with = "str_u64")]
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub position: i64,
    #[serde(default)]
    pub color: u32,
    #[serde(default)]
    pub hoist: bool,
    #[serde(default)]
    pub mentionable: bool,
    #[serde(default)]
    pub managed: bool,
    #[serde(default, with = "str_u64")]
    pub permissions: u64,
}

// ── Messages ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Message {
    #[serde(with = "str_u64")]
    pub id: u64,
    #[serde(with = "str_u64")]
    pub channel_id: u64,
    pub author: User,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub reactions: Vec<Reaction>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Reaction {
    pub count: u64,
    pub emoji: ReactionEmoji,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReactionEmoji {
    #[serde(default, with = "str_u64_opt")]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
}

impl ReactionEmoji {
    pub fn display(&self) -> &str {
        self.name.as_deref().unwrap_or("?")
    }
}

// ── Audit log ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditLog {
    #[serde(default)]
    pub audit_log_entries: Vec<AuditLogEntry>,
    /// Users referenced by the entries, for actor resolution.
    #[serde(default)]
    pub users: Vec<User>,
}

impl AuditLog {
    pub fn user(&self, id: u64) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditLogEntry {
    #[serde(with = "str_u64")]
    pub id: u64,
    #[serde(default, with = "str_u64_opt")]
    pub user_id: Option<u64>,
    pub action_type: u32,
    /// Target snowflake as a raw string; not every action targets an entity.
    #[serde(default)]
    pub target_id: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

// ── Voice state (gateway cache) ─────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoiceState {
    #[serde(default, with = "str_u64_opt")]
    pub channel_id: Option<u64>,
    #[serde(with = "str_u64")]
    pub user_id: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guild_deserializes_from_rest_shape() {
        let guild: Guild = serde_json::from_value(serde_json::json!({
            "id": "81384788765712384",
            "name": "Discord API",
            "owner_id": "53908232506183680",
            "verification_level": 3,
            "approximate_member_count": 425,
            "roles": [
                {"id": "81384788765712384", "name": "@everyone", "position": 0, "permissions": "104324673"}
            ]
        }))
        .unwrap();
        assert_eq!(guild.id, 81384788765712384);
        assert_eq!(guild.members(), 425);
        assert_eq!(guild.roles.len(), 1);
        assert_eq!(guild.roles[0].permissions, 104324673);
    }

    #[test]
    fn guild_prefers_exact_member_count() {
        let guild = Guild {
            member_count: Some(10),
            approximate_member_count: Some(99),
            ..Guild::default()
        };
        assert_eq!(guild.members(), 10);
    }

    #[test]
    fn channel_deserializes_with_overwrites() {
        let channel: Channel = serde_json::from_value(serde_json::json!({
            "id": "41771983423143937",
            "type": 0,
            "name": "general",
            "guild_id": "41771983423143937",
            "position": 6,
            "topic": "24/7 chat",
            "nsfw": true,
            "rate_limit_per_user": 2,
            "permission_overwrites": [
                {"id": "4", "type": 0, "allow": "2048", "deny": "1024"}
            ]
        }))
        .unwrap();
        assert_eq!(channel.kind_name(), "text");
        assert!(channel.is_text_like());
        assert_eq!(channel.permission_overwrites[0].allow, 2048);
        assert!(channel.permission_overwrites[0].is_role());
    }

    #[test]
    fn voice_channel_kind() {
        let channel = Channel {
            kind: 2,
            bitrate: Some(64000),
            ..Channel::default()
        };
        assert_eq!(channel.kind_name(), "voice");
        assert!(channel.is_voice_like());
        assert!(!channel.is_text_like());
    }

    #[test]
    fn member_display_name_prefers_nick() {
        let member: Member = serde_json::from_value(serde_json::json!({
            "user": {"id": "1", "username": "alice", "global_name": "Alice"},
            "nick": "Ali",
            "roles": ["10", "20"]
        }))
        .unwrap();
        assert_eq!(member.display_name(), "Ali");
        assert_eq!(member.roles, vec![10, 20]);
    }

    #[test]
    fn user_display_name_falls_back_to_username() {
        let user: User =
            serde_json::from_value(serde_json::json!({"id": "1", "username": "alice"})).unwrap();
        assert_eq!(user.display_name(), "alice");
        assert!(!user.bot);
    }

    #[test]
    fn message_deserializes_with_reactions() {
        let message: Message = serde_json::from_value(serde_json::json!({
            "id": "334", "channel_id": "290",
            "author": {"id": "1", "username": "alice"},
            "content": "hi",
            "timestamp": "2024-03-01T12:30:45.123000+00:00",
            "reactions": [{"count": 2, "emoji": {"id": null, "name": "👍"}}]
        }))
        .unwrap();
        assert_eq!(message.reactions[0].count, 2);
        assert_eq!(message.reactions[0].emoji.display(), "👍");
    }

    #[test]
    fn audit_log_resolves_actors() {
        let log: AuditLog = serde_json::from_value(serde_json::json!({
            "audit_log_entries": [
                {"id": "400", "user_id": "1", "action_type": 12, "target_id": "290", "reason": "cleanup"}
            ],
            "users": [{"id": "1", "username": "alice"}]
        }))
        .unwrap();
        let entry = &log.audit_log_entries[0];
        assert_eq!(log.user(entry.user_id.unwrap()).unwrap().username, "alice");
        assert_eq!(entry.action_type, 12);
    }

    #[test]
    fn str_u64_accepts_bare_numbers() {
        let state: VoiceState =
            serde_json::from_value(serde_json::json!({"channel_id": 5, "user_id": 7})).unwrap();
        assert_eq!(state.channel_id, Some(5));
        assert_eq!(state.user_id, 7);
    }
}

//! Minimal Discord REST API v10 client.
//!
//! One method per endpoint the platform layer needs; every call authenticates
//! with the bot token and maps non-success statuses onto [`PlatformError`].

use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::platform::types::{AuditLog, Channel, Guild, Member, Message, Role, User};
use crate::platform::{PlatformError, PlatformResult};

/// Header carrying the human-readable reason into the guild audit log.
const AUDIT_REASON_HEADER: &str = "X-Audit-Log-Reason";

pub(crate) struct RestClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl RestClient {
    pub(crate) fn new(token: String, base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Issue a request and fail unless the response status is a success.
    ///
    /// `what` names the entity being addressed so a 404 renders as
    /// "<what> not found".
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        reason: Option<&str>,
        what: &str,
    ) -> PlatformResult<reqwest::Response> {
        let url = format!("{}/{}", self.base_url, path);
        let mut request = self
            .http
            .request(method, &url)
            .header(AUTHORIZATION, format!("Bot {}", self.token));
        if let Some(body) = body {
            request = request.json(body);
        }
        if let Some(reason) = reason {
            match HeaderValue::from_str(reason) {
                Ok(value) => request = request.header(AUDIT_REASON_HEADER, value),
                Err(_) => log::debug!("audit reason not header-safe, omitting: {reason:?}"),
            }
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());
        Err(map_error(status.as_u16(), message, what))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, what: &str) -> PlatformResult<T> {
        let response = self.request(Method::GET, path, None, None, what).await?;
        Ok(response.json().await?)
    }

    // ── Guilds ──────────────────────────────────────────────────────

    pub(crate) async fn get_guild(&self, guild_id: u64) -> PlatformResult<Guild> {
        self.get_json(
            &format!("guilds/{guild_id}?with_counts=true"),
            &format!("guild {guild_id}"),
        )
        .await
    }

    pub(crate) async fn get_guild_channels(&self, guild_id: u64) -> PlatformResult<Vec<Channel>> {
        self.get_json(
            &format!("guilds/{guild_id}/channels"),
            &format!("guild {guild_id}"),
        )
        .await
    }

    pub(crate) async fn get_guild_roles(&self, guild_id: u64) -> PlatformResult<Vec<Role>> {
        self.get_json(
            &format!("guilds/{guild_id}/roles"),
            &format!("guild {guild_id}"),
        )
        .await
    }

    pub(crate) async fn get_guild_member(
        &self,
        guild_id: u64,
        user_id: u64,
    ) -> PlatformResult<Member> {
        self.get_json(
            &format!("guilds/{guild_id}/members/{user_id}"),
            &format!("member {user_id}"),
        )
        .await
    }

    pub(crate) async fn list_guild_members(
        &self,
        guild_id: u64,
        limit: u64,
    ) -> PlatformResult<Vec<Member>> {
        self.get_json(
            &format!("guilds/{guild_id}/members?limit={limit}"),
            &format!("guild {guild_id}"),
        )
        .await
    }

    pub(crate) async fn get_audit_log(
        &self,
        guild_id: u64,
        limit: u64,
    ) -> PlatformResult<AuditLog> {
        self.get_json(
            &format!("guilds/{guild_id}/audit-logs?limit={limit}"),
            &format!("guild {guild_id}"),
        )
        .await
    }

    // ── Channels ────────────────────────────────────────────────────

    pub(crate) async fn get_channel(&self, channel_id: u64) -> PlatformResult<Channel> {
        self.get_json(
            &format!("channels/{channel_id}"),
            &format!("channel {channel_id}"),
        )
        .await
    }

    pub(crate) async fn create_guild_channel(
        &self,
        guild_id: u64,
        name: &str,
        category_id: Option<u64>,
        topic: Option<&str>,
        reason: Option<&str>,
    ) -> PlatformResult<Channel> {
        let mut body = json!({"name": name, "type": 0});
        if let Some(category_id) = category_id {
            body["parent_id"] = Value::String(category_id.to_string());
        }
        if let Some(topic) = topic {
            body["topic"] = Value::String(topic.to_string());
        }
        let response = self
            .request(
                Method::POST,
                &format!("guilds/{guild_id}/channels"),
                Some(&body),
                reason,
                &format!("guild {guild_id}"),
            )
            .await?;
        Ok(response.json().await?)
    }

    pub(crate) async fn delete_channel(
        &self,
        channel_id: u64,
        reason: Option<&str>,
    ) -> PlatformResult<Channel> {
        let response = self
            .request(
                Method::DELETE,
                &format!("channels/{channel_id}"),
                None,
                reason,
                &format!("channel {channel_id}"),
            )
            .await?;
        Ok(response.json().await?)
    }

    // ── Messages ────────────────────────────────────────────────────

    pub(crate) async fn get_channel_messages(
        &self,
        channel_id: u64,
        limit: u64,
    ) -> PlatformResult<Vec<Message>> {
        self.get_json(
            &format!("channels/{channel_id}/messages?limit={limit}"),
            &format!("channel {channel_id}"),
        )
        .await
    }

    pub(crate) async fn get_message(
        &self,
        channel_id: u64,
        message_id: u64,
    ) -> PlatformResult<Message> {
        self.get_json(
            &format!("channels/{channel_id}/messages/{message_id}"),
            &format!("message {message_id}"),
        )
        .await
    }

    pub(crate) async fn create_message(
        &self,
        channel_id: u64,
        content: &str,
    ) -> PlatformResult<Message> {
        let body = json!({"content": content});
        let response = self
            .request(
                Method::POST,
                &format!("channels/{channel_id}/messages"),
                Some(&body),
                None,
                &format!("channel {channel_id}"),
            )
            .await?;
        Ok(response.json().await?)
    }

    pub(crate) async fn delete_message(
        &self,
        channel_id: u64,
        message_id: u64,
        reason: Option<&str>,
    ) -> PlatformResult<()> {
        self.request(
            Method::DELETE,
            &format!("channels/{channel_id}/messages/{message_id}"),
            None,
            reason,
            &format!("message {message_id}"),
        )
        .await?;
        Ok(())
    }

    // ── Reactions ───────────────────────────────────────────────────

    pub(crate) async fn create_reaction(
        &self,
        channel_id: u64,
        message_id: u64,
        emoji: &str,
    ) -> PlatformResult<()> {
        self.request(
            Method::PUT,
            &format!(
                "channels/{channel_id}/messages/{message_id}/reactions/{}/@me",
                encode_emoji(emoji)
            ),
            None,
            None,
            &format!("message {message_id}"),
        )
        .await?;
        Ok(())
    }

    pub(crate) async fn delete_own_reaction(
        &self,
        channel_id: u64,
        message_id: u64,
        emoji: &str,
    ) -> PlatformResult<()> {
        self.request(
            Method::DELETE,
            &format!(
                "channels/{channel_id}/messages/{message_id}/reactions/{}/@me",
                encode_emoji(emoji)
            ),
            None,
            None,
            &format!("message {message_id}"),
        )
        .await?;
        Ok(())
    }

    // ── Members and roles ───────────────────────────────────────────

    pub(crate) async fn add_member_role(
        &self,
        guild_id: u64,
        user_id: u64,
        role_id: u64,
        reason: Option<&str>,
    ) -> PlatformResult<()> {
        self.request(
            Method::PUT,
            &format!("guilds/{guild_id}/members/{user_id}/roles/{role_id}"),
            None,
            reason,
            &format!("role {role_id}"),
        )
        .await?;
        Ok(())
    }

    pub(crate) async fn remove_member_role(
        &self,
        guild_id: u64,
        user_id: u64,
        role_id: u64,
        reason: Option<&str>,
    ) -> PlatformResult<()> {
        self.request(
            Method::DELETE,
            &format!("guilds/{guild_id}/members/{user_id}/roles/{role_id}"),
            None,
            reason,
            &format!("role {role_id}"),
        )
        .await?;
        Ok(())
    }

    /// Set `communication_disabled_until` on a member (ISO-8601, or null to clear).
    pub(crate) async fn timeout_member(
        &self,
        guild_id: u64,
        user_id: u64,
        until: &str,
        reason: Option<&str>,
    ) -> PlatformResult<()> {
        let body = json!({"communication_disabled_until": until});
        self.request(
            Method::PATCH,
            &format!("guilds/{guild_id}/members/{user_id}"),
            Some(&body),
            reason,
            &format!("member {user_id}"),
        )
        .await?;
        Ok(())
    }

    // ── Users ───────────────────────────────────────────────────────

    pub(crate) async fn get_user(&self, user_id: u64) -> PlatformResult<User> {
        self.get_json(&format!("users/{user_id}"), &format!("user {user_id}"))
            .await
    }
}

/// Map a non-success HTTP status onto the platform error taxonomy.
fn map_error(status: u16, message: String, what: &str) -> PlatformError {
    match status {
        404 => PlatformError::NotFound(what.to_string()),
        401 | 403 => PlatformError::PermissionDenied(message),
        429 => PlatformError::RateLimited(message),
        _ => PlatformError::Api { status, message },
    }
}

/// Percent-encode an emoji for use as a URL path segment.
///
/// Custom emoji keep the `name:id` form, so `:` passes through.
fn encode_emoji(emoji: &str) -> String {
    let mut out = String::with_capacity(emoji.len() * 3);
    for byte in emoji.as_bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b':' => {
                out.push(*byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

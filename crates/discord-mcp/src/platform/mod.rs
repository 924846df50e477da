//! Clean layer boundary between the MCP tools and the Discord connection.
//!
//! Tool handlers call [`PlatformOperations`] instead of the REST/gateway
//! client directly, making the whole dispatch layer testable with the
//! [`mock::MockPlatform`] test double.

use std::future::Future;

pub mod mock;
pub mod types;

pub use types::{
    AuditLog, AuditLogEntry, Channel, Guild, Member, Message, PermissionOverwrite, Reaction,
    ReactionEmoji, Role, User, VoiceState,
};

/// Result type for platform operations.
pub type PlatformResult<T> = Result<T, PlatformError>;

/// Errors from platform operations.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("rate limited by Discord: {0}")]
    RateLimited(String),
    #[error("Discord API error (status {status}): {message}")]
    Api { status: u16, message: String },
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("gateway error: {0}")]
    Gateway(String),
}

/// Abstraction over the live Discord connection.
///
/// Fetch operations prefer the session's local cache and fall back to a
/// network fetch on a miss; mutations always hit the network and accept an
/// optional reason recorded in the guild audit log.
pub trait PlatformOperations: Send + Sync + 'static {
    /// Whether the session is currently usable (gateway READY received).
    fn is_ready(&self) -> bool;

    /// Resolves once the session becomes ready; never resolves while it
    /// stays disconnected (callers bound the wait themselves).
    fn wait_until_ready(&self) -> impl Future<Output = ()> + Send;

    /// All guilds the session currently has loaded.
    fn current_guilds(&self) -> impl Future<Output = PlatformResult<Vec<Guild>>> + Send;

    fn fetch_guild(&self, guild_id: u64)
        -> impl Future<Output = PlatformResult<Guild>> + Send;

    fn fetch_channel(
        &self,
        channel_id: u64,
    ) -> impl Future<Output = PlatformResult<Channel>> + Send;

    fn guild_channels(
        &self,
        guild_id: u64,
    ) -> impl Future<Output = PlatformResult<Vec<Channel>>> + Send;

    fn fetch_user(&self, user_id: u64) -> impl Future<Output = PlatformResult<User>> + Send;

    fn fetch_member(
        &self,
        guild_id: u64,
        user_id: u64,
    ) -> impl Future<Output = PlatformResult<Member>> + Send;

    fn guild_members(
        &self,
        guild_id: u64,
        limit: u64,
    ) -> impl Future<Output = PlatformResult<Vec<Member>>> + Send;

    fn guild_roles(
        &self,
        guild_id: u64,
    ) -> impl Future<Output = PlatformResult<Vec<Role>>> + Send;

    /// Most recent messages, newest first.
    fn channel_messages(
        &self,
        channel_id: u64,
        limit: u64,
    ) -> impl Future<Output = PlatformResult<Vec<Message>>> + Send;

    fn fetch_message(
        &self,
        channel_id: u64,
        message_id: u64,
    ) -> impl Future<Output = PlatformResult<Message>> + Send;

    fn send_message(
        &self,
        channel_id: u64,
        content: &str,
    ) -> impl Future<Output = PlatformResult<Message>> + Send;

    fn delete_message(
        &self,
        channel_id: u64,
        message_id: u64,
        reason: Option<&str>,
    ) -> impl Future<Output = PlatformResult<()>> + Send;

    fn add_reaction(
        &self,
        channel_id: u64,
        message_id: u64,
        emoji: &str,
    ) -> impl Future<Output = PlatformResult<()>> + Send;

    /// Removes the session user's own reaction.
    fn remove_reaction(
        &self,
        channel_id: u64,
        message_id: u64,
        emoji: &str,
    ) -> impl Future<Output = PlatformResult<()>> + Send;

    fn add_member_role(
        &self,
        guild_id: u64,
        user_id: u64,
        role_id: u64,
        reason: Option<&str>,
    ) -> impl Future<Output = PlatformResult<()>> + Send;

    fn remove_member_role(
        &self,
        guild_id: u64,
        user_id: u64,
        role_id: u64,
        reason: Option<&str>,
    ) -> impl Future<Output = PlatformResult<()>> + Send;

    fn create_text_channel(
        &self,
        guild_id: u64,
        name: &str,
        category_id: Option<u64>,
        topic: Option<&str>,
        reason: Option<&str>,
    ) -> impl Future<Output = PlatformResult<Channel>> + Send;

    /// Deletes a channel and returns the deleted channel object.
    fn delete_channel(
        &self,
        channel_id: u64,
        reason: Option<&str>,
    ) -> impl Future<Output = PlatformResult<Channel>> + Send;

    /// Applies a communication timeout of `minutes` from now.
    fn timeout_member(
        &self,
        guild_id: u64,
        user_id: u64,
        minutes: u64,
        reason: Option<&str>,
    ) -> impl Future<Output = PlatformResult<()>> + Send;

    /// Most recent audit-log entries, newest first.
    fn fetch_audit_log(
        &self,
        guild_id: u64,
        limit: u64,
    ) -> impl Future<Output = PlatformResult<AuditLog>> + Send;

    /// Users currently connected to a voice channel, from the voice-state cache.
    fn voice_members(
        &self,
        guild_id: u64,
        channel_id: u64,
    ) -> impl Future<Output = PlatformResult<Vec<User>>> + Send;
}

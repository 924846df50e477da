//! Production Discord session: REST client + gateway task + entity caches.
//!
//! [`DiscordPlatform`] implements [`PlatformOperations`] by consulting the
//! gateway-fed caches first and falling back to the REST API on a miss.
//! The caches are written only by the gateway task; the tool handlers reach
//! them exclusively through the read-side fetch operations.

mod gateway;
mod rest;

pub use gateway::DEFAULT_GATEWAY_URL;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::{watch, RwLock};

use crate::platform::types::*;
use crate::platform::{PlatformOperations, PlatformResult};
use rest::RestClient;

pub const DEFAULT_API_URL: &str = "https://discord.com/api/v10";

/// Communication timeouts cap out at 28 days.
pub const MAX_TIMEOUT_MINUTES: u64 = 28 * 24 * 60;

#[derive(Default)]
struct Cache {
    guilds: HashMap<u64, Guild>,
    channels: HashMap<u64, Channel>,
    /// Keyed by `(guild_id, user_id)`.
    members: HashMap<(u64, u64), Member>,
    /// Voice presences per guild.
    voice: HashMap<u64, Vec<VoiceState>>,
}

pub(crate) struct Inner {
    rest: RestClient,
    pub(crate) token: String,
    cache: RwLock<Cache>,
    ready_tx: watch::Sender<bool>,
    ready_rx: watch::Receiver<bool>,
}

impl Inner {
    pub(crate) fn set_ready(&self, ready: bool) {
        self.ready_tx.send_replace(ready);
    }

    /// Apply one gateway dispatch event to the caches.
    pub(crate) async fn apply_event(&self, event: &str, d: Value) {
        match event {
            "READY" => {
                if let Some(user) = d.get("user").and_then(|u| User::deserialize(u).ok()) {
                    log::info!("logged in as {} (ID: {})", user.username, user.id);
                }
                self.set_ready(true);
            }
            "GUILD_CREATE" | "GUILD_UPDATE" => {
                let Ok(guild) = Guild::deserialize(&d) else {
                    log::debug!("ignoring malformed {event} payload");
                    return;
                };
                let extra = GuildExtra::deserialize(&d).unwrap_or_default();
                let guild_id = guild.id;
                let mut cache = self.cache.write().await;
                for mut channel in extra.channels {
                    channel.guild_id.get_or_insert(guild_id);
                    cache.channels.insert(channel.id, channel);
                }
                for member in extra.members {
                    cache.members.insert((guild_id, member.user.id), member);
                }
                if !extra.voice_states.is_empty() {
                    cache.voice.insert(guild_id, extra.voice_states);
                }
                log::debug!("cached guild {} ({})", guild.name, guild_id);
                cache.guilds.insert(guild_id, guild);
            }
            "GUILD_DELETE" => {
                let Some(guild_id) = parse_id_field(&d, "id") else { return };
                let mut cache = self.cache.write().await;
                cache.guilds.remove(&guild_id);
                cache.channels.retain(|_, c| c.guild_id != Some(guild_id));
                cache.members.retain(|(g, _), _| *g != guild_id);
                cache.voice.remove(&guild_id);
            }
            "CHANNEL_CREATE" | "CHANNEL_UPDATE" => {
                if let Ok(channel) = Channel::deserialize(&d) {
                    self.cache.write().await.channels.insert(channel.id, channel);
                }
            }
            "CHANNEL_DELETE" => {
                if let Some(channel_id) = parse_id_field(&d, "id") {
                    self.cache.write().await.channels.remove(&channel_id);
                }
            }
            "GUILD_MEMBER_ADD" | "GUILD_MEMBER_UPDATE" => {
                let Some(guild_id) = parse_id_field(&d, "guild_id") else { return };
                if let Ok(member) = Member::deserialize(&d) {
                    self.cache
                        .write()
                        .await
                        .members
                        .insert((guild_id, member.user.id), member);
                }
            }
            "GUILD_MEMBER_REMOVE" => {
                let Some(guild_id) = parse_id_field(&d, "guild_id") else { return };
                let Some(user_id) = d
                    .get("user")
                    .and_then(|u| parse_id_field(u, "id"))
                else {
                    return;
                };
                self.cache.write().await.members.remove(&(guild_id, user_id));
            }
            "VOICE_STATE_UPDATE" => {
                let Some(guild_id) = parse_id_field(&d, "guild_id") else { return };
                let Ok(state) = VoiceState::deserialize(&d) else { return };
                let mut cache = self.cache.write().await;
                let states = cache.voice.entry(guild_id).or_default();
                states.retain(|s| s.user_id != state.user_id);
                if state.channel_id.is_some() {
                    states.push(state);
                }
            }
            _ => {}
        }
    }
}

/// Sibling collections delivered alongside the guild object in GUILD_CREATE.
#[derive(Debug, Default, Deserialize)]
struct GuildExtra {
    #[serde(default)]
    channels: Vec<Channel>,
    #[serde(default)]
    members: Vec<Member>,
    #[serde(default)]
    voice_states: Vec<VoiceState>,
}

fn parse_id_field(value: &Value, field: &str) -> Option<u64> {
    match value.get(field)? {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

/// Live Discord session handle; cheap to clone, shared between the gateway
/// task and the MCP server.
#[derive(Clone)]
pub struct DiscordPlatform {
    inner: Arc<Inner>,
}

impl DiscordPlatform {
    pub fn new(token: String, api_url: &str) -> Self {
        let (ready_tx, ready_rx) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                rest: RestClient::new(token.clone(), api_url),
                token,
                cache: RwLock::new(Cache::default()),
                ready_tx,
                ready_rx,
            }),
        }
    }

    /// Drive the gateway connection until the process exits. Intended to be
    /// spawned next to the request loop; the two share only the readiness
    /// flag and the caches.
    pub async fn run_gateway(self, gateway_url: String) {
        gateway::run(self.inner.clone(), gateway_url).await
    }
}

impl PlatformOperations for DiscordPlatform {
    fn is_ready(&self) -> bool {
        *self.inner.ready_rx.borrow()
    }

    async fn wait_until_ready(&self) {
        let mut rx = self.inner.ready_rx.clone();
        // Only errors if the sender is dropped, which cannot outlive `inner`.
        let _ = rx.wait_for(|ready| *ready).await;
    }

    async fn current_guilds(&self) -> PlatformResult<Vec<Guild>> {
        let cache = self.inner.cache.read().await;
        let mut guilds: Vec<Guild> = cache.guilds.values().cloned().collect();
        guilds.sort_by_key(|g| g.id);
        Ok(guilds)
    }

    async fn fetch_guild(&self, guild_id: u64) -> PlatformResult<Guild> {
        if let Some(guild) = self.inner.cache.read().await.guilds.get(&guild_id) {
            return Ok(guild.clone());
        }
        self.inner.rest.get_guild(guild_id).await
    }

    async fn fetch_channel(&self, channel_id: u64) -> PlatformResult<Channel> {
        if let Some(channel) = self.inner.cache.read().await.channels.get(&channel_id) {
            return Ok(channel.clone());
        }
        self.inner.rest.get_channel(channel_id).await
    }

    async fn guild_channels(&self, guild_id: u64) -> PlatformResult<Vec<Channel>> {
        {
            let cache = self.inner.cache.read().await;
            let mut channels: Vec<Channel> = cache
                .channels
                .values()
                .filter(|c| c.guild_id == Some(guild_id))
                .cloned()
                .collect();
            if !channels.is_empty() {
                channels.sort_by_key(|c| (c.position.unwrap_or(0), c.id));
                return Ok(channels);
            }
        }
        self.inner.rest.get_guild_channels(guild_id).await
    }

    async fn fetch_user(&self, user_id: u64) -> PlatformResult<User> {
        self.inner.rest.get_user(user_id).await
    }

    async fn fetch_member(&self, guild_id: u64, user_id: u64) -> PlatformResult<Member> {
        if let Some(member) = self
            .inner
            .cache
            .read()
            .await
            .members
            .get(&(guild_id, user_id))
        {
            return Ok(member.clone());
        }
        self.inner.rest.get_guild_member(guild_id, user_id).await
    }

    async fn guild_members(&self, guild_id: u64, limit: u64) -> PlatformResult<Vec<Member>> {
        {
            let cache = self.inner.cache.read().await;
            let mut members: Vec<Member> = cache
                .members
                .iter()
                .filter(|((g, _), _)| *g == guild_id)
                .map(|(_, m)| m.clone())
                .collect();
            if !members.is_empty() {
                members.sort_by_key(|m| m.user.id);
                members.truncate(limit as usize);
                return Ok(members);
            }
        }
        self.inner.rest.list_guild_members(guild_id, limit).await
    }

    async fn guild_roles(&self, guild_id: u64) -> PlatformResult<Vec<Role>> {
        if let Some(guild) = self.inner.cache.read().await.guilds.get(&guild_id) {
            if !guild.roles.is_empty() {
                return Ok(guild.roles.clone());
            }
        }
        self.inner.rest.get_guild_roles(guild_id).await
    }

    async fn channel_messages(&self, channel_id: u64, limit: u64) -> PlatformResult<Vec<Message>> {
        self.inner.rest.get_channel_messages(channel_id, limit).await
    }

    async fn fetch_message(&self, channel_id: u64, message_id: u64) -> PlatformResult<Message> {
        self.inner.rest.get_message(channel_id, message_id).await
    }

    async fn send_message(&self, channel_id: u64, content: &str) -> PlatformResult<Message> {
        self.inner.rest.create_message(channel_id, content).await
    }

    async fn delete_message(
        &self,
        channel_id: u64,
        message_id: u64,
        reason: Option<&str>,
    ) -> PlatformResult<()> {
        self.inner
            .rest
            .delete_message(channel_id, message_id, reason)
            .await
    }

    async fn add_reaction(
        &self,
        channel_id: u64,
        message_id: u64,
        emoji: &str,
    ) -> PlatformResult<()> {
        self.inner
            .rest
            .create_reaction(channel_id, message_id, emoji)
            .await
    }

    async fn remove_reaction(
        &self,
        channel_id: u64,
        message_id: u64,
        emoji: &str,
    ) -> PlatformResult<()> {
        self.inner
            .rest
            .delete_own_reaction(channel_id, message_id, emoji)
            .await
    }

    async fn add_member_role(
        &self,
        guild_id: u64,
        user_id: u64,
        role_id: u64,
        reason: Option<&str>,
    ) -> PlatformResult<()> {
        self.inner
            .rest
            .add_member_role(guild_id, user_id, role_id, reason)
            .await
    }

    async fn remove_member_role(
        &self,
        guild_id: u64,
        user_id: u64,
        role_id: u64,
        reason: Option<&str>,
    ) -> PlatformResult<()> {
        self.inner
            .rest
            .remove_member_role(guild_id, user_id, role_id, reason)
            .await
    }

    async fn create_text_channel(
        &self,
        guild_id: u64,
        name: &str,
        category_id: Option<u64>,
        topic: Option<&str>,
        reason: Option<&str>,
    ) -> PlatformResult<Channel> {
        self.inner
            .rest
            .create_guild_channel(guild_id, name, category_id, topic, reason)
            .await
    }

    async fn delete_channel(
        &self,
        channel_id: u64,
        reason: Option<&str>,
    ) -> PlatformResult<Channel> {
        let channel = self.inner.rest.delete_channel(channel_id, reason).await?;
        self.inner.cache.write().await.channels.remove(&channel_id);
        Ok(channel)
    }

    async fn timeout_member(
        &self,
        guild_id: u64,
        user_id: u64,
        minutes: u64,
        reason: Option<&str>,
    ) -> PlatformResult<()> {
        let minutes = minutes.min(MAX_TIMEOUT_MINUTES);
        let until = (Utc::now() + chrono::Duration::minutes(minutes as i64)).to_rfc3339();
        self.inner
            .rest
            .timeout_member(guild_id, user_id, &until, reason)
            .await
    }

    async fn fetch_audit_log(&self, guild_id: u64, limit: u64) -> PlatformResult<AuditLog> {
        self.inner.rest.get_audit_log(guild_id, limit).await
    }

    async fn voice_members(&self, guild_id: u64, channel_id: u64) -> PlatformResult<Vec<User>> {
        let states: Vec<VoiceState> = {
            let cache = self.inner.cache.read().await;
            cache
                .voice
                .get(&guild_id)
                .map(|states| {
                    states
                        .iter()
                        .filter(|s| s.channel_id == Some(channel_id))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default()
        };

        let mut users = Vec::with_capacity(states.len());
        for state in states {
            let cached = self
                .inner
                .cache
                .read()
                .await
                .members
                .get(&(guild_id, state.user_id))
                .map(|m| m.user.clone());
            match cached {
                Some(user) => users.push(user),
                None => match self.inner.rest.get_user(state.user_id).await {
                    Ok(user) => users.push(user),
                    Err(e) => log::debug!("skipping unresolvable voice member {}: {e}", state.user_id),
                },
            }
        }
        Ok(users)
    }
}

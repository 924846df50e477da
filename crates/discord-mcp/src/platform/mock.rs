//! In-memory [`PlatformOperations`] test double.
//!
//! Backs the unit and integration suites: every operation is appended to a
//! spy log so tests can assert which platform calls a tool issued (or that
//! none were issued at all). Compiled into the library so the `tests/`
//! integration suite can use it over the public API.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::types::*;
use super::{PlatformError, PlatformOperations, PlatformResult};

pub struct MockPlatform {
    ready: AtomicBool,
    calls: Mutex<Vec<String>>,
    pub guilds: Mutex<Vec<Guild>>,
    pub channels: Mutex<Vec<Channel>>,
    pub users: Mutex<Vec<User>>,
    /// `(guild_id, member)` pairs.
    pub members: Mutex<Vec<(u64, Member)>>,
    pub messages: Mutex<Vec<Message>>,
    pub audit_log: Mutex<AuditLog>,
    /// `(guild_id, channel_id, user_id)` voice presences.
    pub voice: Mutex<Vec<(u64, u64, u64)>>,
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPlatform {
    /// A platform pre-populated with one guild, two channels, two members,
    /// and three messages, enough surface for every tool to run.
    pub fn new() -> Self {
        let alice = User {
            id: 1,
            username: "alice".to_string(),
            global_name: Some("Alice".to_string()),
            bot: false,
        };
        let bob = User {
            id: 2,
            username: "bob".to_string(),
            global_name: None,
            bot: false,
        };

        let everyone = Role {
            id: 100,
            name: "@everyone".to_string(),
            position: 0,
            permissions: (1 << 10) | (1 << 11),
            ..Role::default()
        };
        let moderator = Role {
            id: 200,
            name: "moderator".to_string(),
            position: 1,
            color: 0xff0000,
            hoist: true,
            permissions: (1 << 13) | (1 << 40),
            ..Role::default()
        };

        let guild = Guild {
            id: 100,
            name: "Test Guild".to_string(),
            owner_id: Some(1),
            verification_level: 1,
            member_count: Some(2),
            roles: vec![everyone, moderator],
            ..Guild::default()
        };

        let general = Channel {
            id: 10,
            kind: 0,
            name: Some("general".to_string()),
            guild_id: Some(100),
            position: Some(0),
            topic: Some("talk here".to_string()),
            rate_limit_per_user: Some(0),
            permission_overwrites: vec![PermissionOverwrite {
                id: 200,
                kind: 0,
                allow: 1 << 11,
                deny: 1 << 13,
            }],
            ..Channel::default()
        };
        let lounge = Channel {
            id: 20,
            kind: 2,
            name: Some("Voice Lounge".to_string()),
            guild_id: Some(100),
            position: Some(1),
            bitrate: Some(64000),
            user_limit: Some(0),
            ..Channel::default()
        };

        let member_alice = Member {
            user: alice.clone(),
            nick: None,
            roles: vec![200],
            joined_at: Some("2023-01-01T00:00:00+00:00".to_string()),
            ..Member::default()
        };
        let member_bob = Member {
            user: bob.clone(),
            roles: vec![],
            joined_at: Some("2023-06-01T00:00:00+00:00".to_string()),
            ..Member::default()
        };

        let messages = vec![
            Message {
                id: 1001,
                channel_id: 10,
                author: alice.clone(),
                content: "first".to_string(),
                timestamp: "2024-03-01T10:00:00+00:00".to_string(),
                ..Message::default()
            },
            Message {
                id: 1002,
                channel_id: 10,
                author: bob.clone(),
                content: "second".to_string(),
                timestamp: "2024-03-01T10:01:00+00:00".to_string(),
                ..Message::default()
            },
            Message {
                id: 1003,
                channel_id: 10,
                author: alice.clone(),
                content: "third".to_string(),
                timestamp: "2024-03-01T10:02:00+00:00".to_string(),
                reactions: vec![Reaction {
                    count: 2,
                    emoji: ReactionEmoji {
                        id: None,
                        name: Some("👍".to_string()),
                    },
                }],
            },
        ];

        let audit_log = AuditLog {
            audit_log_entries: vec![
                AuditLogEntry {
                    id: 5002,
                    user_id: Some(1),
                    action_type: 12,
                    target_id: Some("10".to_string()),
                    reason: Some("cleanup".to_string()),
                },
                AuditLogEntry {
                    id: 5001,
                    user_id: Some(2),
                    action_type: 22,
                    target_id: Some("3".to_string()),
                    reason: None,
                },
            ],
            users: vec![alice.clone(), bob.clone()],
        };

        Self {
            ready: AtomicBool::new(true),
            calls: Mutex::new(Vec::new()),
            guilds: Mutex::new(vec![guild]),
            channels: Mutex::new(vec![general, lounge]),
            users: Mutex::new(vec![alice, bob]),
            members: Mutex::new(vec![(100, member_alice), (100, member_bob)]),
            messages: Mutex::new(messages),
            audit_log: Mutex::new(audit_log),
            voice: Mutex::new(vec![(100, 20, 1)]),
        }
    }

    /// A platform with no data at all (still ready).
    pub fn empty() -> Self {
        Self {
            ready: AtomicBool::new(true),
            calls: Mutex::new(Vec::new()),
            guilds: Mutex::new(Vec::new()),
            channels: Mutex::new(Vec::new()),
            users: Mutex::new(Vec::new()),
            members: Mutex::new(Vec::new()),
            messages: Mutex::new(Vec::new()),
            audit_log: Mutex::new(AuditLog::default()),
            voice: Mutex::new(Vec::new()),
        }
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Spy log of every platform operation issued so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of recorded operations whose name starts with `prefix`.
    pub fn calls_with_prefix(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl PlatformOperations for MockPlatform {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn wait_until_ready(&self) {
        while !self.ready.load(Ordering::SeqCst) {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
    }

    async fn current_guilds(&self) -> PlatformResult<Vec<Guild>> {
        self.record("current_guilds()".to_string());
        Ok(self.guilds.lock().unwrap().clone())
    }

    async fn fetch_guild(&self, guild_id: u64) -> PlatformResult<Guild> {
        self.record(format!("fetch_guild({guild_id})"));
        self.guilds
            .lock()
            .unwrap()
            .iter()
            .find(|g| g.id == guild_id)
            .cloned()
            .ok_or_else(|| PlatformError::NotFound(format!("guild {guild_id}")))
    }

    async fn fetch_channel(&self, channel_id: u64) -> PlatformResult<Channel> {
        self.record(format!("fetch_channel({channel_id})"));
        self.channels
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == channel_id)
            .cloned()
            .ok_or_else(|| PlatformError::NotFound(format!("channel {channel_id}")))
    }

    async fn guild_channels(&self, guild_id: u64) -> PlatformResult<Vec<Channel>> {
        self.record(format!("guild_channels({guild_id})"));
        Ok(self
            .channels
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.guild_id == Some(guild_id))
            .cloned()
            .collect())
    }

    async fn fetch_user(&self, user_id: u64) -> PlatformResult<User> {
        self.record(format!("fetch_user({user_id})"));
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == user_id)
            .cloned()
            .ok_or_else(|| PlatformError::NotFound(format!("user {user_id}")))
    }

    async fn fetch_member(&self, guild_id: u64, user_id: u64) -> PlatformResult<Member> {
        self.record(format!("fetch_member({guild_id},{user_id})"));
        self.members
            .lock()
            .unwrap()
            .iter()
            .find(|(g, m)| *g == guild_id && m.user.id == user_id)
            .map(|(_, m)| m.clone())
            .ok_or_else(|| PlatformError::NotFound(format!("member {user_id}")))
    }

    async fn guild_members(&self, guild_id: u64, limit: u64) -> PlatformResult<Vec<Member>> {
        self.record(format!("guild_members({guild_id},{limit})"));
        Ok(self
            .members
            .lock()
            .unwrap()
            .iter()
            .filter(|(g, _)| *g == guild_id)
            .take(limit as usize)
            .map(|(_, m)| m.clone())
            .collect())
    }

    async fn guild_roles(&self, guild_id: u64) -> PlatformResult<Vec<Role>> {
        self.record(format!("guild_roles({guild_id})"));
        self.guilds
            .lock()
            .unwrap()
            .iter()
            .find(|g| g.id == guild_id)
            .map(|g| g.roles.clone())
            .ok_or_else(|| PlatformError::NotFound(format!("guild {guild_id}")))
    }

    async fn channel_messages(&self, channel_id: u64, limit: u64) -> PlatformResult<Vec<Message>> {
        self.record(format!("channel_messages({channel_id},{limit})"));
        let mut messages: Vec<Message> = self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.channel_id == channel_id)
            .cloned()
            .collect();
        messages.sort_by(|a, b| b.id.cmp(&a.id));
        messages.truncate(limit as usize);
        Ok(messages)
    }

    async fn fetch_message(&self, channel_id: u64, message_id: u64) -> PlatformResult<Message> {
        self.record(format!("fetch_message({channel_id},{message_id})"));
        self.messages
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.channel_id == channel_id && m.id == message_id)
            .cloned()
            .ok_or_else(|| PlatformError::NotFound(format!("message {message_id}")))
    }

    async fn send_message(&self, channel_id: u64, content: &str) -> PlatformResult<Message> {
        self.record(format!("send_message({channel_id})"));
        Ok(Message {
            id: 9999,
            channel_id,
            author: self.users.lock().unwrap().first().cloned().unwrap_or_default(),
            content: content.to_string(),
            timestamp: "2024-03-01T12:00:00+00:00".to_string(),
            ..Message::default()
        })
    }

    async fn delete_message(
        &self,
        channel_id: u64,
        message_id: u64,
        _reason: Option<&str>,
    ) -> PlatformResult<()> {
        self.record(format!("delete_message({channel_id},{message_id})"));
        Ok(())
    }

    async fn add_reaction(
        &self,
        channel_id: u64,
        message_id: u64,
        emoji: &str,
    ) -> PlatformResult<()> {
        self.record(format!("add_reaction({channel_id},{message_id},{emoji})"));
        Ok(())
    }

    async fn remove_reaction(
        &self,
        channel_id: u64,
        message_id: u64,
        emoji: &str,
    ) -> PlatformResult<()> {
        self.record(format!("remove_reaction({channel_id},{message_id},{emoji})"));
        Ok(())
    }

    async fn add_member_role(
        &self,
        guild_id: u64,
        user_id: u64,
        role_id: u64,
        _reason: Option<&str>,
    ) -> PlatformResult<()> {
        self.record(format!("add_member_role({guild_id},{user_id},{role_id})"));
        Ok(())
    }

    async fn remove_member_role(
        &self,
        guild_id: u64,
        user_id: u64,
        role_id: u64,
        _reason: Option<&str>,
    ) -> PlatformResult<()> {
        self.record(format!("remove_member_role({guild_id},{user_id},{role_id})"));
        Ok(())
    }

    async fn create_text_channel(
        &self,
        guild_id: u64,
        name: &str,
        category_id: Option<u64>,
        topic: Option<&str>,
        _reason: Option<&str>,
    ) -> PlatformResult<Channel> {
        self.record(format!("create_text_channel({guild_id},{name})"));
        Ok(Channel {
            id: 5000,
            kind: 0,
            name: Some(name.to_string()),
            guild_id: Some(guild_id),
            parent_id: category_id,
            topic: topic.map(str::to_string),
            ..Channel::default()
        })
    }

    async fn delete_channel(
        &self,
        channel_id: u64,
        _reason: Option<&str>,
    ) -> PlatformResult<Channel> {
        self.record(format!("delete_channel({channel_id})"));
        self.channels
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == channel_id)
            .cloned()
            .ok_or_else(|| PlatformError::NotFound(format!("channel {channel_id}")))
    }

    async fn timeout_member(
        &self,
        guild_id: u64,
        user_id: u64,
        minutes: u64,
        _reason: Option<&str>,
    ) -> PlatformResult<()> {
        self.record(format!("timeout_member({guild_id},{user_id},{minutes})"));
        Ok(())
    }

    async fn fetch_audit_log(&self, guild_id: u64, limit: u64) -> PlatformResult<AuditLog> {
        self.record(format!("fetch_audit_log({guild_id},{limit})"));
        let mut log = self.audit_log.lock().unwrap().clone();
        log.audit_log_entries.truncate(limit as usize);
        Ok(log)
    }

    async fn voice_members(&self, guild_id: u64, channel_id: u64) -> PlatformResult<Vec<User>> {
        self.record(format!("voice_members({guild_id},{channel_id})"));
        let users = self.users.lock().unwrap();
        Ok(self
            .voice
            .lock()
            .unwrap()
            .iter()
            .filter(|(g, c, _)| *g == guild_id && *c == channel_id)
            .filter_map(|(_, _, uid)| users.iter().find(|u| u.id == *uid).cloned())
            .collect())
    }
}

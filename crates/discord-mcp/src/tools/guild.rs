//! Guild-level tools: enumeration, server info, members, roles, audit log.

use serde::Deserialize;
use serde_json::Value;

use super::{clamp_limit, decode, parse_id, AUDIT_LIMIT_MAX, MEMBER_LIMIT_MAX};
use crate::dispatch::{ToolError, ToolFuture};
use crate::format::{audit_action_name, snowflake_created_at, verification_level_name};
use crate::permissions::permission_list;
use crate::platform::{PlatformError, PlatformOperations};

#[derive(Debug, Deserialize)]
struct ServerArgs {
    server_id: String,
}

#[derive(Debug, Deserialize)]
struct ListMembersArgs {
    server_id: String,
    #[serde(default)]
    limit: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RoleArgs {
    server_id: String,
    role_id: String,
}

#[derive(Debug, Deserialize)]
struct AuditLogArgs {
    server_id: String,
    #[serde(default)]
    limit: Option<u64>,
    #[serde(default)]
    action_type: Option<String>,
}

pub(crate) fn list_servers<P: PlatformOperations>(platform: &P, _arguments: Value) -> ToolFuture<'_> {
    Box::pin(async move {
        let guilds = platform.current_guilds().await?;
        let mut out = format!("Connected servers ({}):", guilds.len());
        for guild in &guilds {
            out.push_str(&format!(
                "\n{} (ID: {}) - Members: {}",
                guild.name,
                guild.id,
                guild.members()
            ));
        }
        Ok(out)
    })
}

pub(crate) fn get_server_info<P: PlatformOperations>(platform: &P, arguments: Value) -> ToolFuture<'_> {
    Box::pin(async move {
        let args: ServerArgs = decode(arguments)?;
        let guild_id = parse_id(&args.server_id, "server_id")?;
        let guild = platform.fetch_guild(guild_id).await?;
        let owner = match guild.owner_id {
            Some(owner_id) => match platform.fetch_user(owner_id).await {
                Ok(user) => user.username,
                Err(_) => owner_id.to_string(),
            },
            None => "unknown".to_string(),
        };
        let channels = platform.guild_channels(guild_id).await?;

        Ok([
            format!("Server Name: {}", guild.name),
            format!("ID: {}", guild.id),
            format!("Owner: {}", owner),
            format!("Created At: {}", snowflake_created_at(guild.id)),
            format!("Member Count: {}", guild.members()),
            format!(
                "Verification Level: {}",
                verification_level_name(guild.verification_level)
            ),
            format!("Roles: {}", guild.roles.len()),
            format!("Channels: {}", channels.len()),
        ]
        .join("\n"))
    })
}

pub(crate) fn get_channels<P: PlatformOperations>(platform: &P, arguments: Value) -> ToolFuture<'_> {
    Box::pin(async move {
        let args: ServerArgs = decode(arguments)?;
        let guild_id = parse_id(&args.server_id, "server_id")?;
        let guild = platform.fetch_guild(guild_id).await?;
        let channels = platform.guild_channels(guild_id).await?;

        let mut out = format!("Channels in {} ({}):", guild.name, channels.len());
        for channel in &channels {
            out.push_str(&format!(
                "\n#{} (ID: {}) - {}",
                channel.name(),
                channel.id,
                channel.kind_name()
            ));
        }
        Ok(out)
    })
}

pub(crate) fn list_members<P: PlatformOperations>(platform: &P, arguments: Value) -> ToolFuture<'_> {
    Box::pin(async move {
        let args: ListMembersArgs = decode(arguments)?;
        let guild_id = parse_id(&args.server_id, "server_id")?;
        let limit = clamp_limit(args.limit, 100, MEMBER_LIMIT_MAX);
        let guild = platform.fetch_guild(guild_id).await?;
        let roles = platform.guild_roles(guild_id).await?;
        let members = platform.guild_members(guild_id, limit).await?;

        let mut out = format!("Members in {} (first {}):", guild.name, members.len());
        for member in &members {
            let role_names: Vec<&str> = member
                .roles
                .iter()
                .filter_map(|role_id| roles.iter().find(|r| r.id == *role_id))
                .filter(|r| r.name != "@everyone")
                .map(|r| r.name.as_str())
                .collect();
            let roles_text = if role_names.is_empty() {
                "none".to_string()
            } else {
                role_names.join(", ")
            };
            out.push_str(&format!(
                "\n{} (ID: {}) - Roles: {}",
                member.user.username, member.user.id, roles_text
            ));
        }
        Ok(out)
    })
}

pub(crate) fn list_roles<P: PlatformOperations>(platform: &P, arguments: Value) -> ToolFuture<'_> {
    Box::pin(async move {
        let args: ServerArgs = decode(arguments)?;
        let guild_id = parse_id(&args.server_id, "server_id")?;
        let guild = platform.fetch_guild(guild_id).await?;
        let mut roles = platform.guild_roles(guild_id).await?;
        // Highest role first.
        roles.sort_by(|a, b| b.position.cmp(&a.position));

        let mut out = format!("Roles in {} ({}):", guild.name, roles.len());
        for role in &roles {
            out.push_str(&format!(
                "\n{} (ID: {}, Position: {})",
                role.name, role.id, role.position
            ));
        }
        Ok(out)
    })
}

pub(crate) fn inspect_role<P: PlatformOperations>(platform: &P, arguments: Value) -> ToolFuture<'_> {
    Box::pin(async move {
        let args: RoleArgs = decode(arguments)?;
        let guild_id = parse_id(&args.server_id, "server_id")?;
        let role_id = parse_id(&args.role_id, "role_id")?;
        let roles = platform.guild_roles(guild_id).await?;
        let role = roles.iter().find(|r| r.id == role_id).ok_or_else(|| {
            ToolError::Platform(PlatformError::NotFound(format!("role {role_id}")))
        })?;

        Ok([
            format!("Role information for '{}':", role.name),
            format!("name: {}", role.name),
            format!("id: {}", role.id),
            format!("position: {}", role.position),
            format!("color: #{:06x}", role.color),
            format!("mentionable: {}", role.mentionable),
            format!("hoist: {}", role.hoist),
            format!("managed: {}", role.managed),
            format!("permissions_value: {}", role.permissions),
            format!("permissions: {}", permission_list(role.permissions)),
            format!("created_at: {}", snowflake_created_at(role.id)),
        ]
        .join("\n"))
    })
}

pub(crate) fn get_audit_log<P: PlatformOperations>(platform: &P, arguments: Value) -> ToolFuture<'_> {
    Box::pin(async move {
        let args: AuditLogArgs = decode(arguments)?;
        let guild_id = parse_id(&args.server_id, "server_id")?;
        let limit = clamp_limit(args.limit, 20, AUDIT_LIMIT_MAX);
        let guild = platform.fetch_guild(guild_id).await?;
        let log = platform.fetch_audit_log(guild_id, limit).await?;
        let filter = args.action_type.map(|f| f.to_lowercase());

        let mut lines = Vec::new();
        for entry in &log.audit_log_entries {
            let action = audit_action_name(entry.action_type);
            if let Some(filter) = &filter {
                if !action.contains(filter.as_str()) {
                    continue;
                }
            }
            let actor = entry
                .user_id
                .and_then(|id| log.user(id))
                .map(|u| u.username.clone())
                .or_else(|| entry.user_id.map(|id| id.to_string()))
                .unwrap_or_else(|| "system".to_string());
            let target = entry.target_id.as_deref().unwrap_or("-");
            lines.push(format!(
                "[{}] {}: {} -> {}",
                snowflake_created_at(entry.id),
                actor,
                action,
                target
            ));
        }

        let mut out = format!("Audit log for {} ({} entries):", guild.name, lines.len());
        for line in lines {
            out.push('\n');
            out.push_str(&line);
        }
        Ok(out)
    })
}

//! User lookup and member role management tools.

use serde::Deserialize;
use serde_json::Value;

use super::{decode, parse_id};
use crate::dispatch::{ToolError, ToolFuture};
use crate::format::snowflake_created_at;
use crate::platform::{PlatformError, PlatformOperations, Role};

#[derive(Debug, Deserialize)]
struct UserArgs {
    user_id: String,
}

#[derive(Debug, Deserialize)]
struct MemberRoleArgs {
    server_id: String,
    user_id: String,
    role_id: String,
}

pub(crate) fn get_user_info<P: PlatformOperations>(platform: &P, arguments: Value) -> ToolFuture<'_> {
    Box::pin(async move {
        let args: UserArgs = decode(arguments)?;
        let user_id = parse_id(&args.user_id, "user_id")?;
        let user = platform.fetch_user(user_id).await?;

        Ok([
            format!("Username: {}", user.username),
            format!("Display Name: {}", user.display_name()),
            format!("ID: {}", user.id),
            format!("Bot: {}", user.bot),
            format!("Created At: {}", snowflake_created_at(user.id)),
        ]
        .join("\n"))
    })
}

/// Resolve the role named by `role_id` from a guild's role set.
fn find_role(roles: &[Role], role_id: u64) -> Result<&Role, ToolError> {
    roles.iter().find(|r| r.id == role_id).ok_or_else(|| {
        ToolError::Platform(PlatformError::NotFound(format!("role {role_id}")))
    })
}

pub(crate) fn add_role<P: PlatformOperations>(platform: &P, arguments: Value) -> ToolFuture<'_> {
    Box::pin(async move {
        let args: MemberRoleArgs = decode(arguments)?;
        let guild_id = parse_id(&args.server_id, "server_id")?;
        let user_id = parse_id(&args.user_id, "user_id")?;
        let role_id = parse_id(&args.role_id, "role_id")?;

        let member = platform.fetch_member(guild_id, user_id).await?;
        let roles = platform.guild_roles(guild_id).await?;
        let role = find_role(&roles, role_id)?;

        platform
            .add_member_role(guild_id, user_id, role_id, Some("Role added via MCP"))
            .await?;
        Ok(format!(
            "Added role {} to user {}",
            role.name,
            member.display_name()
        ))
    })
}

pub(crate) fn remove_role<P: PlatformOperations>(platform: &P, arguments: Value) -> ToolFuture<'_> {
    Box::pin(async move {
        let args: MemberRoleArgs = decode(arguments)?;
        let guild_id = parse_id(&args.server_id, "server_id")?;
        let user_id = parse_id(&args.user_id, "user_id")?;
        let role_id = parse_id(&args.role_id, "role_id")?;

        let member = platform.fetch_member(guild_id, user_id).await?;
        let roles = platform.guild_roles(guild_id).await?;
        let role = find_role(&roles, role_id)?;

        platform
            .remove_member_role(guild_id, user_id, role_id, Some("Role removed via MCP"))
            .await?;
        Ok(format!(
            "Removed role {} from user {}",
            role.name,
            member.display_name()
        ))
    })
}

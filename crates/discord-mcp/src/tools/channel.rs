//! Channel management tools: inspection, creation, deletion.

use serde::Deserialize;
use serde_json::Value;

use super::{decode, parse_id};
use crate::dispatch::{ToolError, ToolFuture};
use crate::format::snowflake_created_at;
use crate::permissions::permission_list;
use crate::platform::{PlatformError, PlatformOperations};

#[derive(Debug, Deserialize)]
struct InspectChannelArgs {
    server_id: String,
    channel_id: String,
}

#[derive(Debug, Deserialize)]
struct CreateChannelArgs {
    server_id: String,
    name: String,
    #[serde(default)]
    category_id: Option<String>,
    #[serde(default)]
    topic: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeleteChannelArgs {
    channel_id: String,
    #[serde(default)]
    reason: Option<String>,
}

pub(crate) fn inspect_channel<P: PlatformOperations>(platform: &P, arguments: Value) -> ToolFuture<'_> {
    Box::pin(async move {
        let args: InspectChannelArgs = decode(arguments)?;
        let guild_id = parse_id(&args.server_id, "server_id")?;
        let channel_id = parse_id(&args.channel_id, "channel_id")?;

        let _guild = platform.fetch_guild(guild_id).await?;
        let channel = platform.fetch_channel(channel_id).await?;
        if channel.guild_id.is_some() && channel.guild_id != Some(guild_id) {
            return Err(ToolError::Platform(PlatformError::NotFound(format!(
                "channel {channel_id} in guild {guild_id}"
            ))));
        }
        let roles = platform.guild_roles(guild_id).await?;
        let channels = platform.guild_channels(guild_id).await?;

        let mut lines = vec![
            format!("Channel information for '#{}':", channel.name()),
            format!("name: {}", channel.name()),
            format!("id: {}", channel.id),
            format!("type: {}", channel.kind_name()),
        ];
        let category = channel
            .parent_id
            .and_then(|parent_id| channels.iter().find(|c| c.id == parent_id))
            .map(|c| c.name().to_string())
            .unwrap_or_else(|| "None".to_string());
        lines.push(format!("category: {category}"));
        lines.push(format!("position: {}", channel.position.unwrap_or(0)));
        lines.push(format!("created_at: {}", snowflake_created_at(channel.id)));

        if channel.is_text_like() {
            lines.push(format!(
                "topic: {}",
                channel.topic.as_deref().unwrap_or("None")
            ));
            lines.push(format!("nsfw: {}", channel.nsfw));
            lines.push(format!(
                "slowmode_delay: {}s",
                channel.rate_limit_per_user.unwrap_or(0)
            ));
        } else if channel.is_voice_like() {
            lines.push(format!("bitrate: {}kbps", channel.bitrate.unwrap_or(0) / 1000));
            let user_limit = match channel.user_limit {
                Some(limit) if limit > 0 => limit.to_string(),
                _ => "Unlimited".to_string(),
            };
            lines.push(format!("user_limit: {user_limit}"));
            let connected = platform.voice_members(guild_id, channel_id).await?;
            let connected_text = if connected.is_empty() {
                "None".to_string()
            } else {
                connected
                    .iter()
                    .map(|u| format!("{} ({})", u.username, u.display_name()))
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            lines.push(format!("connected_members: {connected_text}"));
        }

        let mut overwrites = Vec::new();
        for overwrite in &channel.permission_overwrites {
            if overwrite.allow == 0 && overwrite.deny == 0 {
                continue;
            }
            let (target_type, target_name) = if overwrite.is_role() {
                let name = roles
                    .iter()
                    .find(|r| r.id == overwrite.id)
                    .map(|r| r.name.clone())
                    .unwrap_or_else(|| format!("{} (unresolved)", overwrite.id));
                ("Role", name)
            } else {
                let name = match platform.fetch_member(guild_id, overwrite.id).await {
                    Ok(member) => member.display_name().to_string(),
                    Err(_) => format!("{} (unresolved)", overwrite.id),
                };
                ("Member", name)
            };
            overwrites.push(format!(
                "\n  {} '{}':\n    Allowed: {}\n    Denied: {}",
                target_type,
                target_name,
                permission_list(overwrite.allow),
                permission_list(overwrite.deny)
            ));
        }

        let mut out = lines.join("\n");
        out.push_str("\n\nPermission overwrites:");
        if overwrites.is_empty() {
            out.push_str(" None");
        } else {
            for entry in overwrites {
                out.push_str(&entry);
            }
        }
        Ok(out)
    })
}

pub(crate) fn create_text_channel<P: PlatformOperations>(platform: &P, arguments: Value) -> ToolFuture<'_> {
    Box::pin(async move {
        let args: CreateChannelArgs = decode(arguments)?;
        let guild_id = parse_id(&args.server_id, "server_id")?;
        let category_id = match &args.category_id {
            Some(raw) => Some(parse_id(raw, "category_id")?),
            None => None,
        };

        let _guild = platform.fetch_guild(guild_id).await?;
        let channel = platform
            .create_text_channel(
                guild_id,
                &args.name,
                category_id,
                args.topic.as_deref(),
                Some("Channel created via MCP"),
            )
            .await?;
        Ok(format!(
            "Created text channel #{} (ID: {})",
            channel.name(),
            channel.id
        ))
    })
}

pub(crate) fn delete_channel<P: PlatformOperations>(platform: &P, arguments: Value) -> ToolFuture<'_> {
    Box::pin(async move {
        let args: DeleteChannelArgs = decode(arguments)?;
        let channel_id = parse_id(&args.channel_id, "channel_id")?;

        // Resolve first so a bad ID never reaches the destructive call.
        let channel = platform.fetch_channel(channel_id).await?;
        platform
            .delete_channel(
                channel_id,
                Some(args.reason.as_deref().unwrap_or("Channel deleted via MCP")),
            )
            .await?;
        Ok(format!(
            "Deleted channel #{} (ID: {})",
            channel.name(),
            channel.id
        ))
    })
}

//! Message tools: send, read, react, moderate.

use serde::Deserialize;
use serde_json::Value;

use super::{clamp_limit, decode, parse_id, MESSAGE_LIMIT_MAX};
use crate::dispatch::{ToolError, ToolFuture};
use crate::format::format_iso;
use crate::platform::{Message, PlatformOperations};

#[derive(Debug, Deserialize)]
struct SendMessageArgs {
    channel_id: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ReadMessagesArgs {
    channel_id: String,
    #[serde(default)]
    limit: Option<u64>,
    // Accepted for compatibility; reactions are always summarized.
    #[serde(default, rename = "fetch_reaction_users")]
    _fetch_reaction_users: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct ReactionArgs {
    channel_id: String,
    message_id: String,
    emoji: String,
}

#[derive(Debug, Deserialize)]
struct MultiReactionArgs {
    channel_id: String,
    message_id: String,
    emojis: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ModerateMessageArgs {
    channel_id: String,
    message_id: String,
    reason: String,
    #[serde(default)]
    timeout_minutes: Option<u64>,
}

pub(crate) fn send_message<P: PlatformOperations>(platform: &P, arguments: Value) -> ToolFuture<'_> {
    Box::pin(async move {
        let args: SendMessageArgs = decode(arguments)?;
        let channel_id = parse_id(&args.channel_id, "channel_id")?;
        let channel = platform.fetch_channel(channel_id).await?;
        let message = platform.send_message(channel.id, &args.content).await?;
        Ok(format!(
            "Message sent successfully. Message ID: {}",
            message.id
        ))
    })
}

fn render_message(message: &Message) -> String {
    let mut line = format!(
        "{} ({}): {}",
        message.author.username,
        format_iso(&message.timestamp),
        message.content
    );
    if !message.reactions.is_empty() {
        let summary = message
            .reactions
            .iter()
            .map(|r| format!("{} x{}", r.emoji.display(), r.count))
            .collect::<Vec<_>>()
            .join(", ");
        line.push_str(&format!(" [reactions: {summary}]"));
    }
    line
}

pub(crate) fn read_messages<P: PlatformOperations>(platform: &P, arguments: Value) -> ToolFuture<'_> {
    Box::pin(async move {
        let args: ReadMessagesArgs = decode(arguments)?;
        let channel_id = parse_id(&args.channel_id, "channel_id")?;
        let limit = clamp_limit(args.limit, 50, MESSAGE_LIMIT_MAX);
        let channel = platform.fetch_channel(channel_id).await?;
        let messages = platform.channel_messages(channel.id, limit).await?;

        let mut out = format!(
            "Retrieved {} messages from #{}:",
            messages.len(),
            channel.name()
        );
        if !messages.is_empty() {
            out.push('\n');
        }
        for message in &messages {
            out.push('\n');
            out.push_str(&render_message(message));
        }
        Ok(out)
    })
}

pub(crate) fn add_reaction<P: PlatformOperations>(platform: &P, arguments: Value) -> ToolFuture<'_> {
    Box::pin(async move {
        let args: ReactionArgs = decode(arguments)?;
        let channel_id = parse_id(&args.channel_id, "channel_id")?;
        let message_id = parse_id(&args.message_id, "message_id")?;
        let channel = platform.fetch_channel(channel_id).await?;
        let message = platform.fetch_message(channel.id, message_id).await?;
        platform.add_reaction(channel.id, message.id, &args.emoji).await?;
        Ok(format!("Added reaction {} to message {}", args.emoji, message.id))
    })
}

pub(crate) fn add_multiple_reactions<P: PlatformOperations>(
    platform: &P,
    arguments: Value,
) -> ToolFuture<'_> {
    Box::pin(async move {
        let args: MultiReactionArgs = decode(arguments)?;
        if args.emojis.is_empty() {
            return Err(ToolError::InvalidArguments(
                "emojis must contain at least one entry".to_string(),
            ));
        }
        let channel_id = parse_id(&args.channel_id, "channel_id")?;
        let message_id = parse_id(&args.message_id, "message_id")?;
        let channel = platform.fetch_channel(channel_id).await?;
        let message = platform.fetch_message(channel.id, message_id).await?;
        for emoji in &args.emojis {
            platform.add_reaction(channel.id, message.id, emoji).await?;
        }
        Ok(format!(
            "Added reactions: {} to message {}",
            args.emojis.join(", "),
            message.id
        ))
    })
}

pub(crate) fn remove_reaction<P: PlatformOperations>(platform: &P, arguments: Value) -> ToolFuture<'_> {
    Box::pin(async move {
        let args: ReactionArgs = decode(arguments)?;
        let channel_id = parse_id(&args.channel_id, "channel_id")?;
        let message_id = parse_id(&args.message_id, "message_id")?;
        let channel = platform.fetch_channel(channel_id).await?;
        let message = platform.fetch_message(channel.id, message_id).await?;
        platform
            .remove_reaction(channel.id, message.id, &args.emoji)
            .await?;
        Ok(format!(
            "Removed reaction {} from message {}",
            args.emoji, message.id
        ))
    })
}

pub(crate) fn moderate_message<P: PlatformOperations>(platform: &P, arguments: Value) -> ToolFuture<'_> {
    Box::pin(async move {
        let args: ModerateMessageArgs = decode(arguments)?;
        let channel_id = parse_id(&args.channel_id, "channel_id")?;
        let message_id = parse_id(&args.message_id, "message_id")?;

        let channel = platform.fetch_channel(channel_id).await?;
        let message = platform.fetch_message(channel.id, message_id).await?;
        platform
            .delete_message(channel.id, message.id, Some(&args.reason))
            .await?;

        // The timeout only applies when the author still resolves as a guild
        // member; deleted-account or webhook authors skip it silently.
        let minutes = args.timeout_minutes.unwrap_or(0);
        if minutes > 0 {
            if let Some(guild_id) = channel.guild_id {
                if platform.fetch_member(guild_id, message.author.id).await.is_ok() {
                    platform
                        .timeout_member(guild_id, message.author.id, minutes, Some(&args.reason))
                        .await?;
                    return Ok(format!(
                        "Message {} deleted and user {} timed out for {} minutes.",
                        message.id, message.author.username, minutes
                    ));
                }
            }
        }
        Ok(format!("Message {} deleted successfully.", message.id))
    })
}

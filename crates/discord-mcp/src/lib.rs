//! Discord MCP server
//!
//! Exposes Discord server administration and messaging as MCP tools over
//! stdio JSON-RPC. The Discord connection runs as its own task (gateway +
//! REST, [`discord::DiscordPlatform`]); the request loop dispatches tool
//! calls against it through the [`platform::PlatformOperations`] boundary,
//! which also makes the whole dispatch layer testable with
//! [`platform::mock::MockPlatform`].

pub mod catalog;
pub mod discord;
pub mod dispatch;
pub mod format;
pub mod permissions;
pub mod platform;
pub mod server;
pub mod tools;

/// MCP protocol version.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Server name reported during the initialize handshake.
pub const SERVER_NAME: &str = "discord-mcp";

/// Server version.
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

pub use dispatch::{Dispatcher, ToolError};
pub use platform::{PlatformError, PlatformOperations, PlatformResult};
pub use server::McpServer;

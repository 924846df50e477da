//! Tool dispatch: registry lookup, readiness guard, error normalization.
//!
//! The registry maps tool names to handler function pointers and is built
//! once at server construction; dispatch itself holds no state across calls.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::platform::{PlatformError, PlatformOperations};

/// How long a dispatch waits for the session to come up before giving up.
/// Tolerates normal startup latency without hanging a caller indefinitely.
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(5);

/// Everything a tool call can fail with. All variants render as error text
/// to the caller; none escape the dispatch boundary as a protocol fault.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error("Discord client is not connected. Please check your DISCORD_TOKEN.")]
    NotConnected,
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    #[error(transparent)]
    Platform(#[from] PlatformError),
}

pub type ToolResult = Result<String, ToolError>;

/// Boxed handler future, borrowing the platform for the call's duration.
pub type ToolFuture<'a> = Pin<Box<dyn Future<Output = ToolResult> + Send + 'a>>;

/// One handler: takes the platform and the raw argument object.
pub type ToolHandler<P> = for<'a> fn(&'a P, Value) -> ToolFuture<'a>;

/// Name → handler table. Populated by [`crate::tools::registry`].
pub struct Registry<P> {
    handlers: HashMap<&'static str, ToolHandler<P>>,
}

impl<P: PlatformOperations> Registry<P> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, name: &'static str, handler: ToolHandler<P>) {
        debug_assert!(
            !self.handlers.contains_key(name),
            "duplicate tool handler: {name}"
        );
        self.handlers.insert(name, handler);
    }

    pub fn get(&self, name: &str) -> Option<&ToolHandler<P>> {
        self.handlers.get(name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.handlers.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<P: PlatformOperations> Default for Registry<P> {
    fn default() -> Self {
        Self::new()
    }
}

/// Routes invocations to handlers behind the readiness guard.
pub struct Dispatcher<P: PlatformOperations> {
    platform: Arc<P>,
    registry: Registry<P>,
    ready_timeout: Duration,
}

impl<P: PlatformOperations> Dispatcher<P> {
    pub fn new(platform: Arc<P>) -> Self {
        Self {
            platform,
            registry: crate::tools::registry(),
            ready_timeout: DEFAULT_READY_TIMEOUT,
        }
    }

    pub fn with_ready_timeout(mut self, timeout: Duration) -> Self {
        self.ready_timeout = timeout;
        self
    }

    pub fn registry(&self) -> &Registry<P> {
        &self.registry
    }

    pub fn platform(&self) -> &Arc<P> {
        &self.platform
    }

    /// Run one tool invocation.
    ///
    /// Lookup happens before the readiness guard so an unknown tool never
    /// touches the platform, even while disconnected.
    pub async fn dispatch(&self, name: &str, arguments: Value) -> ToolResult {
        let handler = self
            .registry
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        self.ensure_ready().await?;
        handler(self.platform.as_ref(), arguments).await
    }

    /// Bounded wait for the platform session to come up.
    async fn ensure_ready(&self) -> Result<(), ToolError> {
        if self.platform.is_ready() {
            return Ok(());
        }
        tokio::time::timeout(self.ready_timeout, self.platform.wait_until_ready())
            .await
            .map_err(|_| ToolError::NotConnected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::MockPlatform;
    use std::collections::BTreeSet;

    #[test]
    fn registry_names_match_catalog_names() {
        let registry = crate::tools::registry::<MockPlatform>();
        let registered: BTreeSet<String> =
            registry.names().iter().map(|n| n.to_string()).collect();
        let declared: BTreeSet<String> = crate::catalog::catalog()
            .iter()
            .map(|t| t.name.clone())
            .collect();

        let missing_handlers: Vec<_> = declared.difference(&registered).collect();
        let missing_descriptors: Vec<_> = registered.difference(&declared).collect();
        assert!(
            missing_handlers.is_empty() && missing_descriptors.is_empty(),
            "catalog/registry mismatch\n  no handler: {missing_handlers:?}\n  no descriptor: {missing_descriptors:?}"
        );
    }

    #[tokio::test]
    async fn unknown_tool_is_rejected_without_platform_calls() {
        let platform = Arc::new(MockPlatform::new());
        let dispatcher = Dispatcher::new(platform.clone());

        let err = dispatcher
            .dispatch("launch_rockets", serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(_)));
        assert!(err.to_string().contains("launch_rockets"));
        assert!(platform.calls().is_empty());
    }

    #[tokio::test]
    async fn not_ready_short_circuits_with_fixed_error() {
        let platform = Arc::new(MockPlatform::new());
        platform.set_ready(false);
        let dispatcher =
            Dispatcher::new(platform.clone()).with_ready_timeout(Duration::from_millis(20));

        let err = dispatcher
            .dispatch("list_servers", serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NotConnected));
        assert!(platform.calls().is_empty());
    }

    #[tokio::test]
    async fn ready_session_passes_the_guard_immediately() {
        let platform = Arc::new(MockPlatform::new());
        let dispatcher = Dispatcher::new(platform.clone());

        let text = dispatcher
            .dispatch("list_servers", serde_json::json!({}))
            .await
            .unwrap();
        assert!(text.contains("Test Guild"));
        assert_eq!(platform.calls_with_prefix("current_guilds"), 1);
    }
}

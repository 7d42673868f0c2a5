use async_trait::async_trait;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct ToolResult {
    pub content: String,
    pub is_error: bool,
}

impl ToolResult {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
        }
    }
}

impl std::fmt::Display for ToolResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.content)
    }
}

/// Per-turn context the agent loop injects before executing tools: the
/// current channel and chat. Tools needing an outbound destination (message,
/// spawn) read it from here rather than holding a reference to the loop.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    pub channel: String,
    pub chat_id: String,
}

impl ExecutionContext {
    pub fn new(channel: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            chat_id: chat_id.into(),
        }
    }
}

/// Uniform tool contract. `params` is a string-keyed map of JSON-compatible
/// values; errors meant for the model come back as `ToolResult::error`, while
/// a returned `Err` signals an unexpected runtime failure.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters(&self) -> Value; // JSON Schema

    async fn execute(&self, params: Value, ctx: &ExecutionContext) -> anyhow::Result<ToolResult>;

    /// Per-tool execution timeout. Overrides the registry-level default.
    fn execution_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(120)
    }
}

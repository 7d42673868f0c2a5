use crate::agent::tools::base::{ExecutionContext, Tool, ToolResult};
use crate::providers::base::ToolDefinition;
use anyhow::Result;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Registry of tools indexed by name. Execution runs each tool in a spawned
/// task so a timeout or panic is contained and surfaced to the model as an
/// error result instead of taking down the agent loop.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if name.is_empty() || name.len() > 256 || name.chars().any(char::is_control) {
            warn!("tool registry: rejecting tool with invalid name (len={})", name.len());
            return;
        }
        if self.tools.contains_key(&name) {
            warn!("tool registry: overwriting duplicate tool '{}'", name);
        }
        self.tools.insert(name, tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Sorted list of registered tool names.
    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn get_tool_definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<_> = self
            .tools
            .values()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.parameters(),
            })
            .collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Execute a tool with timeout enforcement and panic isolation.
    pub async fn execute(
        &self,
        name: &str,
        params: Value,
        ctx: &ExecutionContext,
    ) -> Result<ToolResult> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("Tool '{}' not found", name))?
            .clone();

        debug!(
            "executing tool: {} (channel={}) with arguments: {}",
            name, ctx.channel, params
        );

        let tool_name = name.to_string();
        let ctx = ctx.clone();
        let timeout = tool.execution_timeout();
        let timeout_secs = timeout.as_secs();

        let handle = tokio::task::spawn(async move {
            tokio::time::timeout(timeout, tool.execute(params, &ctx)).await
        });

        let result = match handle.await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => {
                warn!("tool '{}' timed out after {}s", tool_name, timeout_secs);
                Ok(ToolResult::error(format!(
                    "Tool '{}' timed out after {}s",
                    tool_name, timeout_secs
                )))
            }
            Err(join_err) => {
                if join_err.is_panic() {
                    // Extract the panic message so the model can avoid repeating the call
                    let payload = join_err.into_panic();
                    let panic_msg = payload
                        .downcast_ref::<String>()
                        .map(String::as_str)
                        .or_else(|| payload.downcast_ref::<&str>().copied())
                        .unwrap_or("unknown cause");
                    error!("tool '{}' panicked: {}", tool_name, panic_msg);
                    Ok(ToolResult::error(format!(
                        "Tool '{}' crashed: {}",
                        tool_name, panic_msg
                    )))
                } else {
                    Err(anyhow::anyhow!("Tool '{}' was cancelled", tool_name))
                }
            }
        }?;

        if result.is_error {
            warn!("tool '{}' returned error: {}", name, result.content);
        } else {
            info!("tool '{}' completed ({} chars)", name, result.content.len());
        }
        Ok(result)
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

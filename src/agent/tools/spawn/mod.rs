use crate::agent::tools::base::{ExecutionContext, Tool, ToolResult};
use crate::bus::OutboundMessage;
use crate::providers::base::{ChatRequest, LLMProvider, Message};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

const SUBAGENT_MAX_TOKENS: u32 = 4096;

/// Spawns a detached one-shot subagent: a background task that runs a single
/// provider chat over the given task and posts the result back to the
/// originating channel through the hub. The tool returns immediately.
pub struct SpawnTool {
    provider: Arc<dyn LLMProvider>,
    model: String,
    outbound_tx: mpsc::Sender<OutboundMessage>,
}

impl SpawnTool {
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        model: String,
        outbound_tx: mpsc::Sender<OutboundMessage>,
    ) -> Self {
        Self {
            provider,
            model,
            outbound_tx,
        }
    }
}

#[async_trait]
impl Tool for SpawnTool {
    fn name(&self) -> &str {
        "spawn"
    }

    fn description(&self) -> &str {
        "Spawn a background subagent to work on a task independently. The result is delivered to the current chat when done."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "task": {
                    "type": "string",
                    "description": "The task for the subagent to complete"
                }
            },
            "required": ["task"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ExecutionContext) -> Result<ToolResult> {
        let Some(task) = params["task"].as_str().filter(|t| !t.is_empty()) else {
            return Ok(ToolResult::error("spawn: 'task' argument required"));
        };
        if ctx.channel.is_empty() || ctx.chat_id.is_empty() {
            return Ok(ToolResult::error("spawn: no current channel/chat context"));
        }

        let provider = self.provider.clone();
        let model = self.model.clone();
        let outbound_tx = self.outbound_tx.clone();
        let channel = ctx.channel.clone();
        let chat_id = ctx.chat_id.clone();
        let task = task.to_string();

        tokio::spawn(async move {
            let messages = vec![
                Message::system(
                    "You are a background subagent. Complete the task and reply with a \
                     concise result. You have no tools; answer from reasoning alone.",
                ),
                Message::user(task.clone()),
            ];
            let result = provider
                .chat(ChatRequest {
                    messages,
                    tools: None,
                    model: Some(&model),
                    max_tokens: SUBAGENT_MAX_TOKENS,
                    temperature: 0.7,
                })
                .await;

            match result {
                Ok(response) => {
                    let content = response.content.unwrap_or_default();
                    if content.is_empty() {
                        warn!("subagent produced no content for task: {}", task);
                        return;
                    }
                    info!("subagent finished ({} chars)", content.len());
                    let out = OutboundMessage {
                        channel,
                        chat_id,
                        content: format!("[subagent] {}", content),
                    };
                    if outbound_tx.try_send(out).is_err() {
                        warn!("subagent result dropped: outbound channel full");
                    }
                }
                Err(e) => {
                    warn!("subagent failed: {}", e);
                }
            }
        });

        Ok(ToolResult::new("subagent spawned"))
    }
}

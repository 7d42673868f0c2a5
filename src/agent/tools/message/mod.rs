use crate::agent::tools::base::{ExecutionContext, Tool, ToolResult};
use crate::bus::OutboundMessage;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::mpsc;

/// Publishes an outbound message to the current conversation. Holds only the
/// hub's outbound sender; the destination `(channel, chat_id)` arrives via the
/// per-turn execution context, which keeps the tool free of any loop
/// reference.
pub struct MessageTool {
    outbound_tx: mpsc::Sender<OutboundMessage>,
}

impl MessageTool {
    pub fn new(outbound_tx: mpsc::Sender<OutboundMessage>) -> Self {
        Self { outbound_tx }
    }
}

#[async_trait]
impl Tool for MessageTool {
    fn name(&self) -> &str {
        "message"
    }

    fn description(&self) -> &str {
        "Send a message to the current channel/chat"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "content": {
                    "type": "string",
                    "description": "The message content to send"
                }
            },
            "required": ["content"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ExecutionContext) -> Result<ToolResult> {
        let content = match &params["content"] {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        };
        if content.is_empty() {
            return Ok(ToolResult::error("message: 'content' argument required"));
        }
        if ctx.channel.is_empty() || ctx.chat_id.is_empty() {
            return Ok(ToolResult::error("message: no current channel/chat context"));
        }

        let out = OutboundMessage {
            channel: ctx.channel.clone(),
            chat_id: ctx.chat_id.clone(),
            content,
        };
        // Non-blocking: a full queue is an explicit recoverable error
        match self.outbound_tx.try_send(out) {
            Ok(()) => Ok(ToolResult::new("sent")),
            Err(mpsc::error::TrySendError::Full(_)) => {
                Ok(ToolResult::error("outbound channel full"))
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                Ok(ToolResult::error("outbound channel closed"))
            }
        }
    }
}

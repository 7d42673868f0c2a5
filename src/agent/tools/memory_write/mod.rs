use crate::agent::memory::MemoryStore;
use crate::agent::tools::base::{ExecutionContext, Tool, ToolResult};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

/// Routes model-initiated memory writes to the store: `today` appends a
/// timestamped line to the daily note, `long` writes (or appends to) the
/// persistent `MEMORY.md`. Both also land in the in-process lists so the
/// ranker can see them immediately.
pub struct WriteMemoryTool {
    memory: Arc<MemoryStore>,
}

impl WriteMemoryTool {
    pub fn new(memory: Arc<MemoryStore>) -> Self {
        Self { memory }
    }
}

#[async_trait]
impl Tool for WriteMemoryTool {
    fn name(&self) -> &str {
        "write_memory"
    }

    fn description(&self) -> &str {
        "Write to memory. target 'today' appends to the daily note; target 'long' updates the long-term MEMORY.md"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "target": {
                    "type": "string",
                    "enum": ["today", "long"],
                    "description": "Which memory to write"
                },
                "content": {
                    "type": "string",
                    "description": "The text to remember"
                },
                "append": {
                    "type": "boolean",
                    "description": "For target=long: append instead of overwriting"
                }
            },
            "required": ["target", "content"]
        })
    }

    async fn execute(&self, params: Value, _ctx: &ExecutionContext) -> Result<ToolResult> {
        let Some(target) = params["target"].as_str() else {
            return Ok(ToolResult::error("write_memory: 'target' argument required"));
        };
        let Some(content) = params["content"].as_str().filter(|c| !c.is_empty()) else {
            return Ok(ToolResult::error(
                "write_memory: 'content' argument required",
            ));
        };
        let append = params["append"].as_bool().unwrap_or(false);

        match target {
            "today" => {
                if let Err(e) = self.memory.append_today(content) {
                    return Ok(ToolResult::error(format!("write_memory: {}", e)));
                }
                self.memory.add_short(content);
                Ok(ToolResult::new("memory written (today)"))
            }
            "long" => {
                let result = if append {
                    self.memory.read_long_term().and_then(|existing| {
                        let combined = if existing.is_empty() {
                            content.to_string()
                        } else {
                            format!("{}\n{}", existing.trim_end_matches('\n'), content)
                        };
                        self.memory.write_long_term(&combined)
                    })
                } else {
                    self.memory.write_long_term(content)
                };
                if let Err(e) = result {
                    return Ok(ToolResult::error(format!("write_memory: {}", e)));
                }
                self.memory.add_long(content);
                Ok(ToolResult::new("memory written (long)"))
            }
            other => Ok(ToolResult::error(format!(
                "write_memory: unknown target '{}' (expected 'today' or 'long')",
                other
            ))),
        }
    }
}

use crate::providers::base::{
    ChatRequest, LLMProvider, LLMResponse, Message, ToolCallRequest, ToolDefinition,
};
use crate::providers::errors::ProviderErrorHandler;
use crate::providers::retry::send_with_retry;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

const DEFAULT_API_BASE: &str = "https://api.anthropic.com/v1";
const DEFAULT_MODEL: &str = "claude-sonnet-4-5";
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    api_key: String,
    base_url: String,
    default_model: String,
    client: Client,
}

impl AnthropicProvider {
    pub fn new(
        api_key: String,
        api_base: Option<String>,
        default_model: Option<String>,
        request_timeout_s: u64,
    ) -> Self {
        let base = api_base.unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        Self {
            api_key,
            base_url: base.trim_end_matches('/').to_string(),
            default_model: default_model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            client: crate::providers::provider_http_client(request_timeout_s),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(api_key: String, base_url: String) -> Self {
        Self::new(api_key, Some(base_url), None, 10)
    }
}

/// Convert unified messages to the Messages-API shape.
/// The system prompt is hoisted out of the message list; tool results become
/// `role: "user"` entries holding a `tool_result` block.
fn convert_messages(messages: Vec<Message>) -> (Option<String>, Vec<Value>) {
    let mut system_parts = Vec::new();
    let mut wire = Vec::new();

    for msg in messages {
        match msg.role.as_str() {
            "system" => system_parts.push(msg.content),
            "user" => wire.push(json!({
                "role": "user",
                "content": [{"type": "text", "text": msg.content}],
            })),
            "assistant" => {
                let mut blocks = Vec::new();
                // The API rejects empty text blocks
                if !msg.content.is_empty() {
                    blocks.push(json!({"type": "text", "text": msg.content}));
                }
                if let Some(tool_calls) = msg.tool_calls {
                    for tc in tool_calls {
                        blocks.push(json!({
                            "type": "tool_use",
                            "id": tc.id,
                            "name": tc.name,
                            "input": tc.arguments,
                        }));
                    }
                }
                wire.push(json!({"role": "assistant", "content": blocks}));
            }
            "tool" => {
                if let Some(tool_call_id) = msg.tool_call_id {
                    let mut block = json!({
                        "type": "tool_result",
                        "tool_use_id": tool_call_id,
                        "content": msg.content,
                    });
                    if msg.is_error {
                        block["is_error"] = json!(true);
                    }
                    wire.push(json!({"role": "user", "content": [block]}));
                }
            }
            _ => {}
        }
    }

    let system = if system_parts.is_empty() {
        None
    } else {
        Some(system_parts.join("\n\n"))
    };
    (system, wire)
}

fn convert_tools(tools: Vec<ToolDefinition>) -> Vec<Value> {
    tools
        .into_iter()
        .map(|t| {
            json!({
                "name": t.name,
                "description": t.description,
                "input_schema": t.parameters,
            })
        })
        .collect()
}

/// Parse a Messages-API response. All `text` blocks are concatenated into the
/// unified content; each `tool_use` block lifts into a `ToolCallRequest`.
fn parse_response(json: &Value) -> LLMResponse {
    let mut content = String::new();
    let mut tool_calls = Vec::new();

    if let Some(blocks) = json["content"].as_array() {
        for block in blocks {
            match block["type"].as_str() {
                Some("text") => {
                    if let Some(text) = block["text"].as_str() {
                        content.push_str(text);
                    }
                }
                Some("tool_use") => {
                    tool_calls.push(ToolCallRequest {
                        id: block["id"].as_str().unwrap_or("").to_string(),
                        name: block["name"].as_str().unwrap_or("").to_string(),
                        arguments: block.get("input").cloned().unwrap_or_else(|| json!({})),
                    });
                }
                _ => {}
            }
        }
    }

    let content = content.trim().to_string();
    LLMResponse {
        content: if content.is_empty() { None } else { Some(content) },
        tool_calls,
    }
}

#[async_trait]
impl LLMProvider for AnthropicProvider {
    async fn chat(&self, req: ChatRequest<'_>) -> Result<LLMResponse> {
        if self.api_key.is_empty() {
            anyhow::bail!("Anthropic provider: API key is not configured");
        }
        let model = req.model.unwrap_or(&self.default_model);
        debug!("anthropic chat: model={}", model);

        let (system, messages) = convert_messages(req.messages);
        let mut payload = json!({
            "model": model,
            "messages": messages,
            "max_tokens": req.max_tokens,
        });
        if let Some(system) = system {
            payload["system"] = json!(system);
        }
        if let Some(tools) = req.tools {
            if !tools.is_empty() {
                payload["tools"] = Value::Array(convert_tools(tools));
            }
        }

        let url = format!("{}/messages", self.base_url);
        let resp = send_with_retry(|| {
            self.client
                .post(&url)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .header("content-type", "application/json")
                .json(&payload)
        })
        .await?;

        let json = ProviderErrorHandler::check_response(resp, "Anthropic").await?;
        Ok(parse_response(&json))
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }
}

use crate::providers::base::{
    ChatRequest, LLMProvider, LLMResponse, Message, ToolCallRequest, ToolDefinition,
};
use crate::providers::errors::ProviderErrorHandler;
use crate::providers::retry::send_with_retry;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o";

/// Provider speaking the OpenAI chat-completions wire shape. Also covers any
/// compatible backend reachable through a custom `api_base`.
pub struct OpenAIProvider {
    api_key: String,
    base_url: String,
    default_model: String,
    client: Client,
}

impl OpenAIProvider {
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

/// Convert unified messages to the chat-completions wire shape.
/// `tool_calls.function.arguments` is a JSON string on this wire, so the
/// unified arguments map is re-serialized when echoed back.
fn convert_messages(messages: Vec<Message>) -> Vec<Value> {
    messages
        .into_iter()
        .map(|msg| {
            let mut m = json!({
                "role": msg.role,
                "content": msg.content,
            });
            if let Some(tool_calls) = msg.tool_calls {
                m["tool_calls"] = json!(tool_calls
                    .into_iter()
                    .map(|tc| {
                        let args_str = serde_json::to_string(&tc.arguments)
                            .unwrap_or_else(|_| "{}".to_string());
                        json!({
                            "id": tc.id,
                            "type": "function",
                            "function": {"name": tc.name, "arguments": args_str},
                        })
                    })
                    .collect::<Vec<_>>());
            }
            if let Some(tool_call_id) = msg.tool_call_id {
                m["tool_call_id"] = json!(tool_call_id);
            }
            m
        })
        .collect()
}

fn convert_tools(tools: Vec<ToolDefinition>) -> Vec<Value> {
    tools
        .into_iter()
        .map(|t| {
            json!({
                "type": "function",
                "function": {
                    "name": t.name,
                    "description": t.description,
                    "parameters": t.parameters,
                },
            })
        })
        .collect()
}

/// Parse `choices[0].message`, decoding each tool call's embedded
/// JSON-string arguments into the unified arguments map.
fn parse_response(json: &Value) -> Result<LLMResponse> {
    let choice = json["choices"]
        .as_array()
        .and_then(|arr| arr.first())
        .context("No choices in OpenAI response")?;

    let message = &choice["message"];
    let content = message["content"]
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(std::string::ToString::to_string);

    let mut tool_calls = Vec::new();
    if let Some(raw_calls) = message["tool_calls"].as_array() {
        for tc in raw_calls {
            if let Some(function) = tc["function"].as_object() {
                let arguments = function
                    .get("arguments")
                    .and_then(Value::as_str)
                    .and_then(|s| serde_json::from_str(s).ok())
                    .unwrap_or_else(|| json!({}));
                tool_calls.push(ToolCallRequest {
                    id: tc["id"].as_str().unwrap_or("").to_string(),
                    name: function
                        .get("name")
                        .and_then(Value::as_str)
                        .unwrap_or("")
                        .to_string(),
                    arguments,
                });
            }
        }
    }

    Ok(LLMResponse {
        content,
        tool_calls,
    })
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    async fn chat(&self, req: ChatRequest<'_>) -> Result<LLMResponse> {
        if self.api_key.is_empty() {
            anyhow::bail!("OpenAI provider: API key is not configured");
        }
        let model = req.model.unwrap_or(&self.default_model);
        debug!("openai chat: model={}", model);

        let mut payload = json!({
            "model": model,
            "messages": convert_messages(req.messages),
            "max_tokens": req.max_tokens,
            "temperature": req.temperature,
        });
        if let Some(tools) = req.tools {
            if !tools.is_empty() {
                payload["tools"] = Value::Array(convert_tools(tools));
            }
        }

        let url = format!("{}/chat/completions", self.base_url);
        let resp = send_with_retry(|| {
            self.client
                .post(&url)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("Content-Type", "application/json")
                .json(&payload)
        })
        .await?;

        let json = ProviderErrorHandler::check_response(resp, "OpenAI").await?;
        parse_response(&json)
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }
}

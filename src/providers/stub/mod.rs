use crate::providers::base::{ChatRequest, LLMProvider, LLMResponse};
use anyhow::Result;
use async_trait::async_trait;

/// Deterministic offline provider used when no API key is configured, and in
/// tests. Echoes the last user message and never emits tool calls.
pub struct StubProvider;

impl StubProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StubProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LLMProvider for StubProvider {
    async fn chat(&self, req: ChatRequest<'_>) -> Result<LLMResponse> {
        let last_user = req
            .messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.clone())
            .unwrap_or_default();
        Ok(LLMResponse {
            content: Some(format!("echo: {}", last_user)),
            tool_calls: vec![],
        })
    }

    fn default_model(&self) -> &str {
        "stub"
    }
}

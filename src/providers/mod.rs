pub mod anthropic;
pub mod base;
pub mod errors;
pub mod openai;
pub mod retry;
pub mod stub;

use crate::config::Config;
use base::LLMProvider;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Connect timeout for LLM provider HTTP clients (seconds).
pub(crate) const PROVIDER_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Build a `reqwest::Client` with the standard connect timeout and the
/// configured overall request timeout.
pub(crate) fn provider_http_client(request_timeout_s: u64) -> Client {
    Client::builder()
        .connect_timeout(Duration::from_secs(PROVIDER_CONNECT_TIMEOUT_SECS))
        .timeout(Duration::from_secs(request_timeout_s.max(1)))
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Select a provider from config.
///
/// Rules: a `claude-` model with an Anthropic key goes to Anthropic; otherwise
/// an OpenAI-compatible key wins; otherwise an Anthropic key alone wins; with
/// no keys at all the deterministic stub is used (operational but degraded).
pub fn create_provider(config: &Config) -> Arc<dyn LLMProvider> {
    let defaults = &config.agents.defaults;
    let anthropic = &config.providers.anthropic;
    let openai = &config.providers.openai;

    let model = if defaults.model.is_empty() {
        None
    } else {
        Some(defaults.model.clone())
    };

    if defaults.model.starts_with("claude-") && !anthropic.api_key.is_empty() {
        info!("using Anthropic provider (model prefix match)");
        return Arc::new(anthropic::AnthropicProvider::new(
            anthropic.api_key.clone(),
            anthropic.api_base.clone(),
            model,
            defaults.request_timeout_s,
        ));
    }
    if !openai.api_key.is_empty() {
        info!("using OpenAI-compatible provider");
        return Arc::new(openai::OpenAIProvider::new(
            openai.api_key.clone(),
            openai.api_base.clone(),
            model,
            defaults.request_timeout_s,
        ));
    }
    if !anthropic.api_key.is_empty() {
        info!("using Anthropic provider");
        return Arc::new(anthropic::AnthropicProvider::new(
            anthropic.api_key.clone(),
            anthropic.api_base.clone(),
            model,
            defaults.request_timeout_s,
        ));
    }
    info!("no provider API key configured, using stub provider");
    Arc::new(stub::StubProvider::new())
}

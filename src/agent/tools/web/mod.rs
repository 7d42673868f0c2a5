use crate::agent::tools::base::{ExecutionContext, Tool, ToolResult};
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

const FETCH_TIMEOUT_SECS: u64 = 30;

/// Substrings marking local or private network destinations. Matching is on
/// the URL text, which is intentionally coarse: it cannot see what a hostname
/// resolves to, and a literal like `10.` in a path can false-positive.
const BLOCKED_PATTERNS: &[&str] = &[
    "localhost",
    "127.0.0.1",
    "::1",
    "10.",
    "192.168.",
    "172.16.",
    "169.254.",
];

fn is_blocked_url(url: &str) -> bool {
    let lower = url.to_lowercase();
    BLOCKED_PATTERNS.iter().any(|p| lower.contains(p))
}

/// HTTP GET for a URL, with a coarse SSRF guard over the URL text.
pub struct WebTool {
    client: Client,
}

impl WebTool {
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }
}

impl Default for WebTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for WebTool {
    fn name(&self) -> &str {
        "web"
    }

    fn description(&self) -> &str {
        "Fetch web content from a URL"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "The URL to fetch (must be http or https)"
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, params: Value, _ctx: &ExecutionContext) -> Result<ToolResult> {
        let Some(url) = params["url"].as_str().filter(|u| !u.is_empty()) else {
            return Ok(ToolResult::error("web: 'url' argument required"));
        };

        if is_blocked_url(url) {
            return Ok(ToolResult::error(
                "web: access to local or private network addresses is disallowed",
            ));
        }

        let resp = match self.client.get(url).send().await {
            Ok(resp) => resp,
            Err(e) => return Ok(ToolResult::error(format!("web: request failed: {}", e))),
        };

        let status = resp.status();
        match resp.text().await {
            Ok(body) => {
                if status.is_success() {
                    Ok(ToolResult::new(body))
                } else {
                    Ok(ToolResult::error(format!("web: HTTP {}: {}", status, body)))
                }
            }
            Err(e) => Ok(ToolResult::error(format!("web: failed to read body: {}", e))),
        }
    }
}

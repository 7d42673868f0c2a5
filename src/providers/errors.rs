use crate::errors::PicobotError;
use serde_json::Value;
use tracing::warn;

/// Shared HTTP-response handling for LLM providers.
pub struct ProviderErrorHandler;

impl ProviderErrorHandler {
    /// Parse an API error body and return a typed error.
    pub fn parse_api_error(status: u16, error_text: &str) -> PicobotError {
        let retryable = matches!(status, 500 | 502 | 503 | 504);

        if let Ok(error_json) = serde_json::from_str::<Value>(error_text) {
            if let Some(err) = error_json.get("error") {
                let error_type = err
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown");
                let error_msg = err
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("Unknown error");
                return PicobotError::Provider {
                    message: format!("API error ({}): {}", error_type, error_msg),
                    retryable,
                };
            }
        }

        PicobotError::Provider {
            message: format!("API error ({}): {}", status, error_text),
            retryable,
        }
    }

    /// Check an HTTP response for errors (rate limit, auth, generic API
    /// errors). Returns the body as JSON on success, a typed error otherwise.
    pub async fn check_response(resp: reqwest::Response, provider: &str) -> anyhow::Result<Value> {
        let status = resp.status();
        if !status.is_success() {
            let retry_after = resp
                .headers()
                .get("retry-after")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok());
            let error_text = resp
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());

            if status.as_u16() == 429 {
                warn!("{}: rate limit hit (retry-after: {:?})", provider, retry_after);
                return Err(PicobotError::RateLimit { retry_after }.into());
            }
            if matches!(status.as_u16(), 401 | 403) {
                warn!("{}: authentication failed: {}", provider, error_text);
                return Err(PicobotError::Auth(format!(
                    "Authentication failed. Check your API key. Error: {}",
                    error_text
                ))
                .into());
            }
            warn!("{}: API error {}: {}", provider, status, error_text);
            return Err(Self::parse_api_error(status.as_u16(), &error_text).into());
        }

        let json: Value = resp
            .json()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to parse {} API response: {}", provider, e))?;

        // Some backends report errors in a 200 body
        if let Some(error_val) = json.get("error") {
            if !error_val.is_null() {
                let error_text = serde_json::to_string(error_val)
                    .unwrap_or_else(|_| "Unknown error".to_string());
                warn!("{}: API error in response body: {}", provider, error_text);
                return Err(Self::parse_api_error(200, &error_text).into());
            }
        }

        Ok(json)
    }
}

use thiserror::Error;

/// Typed error hierarchy for picobot.
///
/// Use at module boundaries (provider calls, tool execution, config validation,
/// channels). Internal/leaf functions can continue using `anyhow::Result` — the
/// `Internal` variant allows seamless conversion via the `?` operator.
#[derive(Debug, Error)]
pub enum PicobotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Provider error: {message}")]
    Provider { message: String, retryable: bool },

    #[error("Rate limit exceeded")]
    RateLimit { retry_after: Option<u64> },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Tool error: {tool}: {message}")]
    Tool { tool: String, message: String },

    #[error("Channel error: {channel}: {message}")]
    Channel { channel: String, message: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl PicobotError {
    /// Whether this error is retryable (rate limits, transient provider errors).
    pub fn is_retryable(&self) -> bool {
        match self {
            PicobotError::RateLimit { .. } => true,
            PicobotError::Provider { retryable, .. } => *retryable,
            _ => false,
        }
    }
}

use crate::bus::OutboundMessage;
use async_trait::async_trait;

/// Contract for a channel adapter: push inbound envelopes onto the hub on
/// `start`, deliver outbound envelopes on `send`.
#[async_trait]
pub trait BaseChannel: Send + Sync {
    fn name(&self) -> &str;

    async fn start(&mut self) -> anyhow::Result<()>;
    async fn stop(&mut self) -> anyhow::Result<()>;
    async fn send(&self, msg: &OutboundMessage) -> anyhow::Result<()>;
}

/// Split text into chunks of at most `limit` bytes, breaking at the last
/// newline within the window when possible. Hard cuts respect UTF-8 character
/// boundaries.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    if limit == 0 || text.len() <= limit {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut remaining = text;
    while remaining.len() > limit {
        let window_end = floor_char_boundary(remaining, limit);
        let cut = match remaining[..window_end].rfind('\n') {
            Some(idx) if idx > 0 => idx + 1,
            _ => window_end,
        };
        chunks.push(remaining[..cut].to_string());
        remaining = &remaining[cut..];
    }
    if !remaining.is_empty() {
        chunks.push(remaining.to_string());
    }
    chunks
}

/// Largest index `<= max` that falls on a char boundary.
fn floor_char_boundary(s: &str, max: usize) -> usize {
    let mut idx = max.min(s.len());
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

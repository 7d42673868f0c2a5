use crate::bus::{InboundMessage, OutboundMessage};
use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::debug;

const DEFAULT_INBOUND_CAPACITY: usize = 100;
const DEFAULT_OUTBOUND_CAPACITY: usize = 100;

/// The message hub: a pair of bounded queues carrying typed envelopes between
/// channel adapters and the agent loop.
///
/// Channel adapters block on a full `In` queue (natural backpressure); the
/// heartbeat ticker and all `Out` publishers use non-blocking sends so that a
/// stalled consumer never wedges a producer — overload surfaces as an explicit
/// "queue full" error instead.
pub struct MessageBus {
    pub inbound_tx: mpsc::Sender<InboundMessage>,
    inbound_rx: Option<mpsc::Receiver<InboundMessage>>,
    pub outbound_tx: mpsc::Sender<OutboundMessage>,
    outbound_rx: Option<mpsc::Receiver<OutboundMessage>>,
}

impl MessageBus {
    pub fn new(inbound_capacity: usize, outbound_capacity: usize) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::channel(inbound_capacity.max(1));
        let (outbound_tx, outbound_rx) = mpsc::channel(outbound_capacity.max(1));
        Self {
            inbound_tx,
            inbound_rx: Some(inbound_rx),
            outbound_tx,
            outbound_rx: Some(outbound_rx),
        }
    }

    /// Extract the inbound receiver. The agent loop is the single consumer;
    /// calling this twice returns `None`.
    pub fn take_inbound_rx(&mut self) -> Option<mpsc::Receiver<InboundMessage>> {
        self.inbound_rx.take()
    }

    /// Extract the outbound receiver for the channel dispatcher.
    pub fn take_outbound_rx(&mut self) -> Option<mpsc::Receiver<OutboundMessage>> {
        self.outbound_rx.take()
    }

    /// Blocking publish used by channel adapters. Waits when the queue is full.
    pub async fn publish_inbound(&self, msg: InboundMessage) -> Result<()> {
        let channel = msg.channel.clone();
        let sender_id = msg.sender_id.clone();
        self.inbound_tx
            .send(msg)
            .await
            .context("inbound queue closed")?;
        debug!(
            "inbound message queued: channel={}, sender={}",
            channel, sender_id
        );
        Ok(())
    }

    /// Non-blocking publish used by the heartbeat ticker. A full queue means
    /// "skip this tick", not "wait".
    pub fn try_publish_inbound(&self, msg: InboundMessage) -> Result<()> {
        self.inbound_tx.try_send(msg).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => anyhow::anyhow!("inbound queue full"),
            mpsc::error::TrySendError::Closed(_) => anyhow::anyhow!("inbound queue closed"),
        })
    }

    /// Non-blocking publish for outbound replies. Reports "outbound channel
    /// full" as a recoverable error so callers can surface it without blocking
    /// the agent loop.
    pub fn try_publish_outbound(&self, msg: OutboundMessage) -> Result<()> {
        let channel = msg.channel.clone();
        let chat_id = msg.chat_id.clone();
        self.outbound_tx.try_send(msg).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => anyhow::anyhow!("outbound channel full"),
            mpsc::error::TrySendError::Closed(_) => anyhow::anyhow!("outbound channel closed"),
        })?;
        debug!(
            "outbound message queued: channel={}, chat_id={}",
            channel, chat_id
        );
        Ok(())
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new(DEFAULT_INBOUND_CAPACITY, DEFAULT_OUTBOUND_CAPACITY)
    }
}

#[cfg(test)]
mod tests;

use crate::bus::{InboundMessage, OutboundMessage};
use crate::channels::base::BaseChannel;
use crate::channels::cli::CliChannel;
use crate::channels::telegram::TelegramChannel;
use crate::config::Config;
use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Owns the enabled channel adapters and routes outbound envelopes to the
/// adapter matching each message's channel tag.
pub struct ChannelManager {
    channels: Vec<Box<dyn BaseChannel>>,
}

impl ChannelManager {
    pub fn new(config: &Config, inbound_tx: mpsc::Sender<InboundMessage>) -> Self {
        let mut channels: Vec<Box<dyn BaseChannel>> = Vec::new();

        if config.channels.telegram.enabled && !config.channels.telegram.token.is_empty() {
            channels.push(Box::new(TelegramChannel::new(
                config.channels.telegram.clone(),
                inbound_tx.clone(),
            )));
            info!("telegram channel enabled");
        } else if config.channels.telegram.enabled {
            warn!("telegram enabled in config but no token configured, skipping");
        }

        if config.channels.cli.enabled {
            channels.push(Box::new(CliChannel::new(inbound_tx)));
            info!("cli channel enabled");
        }

        Self { channels }
    }

    #[cfg(test)]
    pub(crate) fn with_channels(channels: Vec<Box<dyn BaseChannel>>) -> Self {
        Self { channels }
    }

    pub fn enabled_channels(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.name()).collect()
    }

    pub async fn start_all(&mut self) -> Result<()> {
        for channel in &mut self.channels {
            channel
                .start()
                .await
                .map_err(|e| anyhow::anyhow!("failed to start channel {}: {}", channel.name(), e))?;
            info!("channel {} started", channel.name());
        }
        Ok(())
    }

    pub async fn stop_all(&mut self) {
        for channel in &mut self.channels {
            if let Err(e) = channel.stop().await {
                warn!("error stopping channel {}: {}", channel.name(), e);
            }
        }
    }

    /// Deliver an outbound envelope through its channel adapter.
    pub async fn send(&self, msg: &OutboundMessage) -> Result<()> {
        for channel in &self.channels {
            if channel.name() == msg.channel {
                return channel.send(msg).await;
            }
        }
        Err(anyhow::anyhow!(
            "no channel adapter for '{}' (enabled: {:?})",
            msg.channel,
            self.enabled_channels()
        ))
    }

    /// Drain the outbound queue, dispatching each envelope. Runs until the
    /// queue closes. Delivery failures are logged, never fatal.
    pub async fn run_outbound_dispatcher(&self, mut outbound_rx: mpsc::Receiver<OutboundMessage>) {
        info!("outbound dispatcher started");
        while let Some(msg) = outbound_rx.recv().await {
            if let Err(e) = self.send(&msg).await {
                warn!("outbound delivery failed: {}", e);
            }
        }
        info!("outbound dispatcher stopped");
    }
}

#[cfg(test)]
mod tests;

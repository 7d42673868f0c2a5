use super::*;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct MockChannel {
    channel_name: String,
    sent: Arc<AtomicUsize>,
}

impl MockChannel {
    fn new(name: &str) -> (Self, Arc<AtomicUsize>) {
        let sent = Arc::new(AtomicUsize::new(0));
        (
            Self {
                channel_name: name.to_string(),
                sent: sent.clone(),
            },
            sent,
        )
    }
}

#[async_trait]
impl BaseChannel for MockChannel {
    fn name(&self) -> &str {
        &self.channel_name
    }
    async fn start(&mut self) -> Result<()> {
        Ok(())
    }
    async fn stop(&mut self) -> Result<()> {
        Ok(())
    }
    async fn send(&self, _msg: &OutboundMessage) -> Result<()> {
        self.sent.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn outbound(channel: &str) -> OutboundMessage {
    OutboundMessage {
        channel: channel.into(),
        chat_id: "c1".into(),
        content: "hello".into(),
    }
}

#[tokio::test]
async fn send_routes_by_channel_name() {
    let (tg, tg_sent) = MockChannel::new("telegram");
    let (cli, cli_sent) = MockChannel::new("cli");
    let mgr = ChannelManager::with_channels(vec![Box::new(tg), Box::new(cli)]);

    mgr.send(&outbound("telegram")).await.unwrap();
    mgr.send(&outbound("telegram")).await.unwrap();
    mgr.send(&outbound("cli")).await.unwrap();

    assert_eq!(tg_sent.load(Ordering::SeqCst), 2);
    assert_eq!(cli_sent.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn send_without_matching_channel_errors() {
    let mgr = ChannelManager::with_channels(vec![]);
    let err = mgr.send(&outbound("telegram")).await.unwrap_err();
    assert!(err.to_string().contains("no channel adapter"));
}

#[tokio::test]
async fn dispatcher_drains_queue() {
    let (cli, cli_sent) = MockChannel::new("cli");
    let mgr = ChannelManager::with_channels(vec![Box::new(cli)]);

    let (tx, rx) = mpsc::channel(10);
    tx.send(outbound("cli")).await.unwrap();
    tx.send(outbound("cli")).await.unwrap();
    // Unroutable message is logged, not fatal
    tx.send(outbound("ghost")).await.unwrap();
    drop(tx);

    mgr.run_outbound_dispatcher(rx).await;
    assert_eq!(cli_sent.load(Ordering::SeqCst), 2);
}

#[test]
fn manager_from_config_respects_flags() {
    let mut config = Config::default();
    config.channels.cli.enabled = true;
    config.channels.telegram.enabled = true; // no token -> skipped

    let bus = crate::bus::MessageBus::new(10, 10);
    let mgr = ChannelManager::new(&config, bus.inbound_tx.clone());
    assert_eq!(mgr.enabled_channels(), vec!["cli"]);
}

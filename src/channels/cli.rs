use crate::bus::{InboundMessage, OutboundMessage};
use crate::channels::base::BaseChannel;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tracing::info;

/// Terminal adapter: stdin lines become inbound messages, replies print to
/// stdout. The chat is a single fixed conversation.
pub struct CliChannel {
    inbound_tx: mpsc::Sender<InboundMessage>,
    running: Arc<AtomicBool>,
}

impl CliChannel {
    pub fn new(inbound_tx: mpsc::Sender<InboundMessage>) -> Self {
        Self {
            inbound_tx,
            running: Arc::new(AtomicBool::new(false)),
        }
    }
}

#[async_trait]
impl BaseChannel for CliChannel {
    fn name(&self) -> &str {
        "cli"
    }

    async fn start(&mut self) -> Result<()> {
        self.running.store(true, Ordering::SeqCst);
        let inbound_tx = self.inbound_tx.clone();
        let running = self.running.clone();

        tokio::spawn(async move {
            info!("cli channel reading stdin");
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            let mut lines = stdin.lines();
            while running.load(Ordering::SeqCst) {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim().to_string();
                        if line.is_empty() {
                            continue;
                        }
                        let msg = InboundMessage::new("cli", "user", "default", line);
                        if inbound_tx.send(msg).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) | Err(_) => break,
                }
            }
            info!("cli channel stopped reading stdin");
        });
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn send(&self, msg: &OutboundMessage) -> Result<()> {
        println!("{}", msg.content);
        Ok(())
    }
}

use crate::bus::InboundMessage;
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const HEARTBEAT_PREFIX: &str =
    "[HEARTBEAT CHECK] Review and execute any pending tasks from HEARTBEAT.md:\n\n";

/// Periodic ticker that reads `<workspace>/HEARTBEAT.md` and injects its
/// content as a synthetic inbound message. A missing or empty file skips the
/// tick, and so does a full inbound queue — the heartbeat never blocks the
/// hub.
pub struct HeartbeatService {
    workspace: PathBuf,
    inbound_tx: mpsc::Sender<InboundMessage>,
    interval_s: u64,
    running: Arc<tokio::sync::Mutex<bool>>,
}

impl HeartbeatService {
    pub fn new(workspace: PathBuf, inbound_tx: mpsc::Sender<InboundMessage>, interval_s: u64) -> Self {
        Self {
            workspace,
            inbound_tx,
            interval_s: interval_s.max(1),
            running: Arc::new(tokio::sync::Mutex::new(false)),
        }
    }

    /// Build the synthetic inbound message for one tick, or `None` when the
    /// strategy file is missing or empty.
    fn tick_message(workspace: &std::path::Path) -> Option<InboundMessage> {
        let path = workspace.join("HEARTBEAT.md");
        let content = std::fs::read_to_string(path).ok()?;
        let content = content.trim();
        if content.is_empty() {
            return None;
        }
        Some(InboundMessage::new(
            "heartbeat",
            "heartbeat",
            "system",
            format!("{}{}", HEARTBEAT_PREFIX, content),
        ))
    }

    pub async fn start(&self) {
        *self.running.lock().await = true;
        let running = self.running.clone();
        let workspace = self.workspace.clone();
        let inbound_tx = self.inbound_tx.clone();
        let interval = self.interval_s;

        tokio::spawn(async move {
            info!("heartbeat started (every {}s)", interval);
            loop {
                tokio::time::sleep(std::time::Duration::from_secs(interval)).await;
                if !*running.lock().await {
                    info!("heartbeat stopping");
                    break;
                }

                let Some(msg) = Self::tick_message(&workspace) else {
                    debug!("heartbeat: nothing to do this tick");
                    continue;
                };

                // Non-blocking: a busy hub means this tick is dropped
                match inbound_tx.try_send(msg) {
                    Ok(()) => info!("heartbeat: tasks queued for the agent"),
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        warn!("heartbeat: hub busy, skipping tick");
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        info!("heartbeat: hub closed, stopping");
                        break;
                    }
                }
            }
        });
    }

    pub async fn stop(&self) -> Result<()> {
        *self.running.lock().await = false;
        Ok(())
    }
}

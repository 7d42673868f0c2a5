use crate::bus::{InboundMessage, OutboundMessage};
use crate::channels::base::{split_message, BaseChannel};
use crate::config::TelegramConfig;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const TELEGRAM_API_BASE: &str = "https://api.telegram.org/bot";
/// Long-poll wait passed to getUpdates.
const POLL_TIMEOUT_SECS: u64 = 30;
/// The poll client must outlive the server-side long-poll window.
const HTTP_TIMEOUT_SECS: u64 = 45;
const SEND_TIMEOUT_SECS: u64 = 15;
/// Telegram's hard cap on message length.
const MAX_MESSAGE_LEN: usize = 4096;
const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(5);
const DECODE_ERROR_BACKOFF: Duration = Duration::from_secs(2);

#[derive(Debug, Deserialize)]
struct GetUpdatesResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    result: Vec<Update>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    message: Option<TgMessage>,
}

#[derive(Debug, Deserialize)]
struct TgMessage {
    from: Option<TgUser>,
    chat: TgChat,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TgUser {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct TgChat {
    id: i64,
}

/// Telegram adapter: long-polls `getUpdates` with an advancing offset and
/// delivers replies via `sendMessage`, chunked at the API's 4096-char limit.
///
/// An empty `allow_from` list denies all senders; talking to the bot requires
/// explicitly listing user IDs.
pub struct TelegramChannel {
    config: TelegramConfig,
    base_url: String,
    inbound_tx: mpsc::Sender<InboundMessage>,
    poll_client: Client,
    send_client: Client,
    running: Arc<AtomicBool>,
}

impl TelegramChannel {
    pub fn new(config: TelegramConfig, inbound_tx: mpsc::Sender<InboundMessage>) -> Self {
        let base_url = format!("{}{}", TELEGRAM_API_BASE, config.token);
        Self::with_base_url(config, inbound_tx, base_url)
    }

    /// Point the adapter at a custom API base (test servers).
    pub fn with_base_url(
        config: TelegramConfig,
        inbound_tx: mpsc::Sender<InboundMessage>,
        base_url: String,
    ) -> Self {
        Self {
            config,
            base_url,
            inbound_tx,
            poll_client: Client::builder()
                .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
                .build()
                .unwrap_or_else(|_| Client::new()),
            send_client: Client::builder()
                .timeout(Duration::from_secs(SEND_TIMEOUT_SECS))
                .build()
                .unwrap_or_else(|_| Client::new()),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    async fn poll_loop(
        client: Client,
        base_url: String,
        inbound_tx: mpsc::Sender<InboundMessage>,
        allowed: HashSet<String>,
        running: Arc<AtomicBool>,
    ) {
        info!("telegram: starting inbound polling");
        let mut offset: i64 = 0;
        while running.load(Ordering::SeqCst) {
            let form = [
                ("offset", offset.to_string()),
                ("timeout", POLL_TIMEOUT_SECS.to_string()),
            ];
            let resp = client
                .post(format!("{}/getUpdates", base_url))
                .form(&form)
                .send()
                .await;
            let resp = match resp {
                Ok(resp) => resp,
                Err(e) => {
                    warn!("telegram getUpdates error: {}", e);
                    tokio::time::sleep(POLL_ERROR_BACKOFF).await;
                    continue;
                }
            };
            let updates: GetUpdatesResponse = match resp.json().await {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!("telegram: invalid getUpdates response: {}", e);
                    tokio::time::sleep(DECODE_ERROR_BACKOFF).await;
                    continue;
                }
            };
            if !updates.ok {
                warn!("telegram: getUpdates returned ok=false");
                tokio::time::sleep(POLL_ERROR_BACKOFF).await;
                continue;
            }

            for update in updates.result {
                if update.update_id >= offset {
                    offset = update.update_id + 1;
                }
                let Some(message) = update.message else {
                    continue;
                };
                let Some(text) = message.text else {
                    continue;
                };
                let sender_id = message
                    .from
                    .map(|u| u.id.to_string())
                    .unwrap_or_default();

                // Empty allowlist means deny all; unauthorized senders dropped
                if allowed.is_empty() {
                    warn!(
                        "telegram: dropping message from user {}: no authorized users configured",
                        sender_id
                    );
                    continue;
                }
                if !allowed.contains(&sender_id) {
                    warn!("telegram: dropping message from unauthorized user {}", sender_id);
                    continue;
                }

                let chat_id = message.chat.id.to_string();
                debug!("telegram: received message from {}, routing to hub", sender_id);
                let inbound = InboundMessage::new("telegram", sender_id, chat_id, text);
                if inbound_tx.send(inbound).await.is_err() {
                    info!("telegram: hub closed, stopping polling");
                    return;
                }
            }
        }
        info!("telegram: inbound polling stopped");
    }
}

#[async_trait]
impl BaseChannel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn start(&mut self) -> Result<()> {
        if self.config.token.is_empty() {
            anyhow::bail!("telegram token not provided");
        }
        self.running.store(true, Ordering::SeqCst);
        tokio::spawn(Self::poll_loop(
            self.poll_client.clone(),
            self.base_url.clone(),
            self.inbound_tx.clone(),
            self.config.allow_from.iter().cloned().collect(),
            self.running.clone(),
        ));
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn send(&self, msg: &OutboundMessage) -> Result<()> {
        for chunk in split_message(&msg.content, MAX_MESSAGE_LEN) {
            let form = [("chat_id", msg.chat_id.clone()), ("text", chunk)];
            let resp = self
                .send_client
                .post(format!("{}/sendMessage", self.base_url))
                .form(&form)
                .send()
                .await?;
            if !resp.status().is_success() {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                anyhow::bail!("telegram sendMessage failed: {} {}", status, body);
            }
        }
        Ok(())
    }
}

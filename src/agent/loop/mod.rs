use crate::agent::context::ContextBuilder;
use crate::agent::memory::{LLMMemoryRanker, MemoryStore};
use crate::agent::tools::base::ExecutionContext;
use crate::agent::tools::{exec, filesystem, memory_write, message, skills, spawn, web};
use crate::agent::tools::ToolRegistry;
use crate::bus::{InboundMessage, MessageBus, OutboundMessage};
use crate::providers::base::{ChatRequest, LLMProvider, Message, ToolCallRequest};
use anyhow::Result;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, warn};

/// Rolling history entries kept per conversation.
const MAX_HISTORY_ENTRIES: usize = 50;
/// Memories fed to the ranker each turn.
const RECENT_MEMORY_WINDOW: usize = 50;

const PROVIDER_FAILURE_REPLY: &str =
    "I ran into a problem talking to the language model; please try again.";
const ITERATION_LIMIT_REPLY: &str =
    "I reached the tool-iteration limit for this request. Here is where I got to; ask me to continue if needed.";

/// Configuration for constructing an [`AgentLoop`].
pub struct AgentLoopConfig {
    pub bus: Arc<Mutex<MessageBus>>,
    pub provider: Arc<dyn LLMProvider>,
    pub workspace: PathBuf,
    pub model: Option<String>,
    pub max_tool_iterations: usize,
    pub max_tokens: u32,
    pub temperature: f32,
    pub exec_timeout_s: u64,
    pub memory_top_k: usize,
}

impl AgentLoopConfig {
    /// Sensible test defaults; only bus, provider, and workspace are required.
    #[doc(hidden)]
    pub fn test_defaults(
        bus: Arc<Mutex<MessageBus>>,
        provider: Arc<dyn LLMProvider>,
        workspace: PathBuf,
    ) -> Self {
        Self {
            bus,
            provider,
            workspace,
            model: None,
            max_tool_iterations: 10,
            max_tokens: 1024,
            temperature: 0.0,
            exec_timeout_s: 10,
            memory_top_k: 5,
        }
    }
}

/// Drives the tool-calling fixpoint: provider call, tool execution, result
/// append, repeat — until the provider answers without tool calls or the
/// iteration cap trips. Single consumer of the hub's inbound queue.
pub struct AgentLoop {
    inbound_rx: Mutex<mpsc::Receiver<InboundMessage>>,
    outbound_tx: mpsc::Sender<OutboundMessage>,
    provider: Arc<dyn LLMProvider>,
    model: String,
    max_tool_iterations: usize,
    max_tokens: u32,
    temperature: f32,
    context: ContextBuilder,
    memory: Arc<MemoryStore>,
    tools: Arc<ToolRegistry>,
    histories: Mutex<HashMap<String, Vec<String>>>,
    running: Mutex<bool>,
}

impl AgentLoop {
    pub async fn new(config: AgentLoopConfig) -> Result<Self> {
        let AgentLoopConfig {
            bus,
            provider,
            workspace,
            model,
            max_tool_iterations,
            max_tokens,
            temperature,
            exec_timeout_s,
            memory_top_k,
        } = config;

        let (inbound_rx, outbound_tx) = {
            let mut bus_guard = bus.lock().await;
            let rx = bus_guard
                .take_inbound_rx()
                .ok_or_else(|| anyhow::anyhow!("inbound receiver already taken"))?;
            (rx, bus_guard.outbound_tx.clone())
        };

        let model = model.unwrap_or_else(|| provider.default_model().to_string());
        std::fs::create_dir_all(&workspace)?;
        let memory = Arc::new(MemoryStore::new(&workspace)?);

        let ranker = Arc::new(LLMMemoryRanker::new(provider.clone(), Some(model.clone())));
        let context = ContextBuilder::new(&workspace, memory.clone(), ranker, memory_top_k);

        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(exec::ExecTool::with_workspace(
            exec_timeout_s,
            &workspace,
        )));
        registry.register(Arc::new(filesystem::FsTool::new(&workspace)));
        registry.register(Arc::new(web::WebTool::new()));
        registry.register(Arc::new(message::MessageTool::new(outbound_tx.clone())));
        registry.register(Arc::new(memory_write::WriteMemoryTool::new(memory.clone())));
        registry.register(Arc::new(skills::CreateSkillTool::new(&workspace)));
        registry.register(Arc::new(skills::ListSkillsTool::new(&workspace)));
        registry.register(Arc::new(skills::ReadSkillTool::new(&workspace)));
        registry.register(Arc::new(skills::DeleteSkillTool::new(&workspace)));
        registry.register(Arc::new(spawn::SpawnTool::new(
            provider.clone(),
            model.clone(),
            outbound_tx.clone(),
        )));

        Ok(Self {
            inbound_rx: Mutex::new(inbound_rx),
            outbound_tx,
            provider,
            model,
            max_tool_iterations,
            max_tokens,
            temperature,
            context,
            memory,
            tools: Arc::new(registry),
            histories: Mutex::new(HashMap::new()),
            running: Mutex::new(false),
        })
    }

    pub fn memory(&self) -> Arc<MemoryStore> {
        self.memory.clone()
    }

    /// Consume `Hub.In` until the queue closes or [`stop`](Self::stop) is
    /// called. Each inbound message becomes one logical turn; the final
    /// answer is published on `Hub.Out` without blocking.
    pub async fn run(&self) -> Result<()> {
        *self.running.lock().await = true;
        info!("agent loop started, waiting for messages");

        loop {
            if !*self.running.lock().await {
                break;
            }

            let msg = {
                let mut rx = self.inbound_rx.lock().await;
                rx.recv().await
            };
            let Some(msg) = msg else {
                info!("inbound queue closed, stopping agent loop");
                break;
            };

            info!(
                "processing inbound: channel={}, sender={}, chat={}, len={}",
                msg.channel,
                msg.sender_id,
                msg.chat_id,
                msg.content.len()
            );
            match self.process_message(msg).await {
                Ok(Some(out)) => {
                    if let Err(e) = self.outbound_tx.try_send(out) {
                        error!("failed to publish outbound reply: {}", e);
                    }
                }
                Ok(None) => debug!("turn produced no outbound reply"),
                Err(e) => error!("error processing message: {}", e),
            }
        }

        info!("agent loop stopped");
        Ok(())
    }

    pub async fn stop(&self) {
        *self.running.lock().await = false;
    }

    /// Run one turn for a synthetic CLI message and return the final answer.
    /// Used by the `agent` command and tests; nothing is published on the hub.
    pub async fn process_direct(&self, content: &str) -> Result<String> {
        let msg = InboundMessage::new("cli", "user", "direct", content);
        let reply = self.run_turn(&msg).await?;
        Ok(reply)
    }

    async fn process_message(&self, msg: InboundMessage) -> Result<Option<OutboundMessage>> {
        let reply = self.run_turn(&msg).await?;
        if reply.is_empty() {
            return Ok(None);
        }
        Ok(Some(OutboundMessage {
            channel: msg.channel,
            chat_id: msg.chat_id,
            content: reply,
        }))
    }

    /// One logical turn: prompt assembly, the tool-calling fixpoint, and the
    /// rolling-history update.
    async fn run_turn(&self, msg: &InboundMessage) -> Result<String> {
        let session_key = msg.session_key();
        let history = {
            let histories = self.histories.lock().await;
            histories.get(&session_key).cloned().unwrap_or_default()
        };

        let messages = self
            .context
            .build_messages(&history, &msg.content, &msg.channel, &msg.chat_id)
            .await?;
        debug!("built {} prompt messages", messages.len());

        let exec_ctx = ExecutionContext::new(&msg.channel, &msg.chat_id);
        let reply = self.run_tool_loop(messages, &exec_ctx).await;

        let mut histories = self.histories.lock().await;
        let entries = histories.entry(session_key).or_default();
        entries.push(format!("user: {}", msg.content));
        if !reply.is_empty() {
            entries.push(format!("assistant: {}", reply));
        }
        if entries.len() > MAX_HISTORY_ENTRIES {
            let overflow = entries.len() - MAX_HISTORY_ENTRIES;
            entries.drain(..overflow);
        }

        Ok(reply)
    }

    /// The fixpoint. Provider failures become an apology for the turn; tool
    /// failures are surfaced back to the model as error results and never
    /// abort the loop.
    async fn run_tool_loop(
        &self,
        mut messages: Vec<Message>,
        exec_ctx: &ExecutionContext,
    ) -> String {
        let tool_defs = self.tools.get_tool_definitions();

        for iteration in 1..=self.max_tool_iterations {
            let response = self
                .provider
                .chat(ChatRequest {
                    messages: messages.clone(),
                    tools: Some(tool_defs.clone()),
                    model: Some(&self.model),
                    max_tokens: self.max_tokens,
                    temperature: self.temperature,
                })
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    warn!("provider call failed on iteration {}: {}", iteration, e);
                    return PROVIDER_FAILURE_REPLY.to_string();
                }
            };

            if !response.has_tool_calls() {
                let content = response.content.unwrap_or_default();
                messages.push(Message::assistant(content.clone(), None));
                return content;
            }

            // Tool calls first, even when content coexists with them
            let content = response.content.clone().unwrap_or_default();
            messages.push(Message::assistant(content, Some(response.tool_calls.clone())));

            for tc in &response.tool_calls {
                let result = self.execute_tool_call(tc, exec_ctx).await;
                messages.push(Message::tool_result(
                    tc.id.clone(),
                    result.0,
                    result.1,
                ));
            }
        }

        warn!(
            "tool-iteration cap ({}) reached, ending turn",
            self.max_tool_iterations
        );
        ITERATION_LIMIT_REPLY.to_string()
    }

    /// Returns `(content, is_error)`. Unknown tool names yield a synthetic
    /// error result so the model can correct itself.
    async fn execute_tool_call(
        &self,
        tc: &ToolCallRequest,
        exec_ctx: &ExecutionContext,
    ) -> (String, bool) {
        if self.tools.get(&tc.name).is_none() {
            warn!("model called unknown tool: {}", tc.name);
            return (format!("unknown tool: {}", tc.name), true);
        }
        match self
            .tools
            .execute(&tc.name, tc.arguments.clone(), exec_ctx)
            .await
        {
            Ok(result) => (result.content, result.is_error),
            Err(e) => {
                warn!("tool '{}' failed: {}", tc.name, e);
                (format!("tool execution failed: {}", e), true)
            }
        }
    }
}

#[cfg(test)]
mod tests;

use super::*;
use crate::providers::base::LLMResponse;
use crate::providers::stub::StubProvider;
use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};

async fn agent_with(provider: Arc<dyn LLMProvider>) -> (tempfile::TempDir, AgentLoop) {
    let dir = tempfile::tempdir().unwrap();
    let bus = Arc::new(Mutex::new(MessageBus::new(10, 10)));
    let agent = AgentLoop::new(AgentLoopConfig::test_defaults(
        bus,
        provider,
        dir.path().to_path_buf(),
    ))
    .await
    .unwrap();
    (dir, agent)
}

/// Provider that issues `calls` tool calls (one per iteration) before a final
/// text answer. Counts chat invocations.
struct ToolCallingProvider {
    tool_name: String,
    arguments: serde_json::Value,
    remaining: AtomicUsize,
    chats: AtomicUsize,
}

impl ToolCallingProvider {
    fn new(tool_name: &str, arguments: serde_json::Value, calls: usize) -> Self {
        Self {
            tool_name: tool_name.to_string(),
            arguments,
            remaining: AtomicUsize::new(calls),
            chats: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl LLMProvider for ToolCallingProvider {
    async fn chat(&self, req: ChatRequest<'_>) -> anyhow::Result<LLMResponse> {
        let turn = self.chats.fetch_add(1, Ordering::SeqCst);
        if self.remaining.load(Ordering::SeqCst) > 0 {
            self.remaining.fetch_sub(1, Ordering::SeqCst);
            return Ok(LLMResponse {
                content: None,
                tool_calls: vec![ToolCallRequest {
                    id: format!("tc_{}", turn),
                    name: self.tool_name.clone(),
                    arguments: self.arguments.clone(),
                }],
            });
        }
        // Final turn: confirm the last message is a tool result
        let last = req.messages.last().unwrap();
        assert_eq!(last.role, "tool", "tool result must precede the final call");
        Ok(LLMResponse {
            content: Some("all done".to_string()),
            tool_calls: vec![],
        })
    }

    fn default_model(&self) -> &str {
        "mock"
    }
}

struct FailingProvider;

#[async_trait]
impl LLMProvider for FailingProvider {
    async fn chat(&self, _req: ChatRequest<'_>) -> anyhow::Result<LLMResponse> {
        Err(anyhow::anyhow!("boom"))
    }
    fn default_model(&self) -> &str {
        "failing"
    }
}

#[tokio::test]
async fn stub_echo_answers_within_a_second() {
    let (_dir, agent) = agent_with(Arc::new(StubProvider::new())).await;
    let reply = tokio::time::timeout(
        std::time::Duration::from_secs(1),
        agent.process_direct("hello"),
    )
    .await
    .expect("must answer within 1s")
    .unwrap();
    assert!(!reply.is_empty());
    assert!(reply.contains("hello"));
}

#[tokio::test]
async fn tool_calls_execute_then_final_answer() {
    let provider = Arc::new(ToolCallingProvider::new(
        "fs",
        json!({"action": "write", "path": "out.txt", "content": "done"}),
        2,
    ));
    let (dir, agent) = agent_with(provider.clone()).await;

    let reply = agent.process_direct("write the file").await.unwrap();
    assert_eq!(reply, "all done");
    assert!(dir.path().join("out.txt").exists());
    // 2 tool iterations + 1 final text turn
    assert_eq!(provider.chats.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn unknown_tool_yields_synthetic_result_and_loop_continues() {
    let provider = Arc::new(ToolCallingProvider::new("no_such_tool", json!({}), 1));
    let (_dir, agent) = agent_with(provider).await;
    let reply = agent.process_direct("try it").await.unwrap();
    // The unknown-tool error was surfaced to the model, which then finished
    assert_eq!(reply, "all done");
}

#[tokio::test]
async fn iteration_cap_produces_limit_reply() {
    // More tool calls than the cap (test_defaults uses 10 iterations)
    let provider = Arc::new(ToolCallingProvider::new(
        "fs",
        json!({"action": "list", "path": "."}),
        100,
    ));
    let (_dir, agent) = agent_with(provider.clone()).await;

    let reply = agent.process_direct("loop forever").await.unwrap();
    assert!(reply.contains("tool-iteration limit"));
    // Exactly one provider call (and one tool execution) per iteration
    assert_eq!(provider.chats.load(Ordering::SeqCst), 10);
}

#[tokio::test]
async fn provider_failure_becomes_apology() {
    let (_dir, agent) = agent_with(Arc::new(FailingProvider)).await;
    let reply = agent.process_direct("hi").await.unwrap();
    assert!(reply.contains("problem talking to the language model"));
}

#[tokio::test]
async fn history_carries_across_turns() {
    let (_dir, agent) = agent_with(Arc::new(StubProvider::new())).await;
    agent.process_direct("first message").await.unwrap();
    let histories = agent.histories.lock().await;
    let entries = histories.get("cli:direct").unwrap();
    assert_eq!(entries[0], "user: first message");
    assert!(entries[1].starts_with("assistant: "));
}

#[tokio::test]
async fn run_publishes_outbound_for_inbound() {
    let dir = tempfile::tempdir().unwrap();
    let bus = Arc::new(Mutex::new(MessageBus::new(10, 10)));
    let (inbound_tx, mut outbound_rx) = {
        let mut guard = bus.lock().await;
        (guard.inbound_tx.clone(), guard.take_outbound_rx().unwrap())
    };

    let agent = Arc::new(
        AgentLoop::new(AgentLoopConfig::test_defaults(
            bus,
            Arc::new(StubProvider::new()),
            dir.path().to_path_buf(),
        ))
        .await
        .unwrap(),
    );

    let runner = {
        let agent = agent.clone();
        tokio::spawn(async move { agent.run().await })
    };

    inbound_tx
        .send(InboundMessage::new("cli", "user", "c1", "ping"))
        .await
        .unwrap();

    let out = tokio::time::timeout(std::time::Duration::from_secs(2), outbound_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(out.channel, "cli");
    assert_eq!(out.chat_id, "c1");
    assert!(out.content.contains("ping"));

    agent.stop().await;
    drop(inbound_tx);
    let _ = tokio::time::timeout(std::time::Duration::from_secs(2), runner).await;
}

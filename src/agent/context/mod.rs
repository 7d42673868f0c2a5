use crate::agent::memory::{MemoryStore, Ranker};
use crate::agent::skills::SkillsLoader;
use crate::providers::base::Message;
use anyhow::Result;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

/// Workspace markdowns injected as system context, in this order.
const BOOTSTRAP_FILES: &[&str] = &["SOUL.md", "AGENTS.md", "USER.md", "TOOLS.md"];

/// Immutable identity block. Everything else about the agent's persona lives
/// in the workspace bootstrap files.
pub const MASTER_INSTRUCTION: &str = "You are Gio, a personal AI assistant.

## Core Identity
- You are honest, direct, and intellectually curious.
- You admit when you don't know something rather than guessing or fabricating information.
- You think step by step through complex problems before answering.
- You prioritize correctness and safety in everything you do.

## Communication Style
- Be concise and clear. Avoid filler words and unnecessary preamble.
- Explain your reasoning when it helps the user understand your answer.
- Ask clarifying questions when a request is ambiguous rather than assuming.
- Match the user's language — if they write in Spanish, respond in Spanish.

## Principles
- Never invent facts, URLs, citations, or data. If you're unsure, say so.
- When you make a mistake, acknowledge and correct it immediately.
- Respect user privacy: never log, share, or expose sensitive information.
- Use your tools proactively to accomplish tasks rather than just describing steps.";

/// Assembles the per-turn message list: master instruction, workspace
/// bootstrap files, channel context, memory directive, skills digest, memory
/// context, ranked memories, rolling history, current message.
pub struct ContextBuilder {
    workspace: PathBuf,
    memory: Arc<MemoryStore>,
    skills: SkillsLoader,
    ranker: Arc<dyn Ranker>,
    top_k: usize,
}

impl ContextBuilder {
    pub fn new(
        workspace: impl AsRef<Path>,
        memory: Arc<MemoryStore>,
        ranker: Arc<dyn Ranker>,
        top_k: usize,
    ) -> Self {
        let workspace = workspace.as_ref().to_path_buf();
        let skills = SkillsLoader::new(&workspace);
        Self {
            workspace,
            memory,
            skills,
            ranker,
            top_k,
        }
    }

    pub async fn build_messages(
        &self,
        history: &[String],
        current_message: &str,
        channel: &str,
        chat_id: &str,
    ) -> Result<Vec<Message>> {
        let mut messages = Vec::with_capacity(history.len() + 8);
        messages.push(Message::system(MASTER_INSTRUCTION));

        // Workspace bootstrap files define personality, user context, and
        // tool documentation; missing files are skipped silently.
        for name in BOOTSTRAP_FILES {
            let path = self.workspace.join(name);
            match std::fs::read_to_string(&path) {
                Ok(raw) => {
                    let content = raw.trim();
                    if !content.is_empty() {
                        messages.push(Message::system(format!("## {}\n\n{}", name, content)));
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("failed to read bootstrap file {}: {}", path.display(), e),
            }
        }

        messages.push(Message::system(format!(
            "You are operating on channel=\"{}\" chatID=\"{}\". You have full access to all \
             registered tools regardless of the channel. Always use your tools when the user \
             asks you to perform actions (file operations, shell commands, web fetches, etc.).",
            channel, chat_id
        )));

        messages.push(Message::system(
            "If you decide something should be remembered, call the tool 'write_memory' with \
             JSON arguments: {\"target\": \"today\"|\"long\", \"content\": \"...\", \
             \"append\": true|false}. Use a tool call rather than plain chat text when writing \
             memory.",
        ));

        let skills_context = self.skills.build_context();
        if !skills_context.is_empty() {
            messages.push(Message::system(skills_context));
        }

        match self.memory.get_memory_context() {
            Ok(memory_context) if !memory_context.is_empty() => {
                messages.push(Message::system(format!("Memory:\n{}", memory_context)));
            }
            Ok(_) => {}
            Err(e) => warn!("failed to read memory context: {}", e),
        }

        let memories = self.memory.recent(50);
        if !memories.is_empty() {
            let selected = self.ranker.rank(current_message, &memories, self.top_k).await;
            if !selected.is_empty() {
                let mut block = String::from("Relevant memories:\n");
                for item in &selected {
                    let _ = writeln!(block, "- {} ({})", item.text, item.kind);
                }
                messages.push(Message::system(block));
            }
        }

        // History entries are pre-rendered "role: content" lines
        for entry in history {
            if !entry.is_empty() {
                messages.push(Message::user(entry.clone()));
            }
        }

        messages.push(Message::user(current_message));
        Ok(messages)
    }
}

use crate::agent::memory::MemoryItem;
use async_trait::async_trait;

/// Orders memory items by relevance to a query, returning the top `top`.
#[async_trait]
pub trait Ranker: Send + Sync {
    async fn rank(&self, query: &str, memories: &[MemoryItem], top: usize) -> Vec<MemoryItem>;
}

/// Deterministic keyword-overlap ranker. Dependency-free scoring used both
/// standalone and as the fallback behind [`LLMMemoryRanker`].
///
/// [`LLMMemoryRanker`]: crate::agent::memory::LLMMemoryRanker
pub struct SimpleRanker;

impl SimpleRanker {
    pub fn new() -> Self {
        Self
    }

    /// Lowercase word tokens of length >= 2.
    pub(crate) fn tokenize(s: &str) -> Vec<String> {
        let mut tokens = Vec::new();
        let mut current = String::new();
        for ch in s.chars() {
            if ch.is_alphanumeric() || ch == '_' {
                current.extend(ch.to_lowercase());
            } else if !current.is_empty() {
                if current.chars().count() >= 2 {
                    tokens.push(std::mem::take(&mut current));
                } else {
                    current.clear();
                }
            }
        }
        if current.chars().count() >= 2 {
            tokens.push(current);
        }
        tokens
    }

    /// Synchronous ranking core, usable without an executor.
    pub fn rank_sync(&self, query: &str, memories: &[MemoryItem], top: usize) -> Vec<MemoryItem> {
        let top = if top == 0 || top > memories.len() {
            memories.len()
        } else {
            top
        };

        let query_tokens = Self::tokenize(query);
        if query_tokens.is_empty() {
            // No query tokens: newest-first (items are stored oldest-first)
            return memories.iter().rev().take(top).cloned().collect();
        }

        let mut scored: Vec<(usize, usize)> = memories
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                let item_tokens: std::collections::HashSet<String> =
                    Self::tokenize(&item.text).into_iter().collect();
                let score = query_tokens
                    .iter()
                    .filter(|t| item_tokens.contains(*t))
                    .count();
                (idx, score)
            })
            .collect();

        // Descending score; ties broken by higher original index (more recent)
        scored.sort_by(|a, b| b.1.cmp(&a.1).then(b.0.cmp(&a.0)));

        scored
            .into_iter()
            .take(top)
            .map(|(idx, _)| memories[idx].clone())
            .collect()
    }
}

impl Default for SimpleRanker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Ranker for SimpleRanker {
    async fn rank(&self, query: &str, memories: &[MemoryItem], top: usize) -> Vec<MemoryItem> {
        self.rank_sync(query, memories, top)
    }
}

#[cfg(test)]
mod tests;

use crate::agent::memory::ranker::{Ranker, SimpleRanker};
use crate::agent::memory::MemoryItem;
use crate::providers::base::{ChatRequest, LLMProvider, Message, ToolDefinition};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{debug, warn};

const RANK_MAX_TOKENS: u32 = 1024;

/// Ranks memories by asking the provider, degrading to [`SimpleRanker`] on
/// any provider error or unparsable response. The output always has exactly
/// `min(top, memories.len())` items.
pub struct LLMMemoryRanker {
    provider: Arc<dyn LLMProvider>,
    model: String,
    fallback: SimpleRanker,
}

impl LLMMemoryRanker {
    pub fn new(provider: Arc<dyn LLMProvider>, model: Option<String>) -> Self {
        let model = model.unwrap_or_else(|| provider.default_model().to_string());
        Self {
            provider,
            model,
            fallback: SimpleRanker::new(),
        }
    }

    fn build_prompt(query: &str, memories: &[MemoryItem]) -> String {
        let mut prompt = String::from(
            "You are a ranking assistant. Given the query and a list of memories \
             numbered 0..N-1, return only an ordered list of indices (most relevant \
             first). Respond either by calling the tool 'rank_memories' with argument \
             {\"indices\": [i, j, ...]} or by returning a JSON array like [i,j,...] in \
             the assistant content. Do not return other text around the array; if you \
             must, ensure the array appears in full (e.g. 'Result: [1,0]').\n\n",
        );
        let _ = write!(prompt, "Query: {}\n\nMemories (index: text):\n", query);
        for (i, m) in memories.iter().enumerate() {
            let _ = writeln!(prompt, "{}: {}", i, m.text);
        }
        prompt
    }

    fn rank_tool() -> ToolDefinition {
        ToolDefinition {
            name: "rank_memories".to_string(),
            description: "Return ranking indices for memories".to_string(),
            parameters: json!({
                "type": "object",
                "required": ["indices"],
                "properties": {
                    "indices": {"type": "array", "items": {"type": "number"}}
                }
            }),
        }
    }

    /// Deduplicate, drop out-of-range, preserve order, take `top`; pad with
    /// the fallback ordering when the model returned too few.
    fn select(
        &self,
        query: &str,
        memories: &[MemoryItem],
        indices: &[i64],
        top: usize,
    ) -> Vec<MemoryItem> {
        let mut out: Vec<MemoryItem> = Vec::with_capacity(top);
        let mut seen = std::collections::HashSet::new();
        for &idx in indices {
            if idx < 0 || idx as usize >= memories.len() {
                continue;
            }
            if !seen.insert(idx as usize) {
                continue;
            }
            out.push(memories[idx as usize].clone());
            if out.len() >= top {
                break;
            }
        }
        if out.len() < top {
            // Identity for dedupe is (kind, text)
            let padding = self.fallback.rank_sync(query, memories, memories.len());
            for item in padding {
                if out.len() >= top {
                    break;
                }
                let duplicate = out
                    .iter()
                    .any(|s| s.text == item.text && s.kind == item.kind);
                if !duplicate {
                    out.push(item);
                }
            }
        }
        out
    }
}

/// Parse an `indices` argument that may hold integers, floats, or a mix.
fn parse_indices_from_args(value: &Value) -> Option<Vec<i64>> {
    let arr = value.as_array()?;
    let out: Vec<i64> = arr
        .iter()
        .filter_map(|v| {
            v.as_i64()
                .or_else(|| v.as_f64().map(|f| f.trunc() as i64))
        })
        .collect();
    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

/// Parse a JSON array of ints from assistant text: strict parse first, then
/// the first `[...]` substring.
fn parse_indices_from_text(text: &str) -> Option<Vec<i64>> {
    let trimmed = text.trim();
    if let Ok(indices) = serde_json::from_str::<Vec<i64>>(trimmed) {
        return Some(indices);
    }
    let start = trimmed.find('[')?;
    let end = trimmed.rfind(']')?;
    if start >= end {
        return None;
    }
    serde_json::from_str::<Vec<i64>>(&trimmed[start..=end]).ok()
}

#[async_trait]
impl Ranker for LLMMemoryRanker {
    async fn rank(&self, query: &str, memories: &[MemoryItem], top: usize) -> Vec<MemoryItem> {
        if memories.is_empty() || top == 0 {
            return Vec::new();
        }
        let top = top.min(memories.len());

        let messages = vec![
            Message::system(Self::build_prompt(query, memories)),
            Message::user(
                "Return an ordered list of indices ranked by relevance, or call the \
                 'rank_memories' tool.",
            ),
        ];

        debug!(
            "llm ranker: ranking {} memories for query {:?}",
            memories.len(),
            query
        );
        let response = self
            .provider
            .chat(ChatRequest {
                messages,
                tools: Some(vec![Self::rank_tool()]),
                model: Some(&self.model),
                max_tokens: RANK_MAX_TOKENS,
                temperature: 0.0,
            })
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                warn!("llm ranker: provider error, using fallback: {}", e);
                return self.fallback.rank_sync(query, memories, top);
            }
        };

        // Prefer a tool call when present
        for tc in &response.tool_calls {
            if tc.name != "rank_memories" {
                continue;
            }
            if let Some(indices) = tc
                .arguments
                .get("indices")
                .and_then(parse_indices_from_args)
            {
                return self.select(query, memories, &indices, top);
            }
        }

        // Otherwise mine the content for an index array
        if let Some(indices) = response
            .content
            .as_deref()
            .and_then(parse_indices_from_text)
        {
            return self.select(query, memories, &indices, top);
        }

        debug!("llm ranker: unparsable response, using fallback");
        self.fallback.rank_sync(query, memories, top)
    }
}

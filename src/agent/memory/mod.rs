pub mod llm_ranker;
pub mod ranker;
pub mod store;

pub use llm_ranker::LLMMemoryRanker;
pub use ranker::{Ranker, SimpleRanker};
pub use store::{MemoryItem, MemoryKind, MemoryStore};

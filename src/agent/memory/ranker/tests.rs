use super::*;
use crate::agent::memory::MemoryKind;
use chrono::Utc;

fn item(text: &str) -> MemoryItem {
    MemoryItem {
        kind: MemoryKind::Short,
        text: text.into(),
        timestamp: Utc::now(),
    }
}

#[test]
fn tokenize_lowercases_and_drops_short_tokens() {
    let tokens = SimpleRanker::tokenize("Buy MILK at 9 a.m.!");
    assert_eq!(tokens, vec!["buy", "milk", "at"]);
}

#[test]
fn tokenize_empty_input() {
    assert!(SimpleRanker::tokenize("").is_empty());
    assert!(SimpleRanker::tokenize("a 1 !").is_empty());
}

#[test]
fn rank_scores_by_token_overlap() {
    let ranker = SimpleRanker::new();
    let memories = vec![
        item("call mom tonight"),
        item("buy milk and bread"),
        item("milk delivery tomorrow milk"),
    ];
    let out = ranker.rank_sync("buy milk", &memories, 2);
    assert_eq!(out.len(), 2);
    // "buy milk and bread" matches both tokens, delivery entry matches one
    assert_eq!(out[0].text, "buy milk and bread");
    assert_eq!(out[1].text, "milk delivery tomorrow milk");
}

#[test]
fn rank_ties_break_newer_first() {
    let ranker = SimpleRanker::new();
    let memories = vec![item("note milk one"), item("note milk two")];
    let out = ranker.rank_sync("milk", &memories, 2);
    // Equal scores — higher index (more recent) first
    assert_eq!(out[0].text, "note milk two");
    assert_eq!(out[1].text, "note milk one");
}

#[test]
fn rank_is_deterministic() {
    let ranker = SimpleRanker::new();
    let memories = vec![item("alpha beta"), item("beta gamma"), item("gamma delta")];
    let a = ranker.rank_sync("beta gamma", &memories, 3);
    let b = ranker.rank_sync("beta gamma", &memories, 3);
    let texts = |v: &[MemoryItem]| v.iter().map(|m| m.text.clone()).collect::<Vec<_>>();
    assert_eq!(texts(&a), texts(&b));
}

#[test]
fn rank_without_query_tokens_returns_newest_first() {
    let ranker = SimpleRanker::new();
    let memories = vec![item("oldest"), item("middle"), item("newest")];
    let out = ranker.rank_sync("!", &memories, 2);
    assert_eq!(out[0].text, "newest");
    assert_eq!(out[1].text, "middle");
}

#[test]
fn rank_top_zero_returns_all() {
    let ranker = SimpleRanker::new();
    let memories = vec![item("one"), item("two")];
    assert_eq!(ranker.rank_sync("one", &memories, 0).len(), 2);
}

#[tokio::test]
async fn async_trait_delegates_to_sync() {
    let ranker = SimpleRanker::new();
    let memories = vec![item("buy milk")];
    let out = ranker.rank("milk", &memories, 1).await;
    assert_eq!(out.len(), 1);
}

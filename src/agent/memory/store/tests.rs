use super::*;

fn store() -> (tempfile::TempDir, MemoryStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = MemoryStore::new(dir.path()).unwrap();
    (dir, store)
}

#[test]
fn recent_returns_newest_first_short_then_long() {
    let (_dir, store) = store();
    store.add_long("L1");
    store.add_short("two");
    store.add_short("one");

    let recent = store.recent(10);
    let texts: Vec<&str> = recent.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, vec!["one", "two", "L1"]);
}

#[test]
fn recent_respects_n() {
    let (_dir, store) = store();
    for i in 0..5 {
        store.add_short(format!("item-{}", i));
    }
    assert_eq!(store.recent(3).len(), 3);
    assert_eq!(store.recent(0).len(), 0);
}

#[test]
fn short_list_caps_at_limit_dropping_oldest() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemoryStore::with_limit(dir.path(), 3).unwrap();
    for i in 0..5 {
        store.add_short(format!("s{}", i));
    }
    let recent = store.recent(10);
    assert_eq!(recent.len(), 3);
    assert_eq!(recent[0].text, "s4");
    assert_eq!(recent[2].text, "s2");
}

#[test]
fn query_by_keyword_is_case_insensitive() {
    let (_dir, store) = store();
    store.add_short("Buy MILK tomorrow");
    store.add_short("call mom");
    store.add_long("milk delivery schedule");

    let hits = store.query_by_keyword("milk", 10);
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].text, "Buy MILK tomorrow");
    assert_eq!(hits[1].text, "milk delivery schedule");
    assert_eq!(hits[1].kind, MemoryKind::Long);
}

#[test]
fn query_with_empty_keyword_returns_nothing() {
    let (_dir, store) = store();
    store.add_short("anything");
    assert!(store.query_by_keyword("", 10).is_empty());
}

#[test]
fn long_term_missing_file_reads_empty() {
    let (_dir, store) = store();
    assert_eq!(store.read_long_term().unwrap(), "");
}

#[test]
fn long_term_write_overwrites() {
    let (_dir, store) = store();
    store.write_long_term("v1").unwrap();
    store.write_long_term("v2").unwrap();
    assert_eq!(store.read_long_term().unwrap(), "v2");
}

#[test]
fn append_today_prefixes_timestamp() {
    let (_dir, store) = store();
    store.append_today("first note").unwrap();
    store.append_today("second note").unwrap();

    let today = store.read_today().unwrap();
    let lines: Vec<&str> = today.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with('['));
    assert!(lines[0].ends_with("first note"));
    assert!(lines[1].ends_with("second note"));
}

#[test]
fn memory_context_combines_long_term_and_today() {
    let (_dir, store) = store();
    assert_eq!(store.get_memory_context().unwrap(), "");

    store.write_long_term("long-term facts").unwrap();
    assert_eq!(store.get_memory_context().unwrap(), "long-term facts");

    store.append_today("daily note").unwrap();
    let ctx = store.get_memory_context().unwrap();
    assert!(ctx.starts_with("long-term facts\n\n---\n\n"));
    assert!(ctx.contains("daily note"));
}

#[test]
fn recent_notes_joins_days() {
    let (_dir, store) = store();
    store.append_today("today entry").unwrap();
    let notes = store.recent_notes(3).unwrap();
    assert!(notes.contains("today entry"));
}

use super::*;

fn setup() -> (tempfile::TempDir, FsTool) {
    let dir = tempfile::tempdir().unwrap();
    let tool = FsTool::new(dir.path());
    (dir, tool)
}

fn ctx() -> ExecutionContext {
    ExecutionContext::default()
}

#[tokio::test]
async fn write_then_read_roundtrips() {
    let (_dir, tool) = setup();
    let result = tool
        .execute(
            json!({"action": "write", "path": "notes/today.md", "content": "remember this"}),
            &ctx(),
        )
        .await
        .unwrap();
    assert!(!result.is_error, "{}", result.content);

    let result = tool
        .execute(json!({"action": "read", "path": "notes/today.md"}), &ctx())
        .await
        .unwrap();
    assert_eq!(result.content, "remember this");
}

#[tokio::test]
async fn write_creates_parent_directories() {
    let (dir, tool) = setup();
    tool.execute(
        json!({"action": "write", "path": "a/b/c.txt", "content": "x"}),
        &ctx(),
    )
    .await
    .unwrap();
    assert!(dir.path().canonicalize().unwrap().join("a/b/c.txt").exists());
}

#[tokio::test]
async fn list_marks_directories() {
    let (_dir, tool) = setup();
    tool.execute(
        json!({"action": "write", "path": "sub/file.txt", "content": "x"}),
        &ctx(),
    )
    .await
    .unwrap();
    tool.execute(
        json!({"action": "write", "path": "top.txt", "content": "y"}),
        &ctx(),
    )
    .await
    .unwrap();

    let result = tool
        .execute(json!({"action": "list", "path": "."}), &ctx())
        .await
        .unwrap();
    let lines: Vec<&str> = result.content.lines().collect();
    assert_eq!(lines, vec!["sub/", "top.txt"]);
}

#[tokio::test]
async fn traversal_outside_workspace_is_rejected() {
    let (_dir, tool) = setup();
    let result = tool
        .execute(json!({"action": "read", "path": "../../etc/passwd"}), &ctx())
        .await
        .unwrap();
    assert!(result.is_error);
    assert!(result.content.contains("outside the workspace"));
}

#[tokio::test]
async fn absolute_path_outside_workspace_is_rejected() {
    let (_dir, tool) = setup();
    let result = tool
        .execute(json!({"action": "read", "path": "/etc/passwd"}), &ctx())
        .await
        .unwrap();
    assert!(result.is_error);
    assert!(result.content.contains("outside the workspace"));
}

#[tokio::test]
async fn absolute_path_inside_workspace_is_allowed() {
    let (dir, tool) = setup();
    let inside = dir.path().canonicalize().unwrap().join("ok.txt");
    std::fs::write(&inside, "fine").unwrap();
    let result = tool
        .execute(
            json!({"action": "read", "path": inside.to_str().unwrap()}),
            &ctx(),
        )
        .await
        .unwrap();
    assert_eq!(result.content, "fine");
}

#[tokio::test]
async fn missing_file_is_error_result() {
    let (_dir, tool) = setup();
    let result = tool
        .execute(json!({"action": "read", "path": "nope.txt"}), &ctx())
        .await
        .unwrap();
    assert!(result.is_error);
}

#[tokio::test]
async fn unknown_action_is_error_result() {
    let (_dir, tool) = setup();
    let result = tool
        .execute(json!({"action": "delete", "path": "x"}), &ctx())
        .await
        .unwrap();
    assert!(result.is_error);
    assert!(result.content.contains("unknown action"));
}

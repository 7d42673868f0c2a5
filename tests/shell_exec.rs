//! End-to-end checks of the exec tool's argument sandbox.

use picobot::agent::tools::exec::ExecTool;
use picobot::agent::tools::{ExecutionContext, Tool};
use serde_json::json;

fn ctx() -> ExecutionContext {
    ExecutionContext::default()
}

#[tokio::test]
async fn exec_array_echo() {
    let tool = ExecTool::new(10);
    let result = tool
        .execute(json!({"cmd": ["echo", "hello"]}), &ctx())
        .await
        .unwrap();
    assert!(!result.is_error, "{}", result.content);
    assert_eq!(result.content, "hello");
}

#[tokio::test]
async fn exec_rejects_string_form() {
    let tool = ExecTool::new(10);
    let result = tool.execute(json!({"cmd": "ls -la"}), &ctx()).await.unwrap();
    assert!(result.is_error);
    assert!(result.content.contains("string commands are disallowed"));
}

#[tokio::test]
async fn exec_rejects_rm() {
    let tool = ExecTool::new(10);
    let result = tool
        .execute(json!({"cmd": ["rm", "-rf", "/"]}), &ctx())
        .await
        .unwrap();
    assert!(result.is_error);
    assert!(result.content.contains("program 'rm' is disallowed"));
}

#[tokio::test]
async fn exec_rejects_absolute_path_arg() {
    let tool = ExecTool::new(10);
    let result = tool
        .execute(json!({"cmd": ["ls", "/etc"]}), &ctx())
        .await
        .unwrap();
    assert!(result.is_error);
    assert!(result.content.contains("argument '/etc' looks unsafe"));
}

#[tokio::test]
async fn exec_uv_venv_passes_the_sandbox() {
    let dir = tempfile::tempdir().unwrap();
    let tool = ExecTool::with_workspace(10, dir.path());
    let result = tool
        .execute(json!({"cmd": ["uv", "venv", "venvs/my-project"]}), &ctx())
        .await
        .unwrap();
    // May fail if uv is absent from the machine, but never due to policy
    assert!(
        !result.content.contains("looks unsafe"),
        "{}",
        result.content
    );
    assert!(
        !result.content.contains("disallowed"),
        "{}",
        result.content
    );
}

#[tokio::test]
async fn exec_interpreter_inline_code_runs() {
    let tool = ExecTool::new(10);
    let result = tool
        .execute(
            json!({"cmd": ["python3", "-c", "print('from: ' + 'inline/code')"]}),
            &ctx(),
        )
        .await
        .unwrap();
    // Policy must not reject inline code even though it contains '/' and ':'
    assert!(
        !result.content.contains("looks unsafe"),
        "{}",
        result.content
    );
}

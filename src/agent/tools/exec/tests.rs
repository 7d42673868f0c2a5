use super::*;

fn ctx() -> ExecutionContext {
    ExecutionContext::default()
}

#[tokio::test]
async fn array_echo_returns_output() {
    let tool = ExecTool::new(10);
    let result = tool
        .execute(json!({"cmd": ["echo", "hello"]}), &ctx())
        .await
        .unwrap();
    assert!(!result.is_error, "{}", result.content);
    assert_eq!(result.content, "hello");
}

#[tokio::test]
async fn string_command_is_rejected() {
    let tool = ExecTool::new(10);
    let result = tool.execute(json!({"cmd": "ls -la"}), &ctx()).await.unwrap();
    assert!(result.is_error);
    assert!(result.content.contains("string commands are disallowed"));
}

#[tokio::test]
async fn dangerous_program_is_rejected() {
    let tool = ExecTool::new(10);
    let result = tool
        .execute(json!({"cmd": ["rm", "-rf", "/"]}), &ctx())
        .await
        .unwrap();
    assert!(result.is_error);
    assert!(result.content.contains("program 'rm' is disallowed"));
}

#[tokio::test]
async fn dangerous_program_matched_by_basename() {
    let tool = ExecTool::new(10);
    let result = tool
        .execute(json!({"cmd": ["/usr/bin/SUDO", "id"]}), &ctx())
        .await
        .unwrap();
    assert!(result.is_error);
    assert!(result.content.contains("disallowed"));
}

#[tokio::test]
async fn absolute_path_argument_is_rejected() {
    let tool = ExecTool::new(10);
    let result = tool
        .execute(json!({"cmd": ["ls", "/etc"]}), &ctx())
        .await
        .unwrap();
    assert!(result.is_error);
    assert!(result.content.contains("argument '/etc' looks unsafe"));
}

#[tokio::test]
async fn shell_metacharacters_are_rejected() {
    let tool = ExecTool::new(10);
    for bad in [";", "&", "|", ">", "<", "$", "`", "..", "~"] {
        let arg = format!("x{}y", bad);
        let result = tool
            .execute(json!({"cmd": ["echo", arg]}), &ctx())
            .await
            .unwrap();
        assert!(result.is_error, "expected rejection for {:?}", bad);
        assert!(result.content.contains("looks unsafe"));
    }
}

#[tokio::test]
async fn empty_and_non_string_arrays_rejected() {
    let tool = ExecTool::new(10);
    let result = tool.execute(json!({"cmd": []}), &ctx()).await.unwrap();
    assert!(result.content.contains("empty cmd array"));

    let result = tool
        .execute(json!({"cmd": ["echo", 42]}), &ctx())
        .await
        .unwrap();
    assert!(result.content.contains("strings only"));
}

#[tokio::test]
async fn missing_cmd_is_an_error_result() {
    let tool = ExecTool::new(10);
    let result = tool.execute(json!({}), &ctx()).await.unwrap();
    assert!(result.is_error);
    assert!(result.content.contains("'cmd' argument required"));
}

#[test]
fn interpreter_inline_code_is_allowed() {
    let tool = ExecTool::new(10);
    let argv = tool
        .validate(&json!(["python3", "-c", "import os; print(os.getcwd() + '/x')"]))
        .unwrap();
    assert_eq!(argv[1], "-c");
}

#[test]
fn interpreter_relative_script_is_allowed() {
    let tool = ExecTool::new(10);
    assert!(tool.validate(&json!(["python3", "skills/monitor.py"])).is_ok());
}

#[test]
fn interpreter_script_traversal_is_rejected() {
    let tool = ExecTool::new(10);
    let err = tool
        .validate(&json!(["python3", "../outside.py"]))
        .unwrap_err();
    assert!(err.contains("looks unsafe"));
}

#[test]
fn interpreter_absolute_script_inside_workspace_is_rewritten() {
    let dir = tempfile::tempdir().unwrap();
    let workspace = dir.path().canonicalize().unwrap();
    let tool = ExecTool::with_workspace(10, &workspace);

    let script = workspace.join("skills").join("run.py");
    let argv = tool
        .validate(&json!(["python3", script.to_str().unwrap()]))
        .unwrap();
    assert_eq!(argv[1], "skills/run.py");
}

#[test]
fn interpreter_absolute_script_outside_workspace_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let tool = ExecTool::with_workspace(10, dir.path());
    let err = tool
        .validate(&json!(["python3", "/etc/passwd.py"]))
        .unwrap_err();
    assert!(err.contains("outside workspace"));
}

#[test]
fn package_manager_args_pass_through() {
    let tool = ExecTool::new(10);
    assert!(tool
        .validate(&json!(["pip", "install", "--user", "requests==2.31.0"]))
        .is_ok());
    assert!(tool.validate(&json!(["uv", "venv", "venvs/my-project"])).is_ok());
}

#[test]
fn package_manager_rejects_traversal() {
    let tool = ExecTool::new(10);
    let err = tool
        .validate(&json!(["pip", "install", "../evil"]))
        .unwrap_err();
    assert!(err.contains("looks unsafe"));
}

#[test]
fn uv_run_pip_hallucination_is_corrected() {
    let tool = ExecTool::new(10);
    let err = tool
        .validate(&json!(["uv", "run", "pip", "install", "requests"]))
        .unwrap_err();
    assert!(err.contains("uv pip"), "{}", err);
}

#[tokio::test]
async fn nonzero_exit_returns_output_with_error() {
    let tool = ExecTool::new(10);
    let result = tool
        .execute(json!({"cmd": ["ls", "no-such-file-here"]}), &ctx())
        .await
        .unwrap();
    assert!(result.is_error);
    assert!(result.content.starts_with("exec: command failed"));
}

#[tokio::test]
async fn timeout_is_reported() {
    let tool = ExecTool::new(1);
    let result = tool
        .execute(json!({"cmd": ["sleep", "30"]}), &ctx())
        .await
        .unwrap();
    assert!(result.is_error);
    assert!(result.content.contains("timed out after 1s"));
}

#[tokio::test]
async fn workspace_is_working_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("marker.txt"), "x").unwrap();
    let tool = ExecTool::with_workspace(10, dir.path());
    let result = tool.execute(json!({"cmd": ["ls"]}), &ctx()).await.unwrap();
    assert!(!result.is_error);
    assert!(result.content.contains("marker.txt"));
}

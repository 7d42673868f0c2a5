use crate::agent::tools::base::{ExecutionContext, Tool, ToolResult};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Programs rejected outright, matched by lowercase basename.
const DANGEROUS: &[&str] = &[
    "rm", "sudo", "dd", "mkfs", "shutdown", "reboot", "bash", "sh", "zsh", "nc", "netcat", "nmap",
];

/// Programs that accept `-c` with inline source code; their arguments get
/// relaxed validation.
const INTERPRETERS: &[&str] = &["python", "python3", "perl", "ruby", "node"];

/// Package managers whose arguments (package names, flags like `--user`) are
/// safe; only directory traversal is rejected.
const PACKAGE_MANAGERS: &[&str] = &["pip", "pip3", "uv"];

/// Environment variables safe to pass through to child processes. Everything
/// else (API keys, tokens) is scrubbed.
const ALLOWED_ENV_VARS: &[&str] = &[
    "PATH", "HOME", "USER", "LANG", "LC_ALL", "TZ", "TERM", "RUST_LOG", "TMPDIR",
];

fn basename_lower(prog: &str) -> String {
    Path::new(prog)
        .file_name()
        .map_or_else(|| prog.to_string(), |n| n.to_string_lossy().to_string())
        .to_lowercase()
}

fn is_dangerous_prog(prog: &str) -> bool {
    DANGEROUS.contains(&basename_lower(prog).as_str())
}

fn is_interpreter(prog: &str) -> bool {
    INTERPRETERS.contains(&basename_lower(prog).as_str())
}

fn is_package_manager(prog: &str) -> bool {
    PACKAGE_MANAGERS.contains(&basename_lower(prog).as_str())
}

/// Generic unsafe-argument predicate: path separators, home expansion,
/// directory traversal, and shell metacharacters that could chain commands
/// if the spawned binary shells out.
fn has_unsafe_arg(arg: &str) -> bool {
    if arg.contains('/') || arg.contains("..") || arg.contains('~') {
        return true;
    }
    arg.chars()
        .any(|c| matches!(c, ';' | '&' | '|' | '>' | '<' | '$' | '`'))
}

/// Runs external programs under an argument-level security policy.
///
/// Only the array command form is accepted; a shell string is rejected to
/// prevent injection. Validation is per-program: a dangerous blacklist, a
/// relaxed interpreter mode (`-c` inline code, workspace-contained script
/// paths), a package-manager mode (only `..` rejected), and a strict generic
/// predicate for everything else.
pub struct ExecTool {
    timeout_secs: u64,
    workspace: Option<PathBuf>,
}

impl ExecTool {
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            timeout_secs: if timeout_secs == 0 {
                DEFAULT_TIMEOUT_SECS
            } else {
                timeout_secs
            },
            workspace: None,
        }
    }

    /// Restrict execution to the given workspace: it becomes the working
    /// directory and the containment root for interpreter script paths.
    pub fn with_workspace(timeout_secs: u64, workspace: impl Into<PathBuf>) -> Self {
        let workspace: PathBuf = workspace.into();
        let workspace = workspace.canonicalize().unwrap_or(workspace);
        Self {
            workspace: Some(workspace),
            ..Self::new(timeout_secs)
        }
    }

    /// Validate the argv and return it (with interpreter script paths
    /// rewritten to workspace-relative form) or a rejection message.
    fn validate(&self, cmd: &Value) -> std::result::Result<Vec<String>, String> {
        if cmd.is_string() {
            return Err("exec: string commands are disallowed; use array form".to_string());
        }
        let Some(raw) = cmd.as_array() else {
            return Err("exec: unsupported cmd type".to_string());
        };
        if raw.is_empty() {
            return Err("exec: empty cmd array".to_string());
        }
        let mut argv = Vec::with_capacity(raw.len());
        for item in raw {
            match item.as_str() {
                Some(s) => argv.push(s.to_string()),
                None => return Err("exec: cmd array must contain strings only".to_string()),
            }
        }

        let prog = argv[0].clone();
        if is_dangerous_prog(&prog) {
            return Err(format!("exec: program '{}' is disallowed", prog));
        }

        let interpreter_mode = is_interpreter(&prog);
        let pkg_mgr_mode = is_package_manager(&prog);

        // A common model hallucination: `uv run pip ...` is not valid uv
        // syntax, so catch it with a corrective message.
        if basename_lower(&prog) == "uv"
            && argv.get(1).map(String::as_str) == Some("run")
            && matches!(argv.get(2).map(String::as_str), Some("pip" | "pip3"))
        {
            return Err(
                "exec: 'uv run pip' is not valid syntax; use 'uv pip ...' instead".to_string(),
            );
        }

        for idx in 1..argv.len() {
            let arg = argv[idx].clone();
            if pkg_mgr_mode {
                if arg.contains("..") {
                    return Err(format!("exec: argument '{}' looks unsafe", arg));
                }
                continue;
            }
            if interpreter_mode {
                // Inline source after -c may contain anything
                if idx == 2 && argv.len() >= 3 && argv[1] == "-c" {
                    continue;
                }
                // First argument is a script path: relative paths pass,
                // in-workspace absolute paths are rewritten relative,
                // traversal is always rejected.
                if idx == 1 && arg != "-c" && !arg.contains("..") {
                    if let (true, Some(workspace)) = (arg.starts_with('/'), &self.workspace) {
                        match Path::new(&arg).strip_prefix(workspace) {
                            Ok(rel) => {
                                argv[idx] = rel.to_string_lossy().to_string();
                            }
                            Err(_) => {
                                return Err(format!(
                                    "exec: script path '{}' is outside workspace",
                                    arg
                                ));
                            }
                        }
                    }
                    continue;
                }
            }
            if has_unsafe_arg(&arg) {
                return Err(format!("exec: argument '{}' looks unsafe", arg));
            }
        }

        Ok(argv)
    }
}

#[async_trait]
impl Tool for ExecTool {
    fn name(&self) -> &str {
        "exec"
    }

    fn description(&self) -> &str {
        "Execute shell commands (array form only, restricted for safety)"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "cmd": {
                    "type": "array",
                    "description": "Command as array [program, arg1, arg2, ...]. String form is disallowed for security.",
                    "items": {"type": "string"},
                    "minItems": 1
                }
            },
            "required": ["cmd"]
        })
    }

    fn execution_timeout(&self) -> Duration {
        // Leave headroom so the subprocess timeout fires first
        Duration::from_secs(self.timeout_secs + 5)
    }

    async fn execute(&self, params: Value, _ctx: &ExecutionContext) -> Result<ToolResult> {
        let Some(cmd) = params.get("cmd") else {
            return Ok(ToolResult::error("exec: 'cmd' argument required"));
        };

        let argv = match self.validate(cmd) {
            Ok(argv) => argv,
            Err(msg) => return Ok(ToolResult::error(msg)),
        };
        debug!("exec: spawning {:?}", argv);

        let mut command = tokio::process::Command::new(&argv[0]);
        command.args(&argv[1..]);
        // Scrubbed environment: only the allowlist passes through
        command.env_clear();
        for &var in ALLOWED_ENV_VARS {
            if let Ok(val) = std::env::var(var) {
                command.env(var, val);
            }
        }
        if let Some(workspace) = &self.workspace {
            command.current_dir(workspace);
        }
        command.kill_on_drop(true);

        let output = tokio::time::timeout(Duration::from_secs(self.timeout_secs), command.output())
            .await;

        match output {
            Ok(Ok(output)) => {
                let mut combined = String::from_utf8_lossy(&output.stdout).to_string();
                combined.push_str(&String::from_utf8_lossy(&output.stderr));
                let combined = combined.trim_end_matches('\n').to_string();
                if output.status.success() {
                    Ok(ToolResult::new(combined))
                } else {
                    let code = output
                        .status
                        .code()
                        .map_or_else(|| "signal".to_string(), |c| c.to_string());
                    Ok(ToolResult::error(format!(
                        "exec: command failed (exit {}): {}",
                        code, combined
                    )))
                }
            }
            Ok(Err(e)) => {
                warn!("exec: spawn failed for {:?}: {}", argv, e);
                Ok(ToolResult::error(format!("exec: {}", e)))
            }
            Err(_) => Ok(ToolResult::error(format!(
                "exec: command timed out after {}s",
                self.timeout_secs
            ))),
        }
    }
}

#[cfg(test)]
mod tests;

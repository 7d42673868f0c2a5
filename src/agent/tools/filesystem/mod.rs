use crate::agent::tools::base::{ExecutionContext, Tool, ToolResult};
use crate::utils::lexical_normalize;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

/// Filesystem access confined to the workspace. Relative paths resolve
/// against the workspace root; any resolved path escaping it is rejected.
pub struct FsTool {
    workspace: PathBuf,
}

impl FsTool {
    pub fn new(workspace: impl Into<PathBuf>) -> Self {
        let workspace: PathBuf = workspace.into();
        let workspace = workspace.canonicalize().unwrap_or(workspace);
        Self { workspace }
    }

    /// Resolve a user-supplied path inside the workspace, or explain why not.
    fn resolve(&self, raw: &str) -> std::result::Result<PathBuf, String> {
        if raw.is_empty() {
            return Err("fs: 'path' must not be empty".to_string());
        }
        let candidate = Path::new(raw);
        let joined = if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.workspace.join(candidate)
        };
        let resolved = lexical_normalize(&joined);
        if !resolved.starts_with(&self.workspace) {
            return Err(format!("fs: path '{}' is outside the workspace", raw));
        }
        Ok(resolved)
    }

    fn read(&self, path: &Path) -> ToolResult {
        match std::fs::read_to_string(path) {
            Ok(content) => ToolResult::new(content),
            Err(e) => ToolResult::error(format!("fs: error reading file: {}", e)),
        }
    }

    fn write(&self, path: &Path, content: &str) -> ToolResult {
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                return ToolResult::error(format!("fs: error creating directories: {}", e));
            }
        }
        match std::fs::write(path, content) {
            Ok(()) => ToolResult::new(format!("written: {}", path.display())),
            Err(e) => ToolResult::error(format!("fs: error writing file: {}", e)),
        }
    }

    fn list(&self, path: &Path) -> ToolResult {
        match std::fs::read_dir(path) {
            Ok(rd) => {
                let mut entries: Vec<String> = rd
                    .flatten()
                    .map(|entry| {
                        let name = entry.file_name().to_string_lossy().to_string();
                        if entry.path().is_dir() {
                            format!("{}/", name)
                        } else {
                            name
                        }
                    })
                    .collect();
                entries.sort();
                ToolResult::new(entries.join("\n"))
            }
            Err(e) => ToolResult::error(format!("fs: error reading directory: {}", e)),
        }
    }
}

#[async_trait]
impl Tool for FsTool {
    fn name(&self) -> &str {
        "fs"
    }

    fn description(&self) -> &str {
        "Read, write, and list files inside the agent workspace"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "action": {
                    "type": "string",
                    "enum": ["read", "write", "list"],
                    "description": "Operation to perform"
                },
                "path": {
                    "type": "string",
                    "description": "Path relative to the workspace root"
                },
                "content": {
                    "type": "string",
                    "description": "Content to write (for action=write)"
                }
            },
            "required": ["action", "path"]
        })
    }

    async fn execute(&self, params: Value, _ctx: &ExecutionContext) -> Result<ToolResult> {
        let Some(action) = params["action"].as_str() else {
            return Ok(ToolResult::error("fs: 'action' argument required"));
        };
        let Some(raw_path) = params["path"].as_str() else {
            return Ok(ToolResult::error("fs: 'path' argument required"));
        };

        let path = match self.resolve(raw_path) {
            Ok(path) => path,
            Err(msg) => return Ok(ToolResult::error(msg)),
        };

        Ok(match action {
            "read" => self.read(&path),
            "write" => {
                let Some(content) = params["content"].as_str() else {
                    return Ok(ToolResult::error("fs: 'content' required for write"));
                };
                self.write(&path, content)
            }
            "list" => self.list(&path),
            other => ToolResult::error(format!("fs: unknown action '{}'", other)),
        })
    }
}

#[cfg(test)]
mod tests;

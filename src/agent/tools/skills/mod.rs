use crate::agent::skills::SkillsLoader;
use crate::agent::tools::base::{ExecutionContext, Tool, ToolResult};
use crate::utils::lexical_normalize;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

/// Resolve a skill name to its markdown file under the skills subtree,
/// enforcing the same workspace-containment rule as the filesystem tool.
fn resolve_skill_path(skills_dir: &Path, name: &str) -> std::result::Result<PathBuf, String> {
    if name.is_empty() {
        return Err("skill name must not be empty".to_string());
    }
    if name.starts_with('/') || name.contains("..") || name.contains('\\') {
        return Err(format!("skill name '{}' is not allowed", name));
    }
    let candidate = skills_dir.join(format!("{}.md", name));
    let resolved = lexical_normalize(&candidate);
    if !resolved.starts_with(skills_dir) {
        return Err(format!("skill name '{}' escapes the skills directory", name));
    }
    Ok(resolved)
}

fn name_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "name": {
                "type": "string",
                "description": "Skill name (path under skills/, without .md)"
            }
        },
        "required": ["name"]
    })
}

pub struct CreateSkillTool {
    skills_dir: PathBuf,
}

impl CreateSkillTool {
    pub fn new(workspace: impl AsRef<Path>) -> Self {
        Self {
            skills_dir: workspace.as_ref().join("skills"),
        }
    }
}

#[async_trait]
impl Tool for CreateSkillTool {
    fn name(&self) -> &str {
        "create_skill"
    }

    fn description(&self) -> &str {
        "Create or update a skill document under the workspace skills directory"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": {
                    "type": "string",
                    "description": "Skill name (path under skills/, without .md)"
                },
                "content": {
                    "type": "string",
                    "description": "Markdown body of the skill"
                }
            },
            "required": ["name", "content"]
        })
    }

    async fn execute(&self, params: Value, _ctx: &ExecutionContext) -> Result<ToolResult> {
        let Some(name) = params["name"].as_str() else {
            return Ok(ToolResult::error("create_skill: 'name' argument required"));
        };
        let Some(content) = params["content"].as_str() else {
            return Ok(ToolResult::error("create_skill: 'content' argument required"));
        };
        let path = match resolve_skill_path(&self.skills_dir, name) {
            Ok(path) => path,
            Err(msg) => return Ok(ToolResult::error(format!("create_skill: {}", msg))),
        };
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                return Ok(ToolResult::error(format!("create_skill: {}", e)));
            }
        }
        match std::fs::write(&path, content) {
            Ok(()) => Ok(ToolResult::new(format!("skill '{}' saved", name))),
            Err(e) => Ok(ToolResult::error(format!("create_skill: {}", e))),
        }
    }
}

pub struct ListSkillsTool {
    loader: SkillsLoader,
}

impl ListSkillsTool {
    pub fn new(workspace: impl AsRef<Path>) -> Self {
        Self {
            loader: SkillsLoader::new(workspace),
        }
    }
}

#[async_trait]
impl Tool for ListSkillsTool {
    fn name(&self) -> &str {
        "list_skills"
    }

    fn description(&self) -> &str {
        "List available skills with their one-line descriptions"
    }

    fn parameters(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _params: Value, _ctx: &ExecutionContext) -> Result<ToolResult> {
        let skills = self.loader.load_all();
        if skills.is_empty() {
            return Ok(ToolResult::new("no skills found"));
        }
        let listing = skills
            .iter()
            .map(|s| {
                if s.description.is_empty() {
                    s.name.clone()
                } else {
                    format!("{} — {}", s.name, s.description)
                }
            })
            .collect::<Vec<_>>()
            .join("\n");
        Ok(ToolResult::new(listing))
    }
}

pub struct ReadSkillTool {
    skills_dir: PathBuf,
}

impl ReadSkillTool {
    pub fn new(workspace: impl AsRef<Path>) -> Self {
        Self {
            skills_dir: workspace.as_ref().join("skills"),
        }
    }
}

#[async_trait]
impl Tool for ReadSkillTool {
    fn name(&self) -> &str {
        "read_skill"
    }

    fn description(&self) -> &str {
        "Read the full markdown content of a skill"
    }

    fn parameters(&self) -> Value {
        name_schema()
    }

    async fn execute(&self, params: Value, _ctx: &ExecutionContext) -> Result<ToolResult> {
        let Some(name) = params["name"].as_str() else {
            return Ok(ToolResult::error("read_skill: 'name' argument required"));
        };
        let path = match resolve_skill_path(&self.skills_dir, name) {
            Ok(path) => path,
            Err(msg) => return Ok(ToolResult::error(format!("read_skill: {}", msg))),
        };
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(ToolResult::new(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ToolResult::error(
                format!("read_skill: skill '{}' not found", name),
            )),
            Err(e) => Ok(ToolResult::error(format!("read_skill: {}", e))),
        }
    }
}

pub struct DeleteSkillTool {
    skills_dir: PathBuf,
}

impl DeleteSkillTool {
    pub fn new(workspace: impl AsRef<Path>) -> Self {
        Self {
            skills_dir: workspace.as_ref().join("skills"),
        }
    }
}

#[async_trait]
impl Tool for DeleteSkillTool {
    fn name(&self) -> &str {
        "delete_skill"
    }

    fn description(&self) -> &str {
        "Delete a skill document"
    }

    fn parameters(&self) -> Value {
        name_schema()
    }

    async fn execute(&self, params: Value, _ctx: &ExecutionContext) -> Result<ToolResult> {
        let Some(name) = params["name"].as_str() else {
            return Ok(ToolResult::error("delete_skill: 'name' argument required"));
        };
        let path = match resolve_skill_path(&self.skills_dir, name) {
            Ok(path) => path,
            Err(msg) => return Ok(ToolResult::error(format!("delete_skill: {}", msg))),
        };
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(ToolResult::new(format!("skill '{}' deleted", name))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ToolResult::error(
                format!("delete_skill: skill '{}' not found", name),
            )),
            Err(e) => Ok(ToolResult::error(format!("delete_skill: {}", e))),
        }
    }
}

use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// A markdown skill document loaded from the workspace.
#[derive(Debug, Clone)]
pub struct Skill {
    pub name: String,
    pub description: String,
    pub content: String,
}

/// Reads skill documents from `<workspace>/skills/**/*.md`. Pure consumer:
/// the loader never writes; the skill CRUD tools own mutation.
pub struct SkillsLoader {
    skills_dir: PathBuf,
}

impl SkillsLoader {
    pub fn new(workspace: impl AsRef<Path>) -> Self {
        Self {
            skills_dir: workspace.as_ref().join("skills"),
        }
    }

    pub fn skills_dir(&self) -> &Path {
        &self.skills_dir
    }

    /// Load every readable `.md` document under the skills subtree.
    /// Unreadable entries are skipped with a warning.
    pub fn load_all(&self) -> Vec<Skill> {
        if !self.skills_dir.exists() {
            return Vec::new();
        }
        let mut skills = Vec::new();
        for entry in WalkDir::new(&self.skills_dir)
            .sort_by_file_name()
            .into_iter()
            .flatten()
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("md") {
                continue;
            }
            match std::fs::read_to_string(path) {
                Ok(content) => {
                    let name = self.skill_name(path);
                    let description = first_paragraph_line(&content);
                    debug!("loaded skill: {}", name);
                    skills.push(Skill {
                        name,
                        description,
                        content,
                    });
                }
                Err(e) => {
                    warn!("skipping unreadable skill {}: {}", path.display(), e);
                }
            }
        }
        skills
    }

    /// Digest of all loaded skills for the system prompt; empty when none.
    pub fn build_context(&self) -> String {
        let skills = self.load_all();
        if skills.is_empty() {
            return String::new();
        }
        let mut out = String::from("Available Skills:\n");
        for skill in skills {
            out.push_str(&format!(
                "\n## {}\n{}\n\n{}\n",
                skill.name, skill.description, skill.content
            ));
        }
        out
    }

    fn skill_name(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.skills_dir).unwrap_or(path);
        let mut name = relative.to_string_lossy().replace('\\', "/");
        if let Some(stripped) = name.strip_suffix(".md") {
            name = stripped.to_string();
        }
        name
    }
}

/// First non-empty line that is not a markdown heading, used as the skill's
/// one-line description.
fn first_paragraph_line(content: &str) -> String {
    content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'))
        .unwrap_or("")
        .to_string()
}

#[cfg(test)]
mod tests;

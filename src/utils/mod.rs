use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Resolve a workspace path from config, expanding a leading `~`.
pub fn get_workspace_path(configured: &str) -> PathBuf {
    if let Some(stripped) = configured.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    if configured == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(configured)
}

/// Create a directory (and parents) if it does not already exist.
pub fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)
        .with_context(|| format!("Failed to create directory: {}", path.display()))
}

/// Normalize a path lexically (without touching the filesystem).
/// Resolves `.` and `..` components so that `workspace/../etc/passwd`
/// correctly normalizes to `/etc/passwd` rather than passing through
/// as if it starts with `workspace`.
pub fn lexical_normalize(path: &Path) -> PathBuf {
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            std::path::Component::ParentDir => {
                // Pop the last normal component (but never pop past root)
                if matches!(components.last(), Some(std::path::Component::Normal(_))) {
                    components.pop();
                }
            }
            std::path::Component::CurDir => {}
            other => components.push(other),
        }
    }
    components.iter().collect()
}

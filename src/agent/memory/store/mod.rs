use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

const DEFAULT_SHORT_LIMIT: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryKind {
    Short,
    Long,
}

impl MemoryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MemoryKind::Short => "short",
            MemoryKind::Long => "long",
        }
    }
}

impl std::fmt::Display for MemoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemoryItem {
    pub kind: MemoryKind,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Default)]
struct Lists {
    short: Vec<MemoryItem>,
    long: Vec<MemoryItem>,
}

/// In-process short/long memory ring plus on-disk notes under
/// `<workspace>/memory/`.
///
/// The in-memory lists are guarded by a single reader/writer lock so reads are
/// snapshot-consistent. File operations rely on the filesystem's atomic
/// create/append semantics and are not otherwise synchronized.
pub struct MemoryStore {
    memory_dir: PathBuf,
    limit: usize,
    lists: RwLock<Lists>,
}

impl MemoryStore {
    pub fn new(workspace: impl AsRef<Path>) -> Result<Self> {
        Self::with_limit(workspace, DEFAULT_SHORT_LIMIT)
    }

    pub fn with_limit(workspace: impl AsRef<Path>, limit: usize) -> Result<Self> {
        let memory_dir = workspace.as_ref().join("memory");
        std::fs::create_dir_all(&memory_dir).with_context(|| {
            format!("Failed to create memory directory: {}", memory_dir.display())
        })?;
        Ok(Self {
            memory_dir,
            limit: if limit == 0 { DEFAULT_SHORT_LIMIT } else { limit },
            lists: RwLock::new(Lists::default()),
        })
    }

    pub fn add_short(&self, text: impl Into<String>) {
        let item = MemoryItem {
            kind: MemoryKind::Short,
            text: text.into(),
            timestamp: Utc::now(),
        };
        let mut lists = self.lists.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        lists.short.push(item);
        // Drop oldest entries past the cap
        if lists.short.len() > self.limit {
            let overflow = lists.short.len() - self.limit;
            lists.short.drain(..overflow);
        }
    }

    pub fn add_long(&self, text: impl Into<String>) {
        let item = MemoryItem {
            kind: MemoryKind::Long,
            text: text.into(),
            timestamp: Utc::now(),
        };
        let mut lists = self.lists.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        lists.long.push(item);
    }

    /// Up to `n` most recent items: short entries newest-first, then long
    /// entries newest-first.
    pub fn recent(&self, n: usize) -> Vec<MemoryItem> {
        if n == 0 {
            return Vec::new();
        }
        let lists = self.lists.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut out = Vec::with_capacity(n.min(lists.short.len() + lists.long.len()));
        for item in lists.short.iter().rev() {
            if out.len() >= n {
                break;
            }
            out.push(item.clone());
        }
        for item in lists.long.iter().rev() {
            if out.len() >= n {
                break;
            }
            out.push(item.clone());
        }
        out
    }

    /// Case-insensitive substring search in the same traversal order as
    /// [`recent`](Self::recent).
    pub fn query_by_keyword(&self, keyword: &str, n: usize) -> Vec<MemoryItem> {
        if n == 0 || keyword.is_empty() {
            return Vec::new();
        }
        let needle = keyword.to_lowercase();
        let lists = self.lists.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut out = Vec::new();
        for item in lists.short.iter().rev() {
            if out.len() >= n {
                break;
            }
            if item.text.to_lowercase().contains(&needle) {
                out.push(item.clone());
            }
        }
        for item in lists.long.iter().rev() {
            if out.len() >= n {
                break;
            }
            if item.text.to_lowercase().contains(&needle) {
                out.push(item.clone());
            }
        }
        out
    }

    fn long_term_path(&self) -> PathBuf {
        self.memory_dir.join("MEMORY.md")
    }

    fn today_path(&self) -> PathBuf {
        let name = format!("{}.md", Utc::now().format("%Y-%m-%d"));
        self.memory_dir.join(name)
    }

    /// Read `MEMORY.md`; a missing file is an empty string, not an error.
    pub fn read_long_term(&self) -> Result<String> {
        match std::fs::read_to_string(self.long_term_path()) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e).context("Failed to read MEMORY.md"),
        }
    }

    /// Overwrite `MEMORY.md`.
    pub fn write_long_term(&self, content: &str) -> Result<()> {
        std::fs::create_dir_all(&self.memory_dir)?;
        std::fs::write(self.long_term_path(), content).context("Failed to write MEMORY.md")
    }

    /// Read today's daily note (UTC); missing file yields an empty string.
    pub fn read_today(&self) -> Result<String> {
        match std::fs::read_to_string(self.today_path()) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e).context("Failed to read today's note"),
        }
    }

    /// Append a timestamped line to today's daily note, creating it on first
    /// use.
    pub fn append_today(&self, text: &str) -> Result<()> {
        std::fs::create_dir_all(&self.memory_dir)?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.today_path())
            .context("Failed to open today's note")?;
        writeln!(file, "[{}] {}", Utc::now().to_rfc3339(), text)
            .context("Failed to append to today's note")
    }

    /// Join the last `days` daily notes, newest first, with `---` separators.
    pub fn recent_notes(&self, days: usize) -> Result<String> {
        let days = days.max(1);
        let mut parts = Vec::new();
        for i in 0..days {
            let day = Utc::now() - chrono::Duration::days(i as i64);
            let path = self.memory_dir.join(format!("{}.md", day.format("%Y-%m-%d")));
            match std::fs::read_to_string(&path) {
                Ok(content) => parts.push(content),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e).context("Failed to read daily note"),
            }
        }
        Ok(parts.join("\n---\n"))
    }

    /// Combined long-term memory and today's note for the system prompt.
    pub fn get_memory_context(&self) -> Result<String> {
        let long_term = self.read_long_term()?;
        let today = self.read_today()?;
        Ok(match (long_term.is_empty(), today.is_empty()) {
            (true, true) => String::new(),
            (true, false) => today,
            (false, true) => long_term,
            (false, false) => format!("{}\n\n---\n\n{}", long_term, today),
        })
    }
}

#[cfg(test)]
mod tests;

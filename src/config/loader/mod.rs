use crate::config::schema::Config;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Path of the config file: `$PICOBOT_HOME/config.json` when set, otherwise
/// `~/.picobot/config.json`.
pub fn get_config_path() -> PathBuf {
    if let Ok(home) = std::env::var("PICOBOT_HOME") {
        if !home.trim().is_empty() {
            return PathBuf::from(home.trim()).join("config.json");
        }
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".picobot")
        .join("config.json")
}

/// Load the config file (missing file yields defaults), then apply
/// environment-variable overrides. Both `GIO_` and `PICOBOT_` prefixes are
/// accepted, plus the ecosystem-standard names.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = path.map_or_else(get_config_path, Path::to_path_buf);

    let mut cfg = if path.exists() {
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?
    } else {
        Config::default()
    };

    apply_env_overrides(&mut cfg);
    Ok(cfg)
}

/// Write the config as pretty-printed JSON, creating parent directories.
pub fn save_config(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
    }
    let raw = serde_json::to_string_pretty(config).context("Failed to serialize config")?;
    std::fs::write(path, raw)
        .with_context(|| format!("Failed to write config file: {}", path.display()))
}

fn env_first(keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Ok(val) = std::env::var(key) {
            let val = val.trim().to_string();
            if !val.is_empty() {
                return Some(val);
            }
        }
    }
    None
}

fn env_int(keys: &[&str]) -> Option<u64> {
    env_first(keys).and_then(|v| v.parse().ok())
}

fn apply_env_overrides(cfg: &mut Config) {
    if let Some(key) = env_first(&["GIO_LLM_API_KEY", "PICOBOT_LLM_API_KEY", "OPENAI_API_KEY"]) {
        if key.ends_with("...") {
            warn!("LLM API key looks truncated (ends with '...')");
        }
        cfg.providers.openai.api_key = key;
    }
    if let Some(key) = env_first(&[
        "GIO_ANTHROPIC_API_KEY",
        "PICOBOT_ANTHROPIC_API_KEY",
        "ANTHROPIC_API_KEY",
    ]) {
        cfg.providers.anthropic.api_key = key;
    }
    if let Some(base) = env_first(&["GIO_LLM_API_BASE", "PICOBOT_LLM_API_BASE", "OPENAI_API_BASE"])
    {
        cfg.providers.openai.api_base = Some(base.trim_end_matches('/').to_string());
    }
    if let Some(base) = env_first(&["GIO_ANTHROPIC_API_BASE", "ANTHROPIC_API_BASE"]) {
        cfg.providers.anthropic.api_base = Some(base.trim_end_matches('/').to_string());
    }
    if let Some(model) = env_first(&["GIO_LLM_MODEL", "PICOBOT_LLM_MODEL", "PICOBOT_MODEL"]) {
        cfg.agents.defaults.model = model;
    }

    if let Some(token) = env_first(&["GIO_TELEGRAM_TOKEN", "PICOBOT_TELEGRAM_TOKEN"]) {
        cfg.channels.telegram.token = token;
        // A token arriving via env implies the channel should run
        cfg.channels.telegram.enabled = true;
    }
    if let Some(allowed) = env_first(&[
        "GIO_TELEGRAM_ALLOWED_USERS",
        "PICOBOT_TELEGRAM_ALLOWED_USERS",
        "TELEGRAM_ALLOW_FROM",
    ]) {
        cfg.channels.telegram.allow_from = allowed
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }

    if let Some(v) = env_int(&["GIO_MAX_TOKENS", "PICOBOT_MAX_TOKENS"]) {
        if v > 0 {
            cfg.agents.defaults.max_tokens = v as u32;
        }
    }
    if let Some(v) = env_int(&["GIO_HEARTBEAT_INTERVAL", "PICOBOT_HEARTBEAT_INTERVAL"]) {
        if v > 0 {
            cfg.agents.defaults.heartbeat_interval_s = v;
        }
    }
    if let Some(v) = env_int(&["GIO_REQUEST_TIMEOUT", "PICOBOT_REQUEST_TIMEOUT"]) {
        if v > 0 {
            cfg.agents.defaults.request_timeout_s = v;
        }
    }
}

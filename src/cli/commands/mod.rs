use crate::agent::{AgentLoop, AgentLoopConfig};
use crate::bus::MessageBus;
use crate::channels::ChannelManager;
use crate::config::{get_config_path, load_config, save_config, Config};
use crate::heartbeat::HeartbeatService;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write as _;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "picobot")]
#[command(about = "Personal AI assistant runtime", version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config and workspace templates
    Onboard,
    /// Run the full runtime: channels, heartbeat, and the agent loop
    Gateway {
        /// Override the configured model
        #[arg(long)]
        model: Option<String>,
    },
    /// Talk to the agent directly from the terminal
    Agent {
        /// One-shot message; omit for an interactive session
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Show configuration and workspace status
    Status,
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Onboard => onboard(),
        Commands::Gateway { model } => gateway(model).await,
        Commands::Agent { message } => agent(message).await,
        Commands::Status => status(),
    }
}

fn agent_loop_config(
    config: &Config,
    bus: Arc<Mutex<MessageBus>>,
    model: Option<String>,
) -> AgentLoopConfig {
    let defaults = &config.agents.defaults;
    AgentLoopConfig {
        bus,
        provider: crate::providers::create_provider(config),
        workspace: config.workspace_path(),
        model: model.or_else(|| {
            if defaults.model.is_empty() {
                None
            } else {
                Some(defaults.model.clone())
            }
        }),
        max_tool_iterations: defaults.max_tool_iterations,
        max_tokens: defaults.max_tokens,
        temperature: defaults.temperature,
        exec_timeout_s: 60,
        memory_top_k: 5,
    }
}

async fn gateway(model: Option<String>) -> Result<()> {
    let config = load_config(None)?;
    let workspace = config.workspace_path();
    crate::utils::ensure_dir(&workspace)
        .with_context(|| format!("workspace is not writable: {}", workspace.display()))?;

    let mut bus = MessageBus::default();
    let inbound_tx = bus.inbound_tx.clone();
    let outbound_rx = bus
        .take_outbound_rx()
        .ok_or_else(|| anyhow::anyhow!("outbound receiver already taken"))?;
    let bus = Arc::new(Mutex::new(bus));

    let agent = Arc::new(AgentLoop::new(agent_loop_config(&config, bus, model)).await?);

    let heartbeat = HeartbeatService::new(
        workspace.clone(),
        inbound_tx.clone(),
        config.agents.defaults.heartbeat_interval_s,
    );
    heartbeat.start().await;

    let mut channels = ChannelManager::new(&config, inbound_tx);
    channels.start_all().await?;
    println!("picobot gateway running (channels: {:?})", channels.enabled_channels());

    let agent_task = {
        let agent = agent.clone();
        tokio::spawn(async move { agent.run().await })
    };
    let dispatcher_task = tokio::spawn(async move {
        channels.run_outbound_dispatcher(outbound_rx).await;
    });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            println!("\nshutting down...");
            heartbeat.stop().await?;
            agent.stop().await;
        }
        result = agent_task => {
            if let Err(e) = result {
                warn!("agent loop task ended: {}", e);
            }
        }
        _ = dispatcher_task => {}
    }

    Ok(())
}

async fn agent(message: Option<String>) -> Result<()> {
    let config = load_config(None)?;
    let bus = Arc::new(Mutex::new(MessageBus::default()));
    let agent = AgentLoop::new(agent_loop_config(&config, bus, None)).await?;

    if let Some(message) = message {
        let reply = agent.process_direct(&message).await?;
        println!("{}", reply);
        return Ok(());
    }

    // Interactive session: one turn per stdin line
    println!("picobot interactive session (ctrl-d to exit)");
    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match agent.process_direct(line).await {
            Ok(reply) => println!("{}", reply),
            Err(e) => warn!("turn failed: {}", e),
        }
    }
    Ok(())
}

fn status() -> Result<()> {
    let config_path = get_config_path();
    let config = load_config(None)?;
    let workspace = config.workspace_path();

    println!("config:    {} ({})", config_path.display(), if config_path.exists() { "present" } else { "missing" });
    println!("workspace: {} ({})", workspace.display(), if workspace.exists() { "present" } else { "missing" });
    println!("model:     {}", if config.agents.defaults.model.is_empty() { "(provider default)" } else { &config.agents.defaults.model });
    println!(
        "providers: openai={} anthropic={}",
        if config.providers.openai.api_key.is_empty() { "unset" } else { "configured" },
        if config.providers.anthropic.api_key.is_empty() { "unset" } else { "configured" },
    );
    println!(
        "telegram:  {}",
        if config.channels.telegram.enabled { "enabled" } else { "disabled" }
    );
    Ok(())
}

fn onboard() -> Result<()> {
    let config_path = get_config_path();
    if config_path.exists() {
        println!("config already exists at {}", config_path.display());
    } else {
        let config = Config::default();
        save_config(&config, &config_path)?;
        println!("created config at {}", config_path.display());
    }

    let config = load_config(None)?;
    let workspace = config.workspace_path();
    crate::utils::ensure_dir(&workspace.join("memory"))
        .with_context(|| format!("workspace is not writable: {}", workspace.display()))?;
    crate::utils::ensure_dir(&workspace.join("skills"))?;
    write_workspace_templates(&workspace)?;
    println!("workspace ready at {}", workspace.display());

    println!("\nnext steps:");
    println!("  1. add an API key to {} (or set ANTHROPIC_API_KEY / OPENAI_API_KEY)", config_path.display());
    println!("  2. chat: picobot agent -m \"Hello!\"");
    Ok(())
}

/// Write default workspace markdowns. Existing files are never overwritten.
fn write_workspace_templates(workspace: &std::path::Path) -> Result<()> {
    let templates: &[(&str, &str)] = &[
        (
            "SOUL.md",
            "# Soul\n\nI am Gio, a personal AI assistant.\n\n\
             - Friendly but professional\n\
             - Direct and concise, with detail when needed\n\
             - Accuracy over speed\n",
        ),
        (
            "AGENTS.md",
            "# Agents\n\n\
             ## Behavioral Rules\n\n\
             - Reply directly with text for normal conversation; the reply is \
             delivered automatically.\n\
             - Use tools for real actions (files, shell, web). Never claim an \
             action happened without calling the tool.\n\
             - Ask for clarification when the request is ambiguous.\n",
        ),
        (
            "USER.md",
            "# User\n\nInformation about the user goes here.\n\n\
             ## Preferences\n\n\
             - Communication style: (casual/formal)\n\
             - Timezone: (your timezone)\n",
        ),
        (
            "TOOLS.md",
            "# Tool Notes\n\nNotes and configuration details for tools.\n",
        ),
        (
            "HEARTBEAT.md",
            "",
        ),
        (
            "memory/MEMORY.md",
            "# Long-term Memory\n\n## About the User\n\n(Important facts about the user)\n",
        ),
    ];

    for (rel, content) in templates {
        let path = workspace.join(rel);
        if path.exists() {
            continue;
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, content)?;
        info!("created {}", path.display());
    }
    Ok(())
}

//! agentwire: talk to A2A agents from the terminal
//!
//! Usage:
//!   agentwire agents
//!   agentwire card speaker
//!   agentwire run speaker "Say hello" --session conv-1
//!   agentwire call nifi optimize_pipeline --data '{"id": "abc"}'
//!   agentwire chat speaker
//!
//! Agents come from `~/.agentwire/config.toml`:
//!   [[agents]]
//!   name = "speaker"
//!   url = "http://localhost:8003"

mod chat;
mod config;
mod context;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use std::path::PathBuf;
use tracing::info;

use agentwire_a2a::AgentMetadata;

use crate::chat::ChatSession;
use crate::config::Config;
use crate::context::AppContext;

#[derive(Parser)]
#[command(name = "agentwire", version, about = "Call A2A agents by name")]
struct Cli {
    /// Path to config file (default: ~/.agentwire/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Register or override an agent: NAME=URL (repeatable)
    #[arg(long = "agent-url", value_name = "NAME=URL", value_parser = parse_agent_url, global = true)]
    agent_urls: Vec<(String, String)>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List registered agents
    Agents,
    /// Show an agent's capability document
    Card {
        agent: String,
        /// Print the raw JSON document
        #[arg(long)]
        raw: bool,
    },
    /// Send one message to an agent's /run endpoint
    Run {
        agent: String,
        message: String,
        /// Conversation correlation id
        #[arg(long)]
        session: Option<String>,
        /// JSON object passed as context
        #[arg(long)]
        context: Option<String>,
    },
    /// Call a custom endpoint advertised by the agent
    Call {
        agent: String,
        endpoint: String,
        /// JSON body (default: {})
        #[arg(long)]
        data: Option<String>,
    },
    /// Interactive chat session
    Chat {
        /// Agent to chat with (default: [chat].agent from config)
        agent: Option<String>,
    },
}

fn parse_agent_url(s: &str) -> std::result::Result<(String, String), String> {
    let (name, url) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=URL, got '{}'", s))?;
    let (name, url) = (name.trim(), url.trim());
    if name.is_empty() || url.is_empty() {
        return Err(format!("expected NAME=URL, got '{}'", s));
    }
    Ok((name.to_string(), url.to_string()))
}

fn parse_object(raw: Option<&str>, what: &str) -> Result<Map<String, Value>> {
    let Some(raw) = raw else {
        return Ok(Map::new());
    };
    match serde_json::from_str(raw).with_context(|| format!("--{} is not valid JSON", what))? {
        Value::Object(map) => Ok(map),
        _ => bail!("--{} must be a JSON object", what),
    }
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_card(metadata: &AgentMetadata) -> Result<()> {
    let Some(card) = metadata.card() else {
        return print_json(&Value::Object(metadata.as_map().clone()));
    };

    println!("{}", card.name);
    if !card.description.is_empty() {
        println!("  {}", card.description);
    }
    if let Some(version) = &card.version {
        println!("  version: {}", version);
    }
    if let Some(url) = &card.url {
        println!("  url: {}", url);
    }
    println!(
        "  streaming: {}, push notifications: {}",
        card.capabilities.streaming, card.capabilities.push_notifications
    );
    match metadata.endpoints() {
        Some(endpoints) if !endpoints.is_empty() => println!("  endpoints: {}", endpoints.join(", ")),
        Some(_) => println!("  endpoints: (none)"),
        None => println!("  endpoints: (not advertised)"),
    }
    for skill in &card.skills {
        println!("  - {} ({})", skill.name, skill.id);
        if !skill.description.is_empty() {
            println!("      {}", skill.description);
        }
        if !skill.tags.is_empty() {
            println!("      tags: {}", skill.tags.join(", "));
        }
    }
    Ok(())
}

async fn dispatch(ctx: &AppContext, command: Command) -> Result<()> {
    match command {
        Command::Agents => {
            if ctx.registry.is_empty() {
                println!("No agents registered.");
            }
            for name in ctx.registry.names() {
                println!("{:<20} {}", name, ctx.registry.get_agent_url(name)?);
            }
        }
        Command::Card { agent, raw } => {
            let client = ctx.client(&agent)?;
            let metadata = client
                .get_metadata()
                .await
                .with_context(|| format!("Failed to fetch card for '{}'", agent))?;
            if raw {
                print_json(&Value::Object(metadata.as_map().clone()))?;
            } else {
                print_card(&metadata)?;
            }
        }
        Command::Run {
            agent,
            message,
            session,
            context,
        } => {
            let context = parse_object(context.as_deref(), "context")?;
            let client = ctx.client(&agent)?;
            let reply = client
                .run(&message, context, session.as_deref())
                .await
                .with_context(|| format!("Agent '{}' /run failed", agent))?;
            print_json(&reply)?;
        }
        Command::Call {
            agent,
            endpoint,
            data,
        } => {
            let data = Value::Object(parse_object(data.as_deref(), "data")?);
            let client = ctx.client(&agent)?;
            let reply = client
                .call_endpoint(&endpoint, &data)
                .await
                .with_context(|| format!("Agent '{}' /{} failed", agent, endpoint))?;
            print_json(&reply)?;
        }
        Command::Chat { agent } => {
            let Some(agent) = agent.or_else(|| ctx.config.chat.agent.clone()) else {
                bail!("No agent given and no [chat].agent in config");
            };
            let client = ctx.client(&agent)?;
            let session = ChatSession::new(ctx.config.chat.user_id.clone());
            chat::run_chat(&agent, &client, session).await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load(cli.config.as_deref())?;
    let ctx = AppContext::build(config, &cli.agent_urls)?;

    let result = dispatch(&ctx, cli.command).await;
    info!("agentwire shutting down");
    result
}

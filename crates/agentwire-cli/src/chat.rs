//! Interactive terminal chat against an agent's `/run` endpoint

use anyhow::Result;
use serde_json::{Map, Value, json};
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use uuid::Uuid;

use agentwire_a2a::{A2aError, AgentClient};

const NO_MESSAGE: &str = "(No message received)";

/// Where a reply's audio ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioLocation {
    LocalFile(PathBuf),
    Remote(String),
}

impl AudioLocation {
    pub fn classify(location: &str) -> Self {
        if let Some(path) = location.strip_prefix("file://") {
            return Self::LocalFile(PathBuf::from(path));
        }
        if Path::new(location).exists() {
            return Self::LocalFile(PathBuf::from(location));
        }
        Self::Remote(location.to_string())
    }
}

/// The parts of a `/run` reply the chat cares about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub message: String,
    pub audio: Option<AudioLocation>,
}

impl ChatReply {
    pub fn from_value(reply: &Value) -> Self {
        let message = reply
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or(NO_MESSAGE)
            .to_string();
        let audio = reply
            .pointer("/data/audio_url")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(AudioLocation::classify);
        Self { message, audio }
    }

    pub fn render(&self) -> String {
        let mut out = self.message.clone();
        match &self.audio {
            Some(AudioLocation::LocalFile(path)) if path.exists() => {
                out.push_str(&format!("\n  [audio saved at {}]", path.display()));
            }
            Some(AudioLocation::LocalFile(path)) => {
                out.push_str(&format!("\n  [audio file not found: {}]", path.display()));
            }
            Some(AudioLocation::Remote(url)) => {
                out.push_str(&format!("\n  [audio available at: {}]", url));
            }
            None => {}
        }
        out
    }
}

/// Conversation identity sent along with every message
#[derive(Debug, Clone)]
pub struct ChatSession {
    pub user_id: String,
    pub session_id: String,
}

impl ChatSession {
    pub fn new(user_id: Option<String>) -> Self {
        Self {
            user_id: user_id.unwrap_or_else(|| format!("user-{}", Uuid::new_v4())),
            session_id: new_conversation_id(),
        }
    }

    /// Start a new conversation, keeping the user
    pub fn reset(&mut self) {
        self.session_id = new_conversation_id();
    }

    pub fn context(&self) -> Map<String, Value> {
        let mut context = Map::new();
        context.insert("user_id".to_string(), json!(self.user_id));
        context
    }
}

fn new_conversation_id() -> String {
    format!("conv-{}", Uuid::new_v4())
}

enum Input {
    Quit,
    NewConversation,
    Empty,
    Message(String),
}

fn classify_input(line: &str) -> Input {
    let line = line.trim();
    match line.to_lowercase().as_str() {
        "" => Input::Empty,
        "quit" | "exit" => Input::Quit,
        "/new" => Input::NewConversation,
        _ => Input::Message(line.to_string()),
    }
}

/// Run the chat loop on stdin until EOF, `quit`, or Ctrl-C
pub async fn run_chat(agent_name: &str, client: &AgentClient, session: ChatSession) -> Result<()> {
    println!("Chatting with '{}' at {}", agent_name, client.base_url());
    println!("User ID: {}", session.user_id);
    println!("Conversation ID: {}", session.session_id);
    println!("Type '/new' for a new conversation, 'quit' to leave.\n");

    let stdin = BufReader::new(tokio::io::stdin());
    chat_loop(agent_name, client, session, stdin, tokio::signal::ctrl_c()).await
}

/// Core loop. `shutdown` is watched both while waiting for input and while a
/// request is in flight; when it fires the pending request is dropped.
async fn chat_loop<R, S>(
    agent_name: &str,
    client: &AgentClient,
    mut session: ChatSession,
    reader: R,
    shutdown: S,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    S: Future,
{
    let mut lines = reader.lines();
    tokio::pin!(shutdown);

    loop {
        print!("you> ");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = &mut shutdown => {
                println!();
                info!("Interrupted, leaving chat");
                break;
            }
        };
        let Some(line) = line else { break };

        match classify_input(&line) {
            Input::Empty => continue,
            Input::Quit => break,
            Input::NewConversation => {
                session.reset();
                println!("Started new conversation: {}", session.session_id);
            }
            Input::Message(message) => {
                let reply = tokio::select! {
                    reply = client.run(&message, session.context(), Some(&session.session_id)) => reply,
                    _ = &mut shutdown => {
                        println!();
                        info!("Interrupted while waiting for '{}', leaving chat", agent_name);
                        break;
                    }
                };
                match reply {
                    Ok(value) => println!("{}> {}", agent_name, ChatReply::from_value(&value).render()),
                    Err(e @ A2aError::Transport(_)) => {
                        warn!("Could not reach agent: {}", e);
                        println!("Error: could not connect to agent. {}", e);
                    }
                    Err(e) => {
                        warn!("Agent call failed: {}", e);
                        println!("Error: {}", e);
                    }
                }
            }
        }
    }

    Ok(())
}

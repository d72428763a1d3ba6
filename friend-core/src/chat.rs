//! Small-talk fallback: a per-session transcript and an Ollama-compatible
//! chat client.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, time::Duration};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::{config::ChatConfig, provider::truncate_body};

pub const SYSTEM_PROMPT: &str = "You are Weather Friend, a short, funny, and friendly weather chatbot. \
Keep replies under 20 words. Be playful but useful. \
If asked about something you can't check live, give a quick general answer like \
'Not sure right now, but usually sunny there!'. \
Never repeat yourself, never explain, just give one witty response.";

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("chat request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("chat service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("chat service sent an empty reply")]
    EmptyReply,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Anything that can turn a transcript into the next assistant reply.
#[async_trait]
pub trait ChatBackend: Send + Sync + Debug {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ChatError>;
}

/// Conversation state for one user. Append-only; owned by the caller.
#[derive(Debug, Clone)]
pub struct ChatSession {
    transcript: Vec<ChatMessage>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self::with_system_prompt(SYSTEM_PROMPT)
    }

    pub fn with_system_prompt(prompt: &str) -> Self {
        Self {
            transcript: vec![ChatMessage::new(Role::System, prompt)],
        }
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    /// Send `message` and return the reply. Failures come back as a
    /// displayable line instead of an error; the user turn stays recorded.
    pub async fn talk(&mut self, backend: &dyn ChatBackend, message: &str) -> String {
        self.transcript.push(ChatMessage::new(Role::User, message));

        match backend.complete(&self.transcript).await {
            Ok(reply) => {
                self.transcript.push(ChatMessage::new(Role::Assistant, reply.clone()));
                reply
            }
            Err(e) => {
                warn!(error = %e, "chat backend failed");
                format!("⚠️ Error talking to Weather Friend: {e}")
            }
        }
    }
}

/// Client for Ollama's `/api/chat` (self-hosted or ollama.com).
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaResponseMessage {
    content: String,
}

impl OllamaClient {
    pub fn new(
        config: &ChatConfig,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ChatError> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl ChatBackend for OllamaClient {
    #[instrument(skip(self, messages), fields(model = %self.model, turns = messages.len()))]
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ChatError> {
        let mut request = self
            .http
            .post(format!("{}/api/chat", self.base_url))
            .json(&OllamaChatRequest {
                model: &self.model,
                messages,
                stream: false,
            });

        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        debug!("sending chat request");
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let parsed: OllamaChatResponse = response.json().await?;
        let reply = parsed.message.content.trim().to_string();

        if reply.is_empty() {
            return Err(ChatError::EmptyReply);
        }
        Ok(reply)
    }
}

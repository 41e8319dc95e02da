//! Chat-completion gateway
//!
//! The pipeline only sees [`ChatClient`]; the concrete provider is picked
//! from configuration at startup.

mod anthropic;

pub use anthropic::AnthropicClient;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::config::{CallProfile, Config};

/// Role of a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Sampling options for one call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChatOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl From<CallProfile> for ChatOptions {
    fn from(profile: CallProfile) -> Self {
        Self {
            temperature: profile.temperature,
            max_tokens: profile.max_tokens,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub provider: String,
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub options: ChatOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub content: String,
}

/// Turns a prompt into free text. Errors are not classified.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;

    fn provider_name(&self) -> &str;
}

/// Build the client named by `llm.provider`.
pub fn client_from_config(config: &Config) -> Result<Arc<dyn ChatClient>> {
    match config.llm.provider.as_str() {
        "anthropic" => {
            let api_key = config.llm_api_key().unwrap_or_default();
            Ok(Arc::new(AnthropicClient::new(&config.llm, api_key)?))
        }
        other => bail!("Unsupported LLM provider: {}", other),
    }
}

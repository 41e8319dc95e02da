//! In-process doubles shared by unit and router tests

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::Mutex;

use crate::llm::{ChatClient, ChatRequest, ChatResponse};

enum Script {
    Reply(String),
    Fail(String),
}

/// A [`ChatClient`] that answers every call the same way and records requests.
pub struct ScriptedChat {
    script: Script,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedChat {
    pub fn replying(content: impl Into<String>) -> Self {
        Self {
            script: Script::Reply(content.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            script: Script::Fail(message.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatClient for ScriptedChat {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        self.requests.lock().unwrap().push(request);
        match &self.script {
            Script::Reply(content) => Ok(ChatResponse {
                content: content.clone(),
            }),
            Script::Fail(message) => Err(anyhow!("{}", message)),
        }
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }
}

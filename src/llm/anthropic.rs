//! Anthropic Messages API client

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{ChatClient, ChatMessage, ChatRequest, ChatResponse, Role};
use crate::config::LlmConfig;

const API_VERSION: &str = "2023-06-01";
const MAX_BACKOFF_SECS: u64 = 60;

pub struct AnthropicClient {
    client: Client,
    api_key: String,
    base_url: String,
    max_retries: u32,
}

impl AnthropicClient {
    pub fn new(config: &LlmConfig, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_retries: config.max_retries,
        })
    }

    async fn try_request(&self, body: &MessagesRequest) -> Result<MessagesResponse> {
        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .context("Failed to send request to Anthropic API")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            bail!("Anthropic API error ({}): {}", status, error_text);
        }

        response
            .json::<MessagesResponse>()
            .await
            .context("Failed to parse Anthropic API response")
    }
}

#[async_trait]
impl ChatClient for AnthropicClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        if self.api_key.is_empty() {
            bail!("Anthropic API key is not configured");
        }

        let body = MessagesRequest::from_chat(&request);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                tokio::time::sleep(backoff(attempt)).await;
            }

            match self.try_request(&body).await {
                Ok(response) => {
                    tracing::debug!(
                        provider = self.provider_name(),
                        model = %response.model,
                        input_tokens = response.usage.input_tokens,
                        output_tokens = response.usage.output_tokens,
                        "anthropic call complete"
                    );
                    return Ok(ChatResponse {
                        content: response.text(),
                    });
                }
                Err(e) => {
                    if attempt < self.max_retries {
                        tracing::warn!(
                            "Anthropic request failed (attempt {}/{}), retrying: {}",
                            attempt + 1,
                            self.max_retries + 1,
                            e
                        );
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow!("Anthropic request failed")))
    }

    fn provider_name(&self) -> &str {
        "anthropic"
    }
}

/// 1s, 2s, 4s, ... capped at `MAX_BACKOFF_SECS`
fn backoff(attempt: u32) -> Duration {
    let secs = 2u64.saturating_pow(attempt.saturating_sub(1));
    Duration::from_secs(secs.min(MAX_BACKOFF_SECS))
}

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    max_tokens: u32,
    temperature: f32,
}

impl MessagesRequest {
    /// System messages move to the top-level `system` field.
    fn from_chat(request: &ChatRequest) -> Self {
        let system: Vec<&str> = request
            .messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();

        Self {
            model: request.model.clone(),
            messages: request
                .messages
                .iter()
                .filter(|m| m.role != Role::System)
                .map(WireMessage::from)
                .collect(),
            system: (!system.is_empty()).then(|| system.join("\n\n")),
            max_tokens: request.options.max_tokens,
            temperature: request.options.temperature,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    content: String,
}

impl From<&ChatMessage> for WireMessage {
    fn from(message: &ChatMessage) -> Self {
        Self {
            role: message.role.to_string(),
            content: message.content.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    model: String,
    usage: Usage,
}

impl MessagesResponse {
    fn text(&self) -> String {
        self.content
            .iter()
            .filter(|c| c.content_type == "text")
            .filter_map(|c| c.text.as_deref())
            .collect::<Vec<_>>()
            .join("")
    }
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ChatOptions;
    use axum::{http::HeaderMap, http::StatusCode, routing::post, Router};
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Local stand-in for the Messages endpoint
    struct Endpoint {
        config: LlmConfig,
        hits: Arc<AtomicUsize>,
        seen: Arc<Mutex<Vec<(HeaderMap, String)>>>,
    }

    async fn endpoint(status: StatusCode, reply: &str, max_retries: u32) -> Endpoint {
        let hits = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let reply = reply.to_string();

        let handler = {
            let hits = hits.clone();
            let seen = seen.clone();
            move |headers: HeaderMap, body: String| {
                hits.fetch_add(1, Ordering::SeqCst);
                seen.lock().unwrap().push((headers, body));
                let reply = reply.clone();
                async move { (status, reply) }
            }
        };
        let app = Router::new().route("/v1/messages", post(handler));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Endpoint {
            config: LlmConfig {
                base_url: format!("http://{}/v1/", addr),
                timeout_secs: 5,
                max_retries,
                ..LlmConfig::default()
            },
            hits,
            seen,
        }
    }

    const REPLY: &str = r#"{
        "id": "msg_1",
        "type": "message",
        "role": "assistant",
        "model": "claude-3-5-sonnet-20241022",
        "content": [{"type": "text", "text": "{\"summary\": \"ok\"}"}],
        "usage": {"input_tokens": 10, "output_tokens": 5}
    }"#;

    fn request() -> ChatRequest {
        ChatRequest {
            provider: "anthropic".to_string(),
            model: "claude-3-5-sonnet-20241022".to_string(),
            messages: vec![
                ChatMessage::system("You are a reviewer."),
                ChatMessage::user("Review this."),
            ],
            options: ChatOptions {
                temperature: 0.2,
                max_tokens: 1000,
            },
        }
    }

    #[test]
    fn test_system_message_is_lifted() {
        let body = MessagesRequest::from_chat(&request());
        assert_eq!(body.system.as_deref(), Some("You are a reviewer."));
        assert_eq!(body.messages.len(), 1);
        assert_eq!(body.messages[0].role, "user");
        assert_eq!(body.max_tokens, 1000);
    }

    #[test]
    fn test_response_text_joins_text_blocks() {
        let raw = r#"{
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "model": "claude-3-5-sonnet-20241022",
            "stop_reason": "end_turn",
            "content": [
                {"type": "text", "text": "{\"summary\":"},
                {"type": "tool_use", "id": "t1", "name": "x", "input": {}},
                {"type": "text", "text": "\"ok\"}"}
            ],
            "usage": {"input_tokens": 10, "output_tokens": 5}
        }"#;
        let response: MessagesResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.text(), r#"{"summary":"ok"}"#);
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        assert_eq!(backoff(1), Duration::from_secs(1));
        assert_eq!(backoff(2), Duration::from_secs(2));
        assert_eq!(backoff(3), Duration::from_secs(4));
        assert_eq!(backoff(70), Duration::from_secs(MAX_BACKOFF_SECS));
        assert_eq!(backoff(u32::MAX), Duration::from_secs(MAX_BACKOFF_SECS));
    }

    #[tokio::test]
    async fn test_successful_call_sends_headers_and_lifted_system() {
        let endpoint = endpoint(StatusCode::OK, REPLY, 0).await;
        let client = AnthropicClient::new(&endpoint.config, "test-key".to_string()).unwrap();

        let response = client.chat(request()).await.unwrap();
        assert_eq!(response.content, r#"{"summary": "ok"}"#);
        assert_eq!(endpoint.hits.load(Ordering::SeqCst), 1);

        let seen = endpoint.seen.lock().unwrap();
        let (headers, body) = &seen[0];
        assert_eq!(headers["x-api-key"], "test-key");
        assert_eq!(headers["anthropic-version"], API_VERSION);
        let body: Value = serde_json::from_str(body).unwrap();
        assert_eq!(body["system"], "You are a reviewer.");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["max_tokens"], 1000);
    }

    #[tokio::test]
    async fn test_rate_limit_is_retried_then_reported() {
        let endpoint = endpoint(StatusCode::TOO_MANY_REQUESTS, "slow down", 1).await;
        let client = AnthropicClient::new(&endpoint.config, "test-key".to_string()).unwrap();

        let err = client.chat(request()).await.unwrap_err().to_string();
        assert_eq!(endpoint.hits.load(Ordering::SeqCst), 2);
        assert!(err.contains("429"));
        assert!(err.contains("slow down"));
    }

    #[tokio::test]
    async fn test_default_makes_a_single_attempt() {
        let endpoint = endpoint(StatusCode::INTERNAL_SERVER_ERROR, "overloaded", 0).await;
        assert_eq!(endpoint.config.max_retries, LlmConfig::default().max_retries);
        let client = AnthropicClient::new(&endpoint.config, "test-key".to_string()).unwrap();

        let err = client.chat(request()).await.unwrap_err().to_string();
        assert_eq!(endpoint.hits.load(Ordering::SeqCst), 1);
        assert!(err.contains("500"));
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_before_network() {
        let client = AnthropicClient::new(&LlmConfig::default(), String::new()).unwrap();
        let err = client.chat(request()).await.unwrap_err();
        assert!(err.to_string().contains("API key"));
    }
}

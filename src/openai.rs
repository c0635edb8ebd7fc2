//! OpenAI chat-completions client.
//!
//! One request per call, no retries; a client-level timeout bounds tail
//! latency. The API credential is resolved from the environment at call
//! time so a missing key is a per-request configuration error, not a crash.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::content::MessageContent;
use crate::error::{GateError, Result};

/// OpenAI chat completions endpoint.
const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Environment variable holding the API credential.
const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Upper bound on a single completion call.
const COMPLETION_TIMEOUT: Duration = Duration::from_secs(120);

/// One chat message as sent to the completion service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: MessageContent,
}

/// A successful completion.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResult {
    /// Assistant text from the first choice.
    pub content: String,
    /// Token accounting as reported upstream; passed through opaquely.
    pub usage: Value,
    /// Model that actually served the request, when reported.
    pub model: Option<String>,
}

/// Invokes the remote completion service with a message list.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        model: &str,
        max_tokens: u32,
    ) -> Result<CompletionResult>;
}

/// [`CompletionBackend`] backed by the OpenAI REST API.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
}

impl OpenAiClient {
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .timeout(COMPLETION_TIMEOUT)
                .build()
                .expect("failed to build HTTP client"),
        }
    }

    /// Resolve the API key from the environment.
    fn resolve_api_key() -> Result<String> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or(GateError::CredentialMissing)
    }

    /// Build the chat-completions request body.
    fn build_request_body(messages: &[ChatMessage], model: &str, max_tokens: u32) -> Value {
        json!({
            "model": model,
            "messages": messages,
            "max_tokens": max_tokens,
        })
    }

    /// Extract the assistant text from the first choice, if present.
    fn extract_content(response: &Value) -> Option<String> {
        response["choices"][0]["message"]["content"]
            .as_str()
            .map(String::from)
    }

    /// Extract a useful message from an OpenAI error body.
    fn extract_error_message(body: &Value) -> String {
        body["error"]["message"]
            .as_str()
            .unwrap_or("Unknown API error")
            .to_string()
    }
}

impl Default for OpenAiClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionBackend for OpenAiClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        model: &str,
        max_tokens: u32,
    ) -> Result<CompletionResult> {
        let api_key = Self::resolve_api_key()?;
        let body = Self::build_request_body(messages, model, max_tokens);

        debug!(model = %model, max_tokens, "completion request");

        let response = self
            .client
            .post(OPENAI_API_URL)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GateError::Upstream(format!("completion request failed: {e}")))?;

        let status = response.status();
        let response_body: Value = response
            .json()
            .await
            .map_err(|e| GateError::Upstream(format!("failed to parse completion response: {e}")))?;

        if !status.is_success() {
            return Err(GateError::Upstream(Self::extract_error_message(
                &response_body,
            )));
        }

        Ok(CompletionResult {
            content: Self::extract_content(&response_body).unwrap_or_default(),
            usage: response_body
                .get("usage")
                .cloned()
                .unwrap_or_else(|| json!({})),
            model: response_body["model"].as_str().map(String::from),
        })
    }
}

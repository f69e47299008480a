//! Text generation via an OpenAI-compatible chat-completions API.
//!
//! Every request carries exactly two messages: a fixed system instruction and the user content
//! assembled by the pipeline. A success response without any generated text degrades to an
//! empty string, so one silent slot never aborts a whole fan-out batch; transport failures and
//! error statuses still surface as errors.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

/// Errors raised while requesting generated text.
#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Completion service responded with an unexpected status code.
    #[error("Unexpected completion response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the completion service.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
}

/// Interface implemented by text-generation backends.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text for `user_content` under the given system instruction.
    ///
    /// Returns an empty string when the service answers success without content.
    async fn complete(&self, system: &str, user_content: &str) -> Result<String, LlmError>;
}

/// HTTP client for an OpenAI-compatible chat-completions endpoint.
pub struct ChatClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl ChatClient {
    /// Construct a client for the given API base URL, key, and model identifier.
    pub fn new(base_url: String, api_key: String, model: String) -> Result<Self, LlmError> {
        let http = Client::builder().user_agent("webaudit/0.1").build()?;
        Ok(Self {
            http,
            base_url,
            api_key,
            model,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    message: Option<CompletionMessage>,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl TextGenerator for ChatClient {
    async fn complete(&self, system: &str, user_content: &str) -> Result<String, LlmError> {
        tracing::debug!(
            model = %self.model,
            user_chars = user_content.len(),
            "Requesting completion"
        );

        let payload = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user_content },
            ],
        });

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::UnexpectedStatus { status, body });
        }

        let body: CompletionResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .unwrap_or_default();
        Ok(content)
    }
}

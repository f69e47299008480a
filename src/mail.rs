//! Outbound email delivery through a Resend-compatible HTTP API.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while sending an email.
#[derive(Debug, Error)]
pub enum MailError {
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Mail service responded with an unexpected status code.
    #[error("Unexpected mail response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the mail service.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
}

/// A single outbound email as accepted by the delivery endpoint.
#[derive(Debug, Clone)]
pub struct OutgoingMessage {
    /// Recipient address.
    pub to: String,
    /// Display name shown as the sender; falls back to the configured name when absent.
    pub sender_name: Option<String>,
    /// Subject line.
    pub subject: String,
    /// Plain-text body, if any.
    pub text: Option<String>,
    /// HTML body, if any.
    pub html: Option<String>,
}

/// Interface implemented by email delivery backends.
#[async_trait]
pub trait MailSender: Send + Sync {
    /// Deliver a single message.
    async fn send(&self, message: &OutgoingMessage) -> Result<(), MailError>;
}

/// HTTP client for a Resend-compatible `/emails` endpoint.
pub struct MailClient {
    http: Client,
    base_url: String,
    api_key: String,
    from_address: String,
    from_name: String,
}

impl MailClient {
    /// Construct a client for the given API base URL, key, and sender identity.
    pub fn new(
        base_url: String,
        api_key: String,
        from_address: String,
        from_name: String,
    ) -> Result<Self, MailError> {
        let http = Client::builder().user_agent("webaudit/0.1").build()?;
        Ok(Self {
            http,
            base_url,
            api_key,
            from_address,
            from_name,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/emails", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Serialize)]
struct SendPayload<'a> {
    from: String,
    to: Vec<&'a str>,
    subject: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    html: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(default)]
    id: Option<String>,
}

#[async_trait]
impl MailSender for MailClient {
    async fn send(&self, message: &OutgoingMessage) -> Result<(), MailError> {
        let display_name = message.sender_name.as_deref().unwrap_or(&self.from_name);
        tracing::debug!(to = %message.to, "Sending report email");

        let payload = SendPayload {
            from: format!("{} <{}>", display_name, self.from_address),
            to: vec![message.to.as_str()],
            subject: &message.subject,
            text: message.text.as_deref(),
            html: message.html.as_deref(),
        };

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
            return Err(MailError::UnexpectedStatus { status, body });
        }

        let id = response
            .json::<SendResponse>()
            .await
            .ok()
            .and_then(|body| body.id);
        tracing::info!(message_id = ?id, "Report email sent");
        Ok(())
    }
}

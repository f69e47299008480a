//! HTTP surface for the web audit server.
//!
//! This module exposes a compact Axum router with two endpoints:
//!
//! - `POST /audit` – Scrape a page, summarize it chunk by chunk, and return a combined
//!   client-ready summary alongside the raw scraped markdown. The response carries the
//!   wall-clock processing time in the `x-processing-time-ms` header.
//! - `POST /send-audit` – Deliver a finished audit report to a recipient by email and
//!   return `{ "success": true }`.
//!
//! Failures map to small stable JSON bodies: a missing URL yields `400 {"error": "Missing
//! URL"}`, a page without main content yields `500 {"error": "Failed to scrape URL."}`, and
//! any other pipeline failure yields `500 {"error": "Failed to generate audit."}`. Delivery
//! failures yield `500 {"success": false, "error": ...}`. Underlying error details are logged
//! server-side rather than leaked to clients.

use crate::audit::{AuditApi, AuditError};
use crate::mail::{MailError, OutgoingMessage};
use axum::{
    Json, Router,
    extract::State,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;

/// Response header carrying the request processing time in milliseconds.
pub const PROCESSING_TIME_HEADER: &str = "x-processing-time-ms";

/// Build the HTTP router exposing the audit API surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: AuditApi + 'static,
{
    Router::new()
        .route("/audit", post(run_audit::<S>))
        .route("/send-audit", post(send_audit::<S>))
        .with_state(service)
}

/// Request body for the `POST /audit` endpoint.
#[derive(Deserialize)]
struct AuditRequest {
    /// Target page to scrape and audit. Absent or empty values are rejected.
    #[serde(default)]
    url: Option<String>,
}

/// Success response for the `POST /audit` endpoint.
#[derive(Serialize)]
struct AuditResponse {
    /// Combined client-ready summary.
    summary: String,
    /// Raw markdown scraped from the target page.
    scraped: String,
}

/// Audit the page behind the requested URL.
///
/// Processing time is measured from request entry and attached as a response header so
/// clients can surface it without parsing the body.
async fn run_audit<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<AuditRequest>,
) -> Result<Response, AppError>
where
    S: AuditApi,
{
    let started = Instant::now();
    let url = match request.url {
        Some(url) if !url.is_empty() => url,
        _ => return Err(AppError::MissingUrl),
    };

    let outcome = service.run_audit(&url).await?;
    let elapsed_ms = started.elapsed().as_millis() as u64;
    tracing::info!(url, elapsed_ms, "Audit request completed");

    let mut response = Json(AuditResponse {
        summary: outcome.summary,
        scraped: outcome.scraped,
    })
    .into_response();
    response
        .headers_mut()
        .insert(PROCESSING_TIME_HEADER, HeaderValue::from(elapsed_ms));
    Ok(response)
}

/// Request body for the `POST /send-audit` endpoint.
#[derive(Deserialize)]
struct SendAuditRequest {
    /// Recipient address.
    to: String,
    /// Optional sender display name.
    #[serde(default)]
    name: Option<String>,
    /// Subject line.
    subject: String,
    /// Optional plain-text body.
    #[serde(default)]
    text: Option<String>,
    /// Optional HTML body.
    #[serde(default)]
    html: Option<String>,
}

/// Success response for the `POST /send-audit` endpoint.
#[derive(Serialize)]
struct SendAuditResponse {
    success: bool,
}

/// Send a finished audit report to the requested recipient.
async fn send_audit<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<SendAuditRequest>,
) -> Result<Json<SendAuditResponse>, AppError>
where
    S: AuditApi,
{
    let message = OutgoingMessage {
        to: request.to,
        sender_name: request.name,
        subject: request.subject,
        text: request.text,
        html: request.html,
    };
    service.send_report(&message).await?;
    tracing::info!(to = %message.to, "Audit report dispatched");
    Ok(Json(SendAuditResponse { success: true }))
}

enum AppError {
    MissingUrl,
    Audit(AuditError),
    Mail(MailError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::MissingUrl => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Missing URL" })),
            )
                .into_response(),
            AppError::Audit(error) => {
                tracing::error!(error = %error, "Audit request failed");
                let message = if error.is_missing_content() {
                    "Failed to scrape URL."
                } else {
                    "Failed to generate audit."
                };
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": message })),
                )
                    .into_response()
            }
            AppError::Mail(error) => {
                tracing::error!(error = %error, "Report delivery failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "success": false, "error": error.to_string() })),
                )
                    .into_response()
            }
        }
    }
}

impl From<AuditError> for AppError {
    fn from(inner: AuditError) -> Self {
        Self::Audit(inner)
    }
}

impl From<MailError> for AppError {
    fn from(inner: MailError) -> Self {
        Self::Mail(inner)
    }
}

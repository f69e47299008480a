//! Audit service coordinating scraping, fan-out summarization, and report delivery.

use crate::{
    audit::{
        chunking::{DEFAULT_MAX_CHUNK_TOKENS, split_text},
        types::{AuditError, AuditOutcome},
    },
    config::get_config,
    llm::{ChatClient, TextGenerator},
    mail::{MailClient, MailError, MailSender, OutgoingMessage},
    scrape::{ContentFetcher, ScrapeClient},
};
use async_trait::async_trait;
use futures_util::future::join_all;
use std::time::Instant;
use uuid::Uuid;

/// System instruction applied to each per-chunk summarization request.
const SUMMARIZE_PROMPT: &str =
    "You are a professional marketing assistant. Summarize the following content briefly:";

/// System instruction applied to the final combination request.
const COMBINE_PROMPT: &str = "You are a professional marketing assistant. Combine the following summaries into one polished, client-ready email. Be clear, concise, and professional.";

/// Coordinates the full audit pipeline: scraping, chunking, summarization, and combination.
///
/// The service owns long-lived handles to the scrape, completion, and mail clients so that
/// every HTTP request reuses the same connections. Construct the service once near process
/// start and share it through an `Arc`.
pub struct AuditService {
    fetcher: Box<dyn ContentFetcher>,
    generator: Box<dyn TextGenerator>,
    mailer: Box<dyn MailSender>,
    max_chunk_tokens: usize,
}

/// Abstraction over the audit pipeline used by the HTTP surface.
#[async_trait]
pub trait AuditApi: Send + Sync {
    /// Scrape a page and produce a combined audit summary.
    async fn run_audit(&self, url: &str) -> Result<AuditOutcome, AuditError>;

    /// Deliver an audit report to a recipient.
    async fn send_report(&self, message: &OutgoingMessage) -> Result<(), MailError>;
}

impl AuditService {
    /// Build a service from explicit collaborators.
    ///
    /// `max_chunk_tokens` is clamped to at least one token.
    pub fn new(
        fetcher: Box<dyn ContentFetcher>,
        generator: Box<dyn TextGenerator>,
        mailer: Box<dyn MailSender>,
        max_chunk_tokens: usize,
    ) -> Self {
        Self {
            fetcher,
            generator,
            mailer,
            max_chunk_tokens: max_chunk_tokens.max(1),
        }
    }

    /// Build a service wired to the HTTP clients described by process configuration.
    pub fn from_config() -> Self {
        let config = get_config();
        let fetcher = ScrapeClient::new(
            config.scrape_api_url.clone(),
            config.scrape_api_key.clone(),
        )
        .expect("Failed to build scrape client");
        let generator = ChatClient::new(
            config.llm_api_url.clone(),
            config.llm_api_key.clone(),
            config.llm_model.clone(),
        )
        .expect("Failed to build completion client");
        let mailer = MailClient::new(
            config.mail_api_url.clone(),
            config.mail_api_key.clone(),
            config.mail_from_address.clone(),
            config.mail_from_name.clone(),
        )
        .expect("Failed to build mail client");

        Self::new(
            Box::new(fetcher),
            Box::new(generator),
            Box::new(mailer),
            config.max_chunk_tokens.unwrap_or(DEFAULT_MAX_CHUNK_TOKENS),
        )
    }

    /// Scrape, chunk, summarize, and combine the content behind `url`.
    ///
    /// Chunk summaries are requested concurrently and collected in chunk order, so the
    /// combined prompt always reads in document order regardless of which request finishes
    /// first. Any failing summarization aborts the batch before the combination request.
    pub async fn run_audit(&self, url: &str) -> Result<AuditOutcome, AuditError> {
        let request_id = Uuid::new_v4();
        let started = Instant::now();
        tracing::info!(%request_id, url, "Starting audit");

        let scraped = self.fetcher.fetch_main_content(url).await?;
        let chunks = split_text(&scraped, self.max_chunk_tokens);
        tracing::debug!(
            %request_id,
            scraped_chars = scraped.len(),
            chunks = chunks.len(),
            max_chunk_tokens = self.max_chunk_tokens,
            "Scraped content chunked"
        );

        let summaries = join_all(
            chunks
                .iter()
                .map(|chunk| self.generator.complete(SUMMARIZE_PROMPT, chunk)),
        )
        .await
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?;
        debug_assert_eq!(summaries.len(), chunks.len());

        let combined_input = summaries.join("\n\n");
        let summary = self.generator.complete(COMBINE_PROMPT, &combined_input).await?;
        tracing::info!(
            %request_id,
            chunks = chunks.len(),
            summary_chars = summary.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Audit complete"
        );

        Ok(AuditOutcome { summary, scraped })
    }

    /// Deliver an audit report through the mail client.
    pub async fn send_report(&self, message: &OutgoingMessage) -> Result<(), MailError> {
        self.mailer.send(message).await
    }
}

#[async_trait]
impl AuditApi for AuditService {
    async fn run_audit(&self, url: &str) -> Result<AuditOutcome, AuditError> {
        AuditService::run_audit(self, url).await
    }

    async fn send_report(&self, message: &OutgoingMessage) -> Result<(), MailError> {
        AuditService::send_report(self, message).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmError;
    use crate::scrape::ScrapeError;
    use reqwest::StatusCode;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    struct StaticFetcher(&'static str);

    #[async_trait]
    impl ContentFetcher for StaticFetcher {
        async fn fetch_main_content(&self, _url: &str) -> Result<String, ScrapeError> {
            Ok(self.0.to_string())
        }
    }

    struct NoContentFetcher;

    #[async_trait]
    impl ContentFetcher for NoContentFetcher {
        async fn fetch_main_content(&self, _url: &str) -> Result<String, ScrapeError> {
            Err(ScrapeError::MissingContent)
        }
    }

    /// Records every completion call and answers `S[<input>]` for summaries.
    ///
    /// Summary calls sleep longer for earlier paragraphs so that completion order is the
    /// reverse of chunk order, which makes order preservation observable.
    struct RecordingGenerator {
        calls: Arc<Mutex<Vec<(String, String)>>>,
        fail_summaries: bool,
    }

    impl RecordingGenerator {
        fn new() -> Self {
            Self {
                calls: Arc::new(Mutex::new(Vec::new())),
                fail_summaries: false,
            }
        }

        fn failing() -> Self {
            Self {
                calls: Arc::new(Mutex::new(Vec::new())),
                fail_summaries: true,
            }
        }

        fn recorded(&self) -> Vec<(String, String)> {
            self.calls.lock().expect("calls lock").clone()
        }
    }

    #[async_trait]
    impl TextGenerator for RecordingGenerator {
        async fn complete(&self, system: &str, user_content: &str) -> Result<String, LlmError> {
            self.calls
                .lock()
                .expect("calls lock")
                .push((system.to_string(), user_content.to_string()));

            if system != SUMMARIZE_PROMPT {
                return Ok("FINAL-REPORT".to_string());
            }
            if self.fail_summaries {
                return Err(LlmError::UnexpectedStatus {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    body: "boom".to_string(),
                });
            }

            let delay_ms = match user_content {
                text if text.starts_with("alpha") => 30,
                text if text.starts_with("beta") => 20,
                _ => 10,
            };
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            Ok(format!("S[{}]", user_content.trim()))
        }
    }

    struct RecordingMailer {
        sent: Arc<Mutex<Vec<(String, String)>>>,
    }

    impl RecordingMailer {
        fn new() -> Self {
            Self {
                sent: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    #[async_trait]
    impl MailSender for RecordingMailer {
        async fn send(&self, message: &OutgoingMessage) -> Result<(), MailError> {
            self.sent
                .lock()
                .expect("sent lock")
                .push((message.to.clone(), message.subject.clone()));
            Ok(())
        }
    }

    fn service_with(
        fetcher: Box<dyn ContentFetcher>,
        generator: RecordingGenerator,
        max_chunk_tokens: usize,
    ) -> (AuditService, Arc<Mutex<Vec<(String, String)>>>) {
        let calls = Arc::clone(&generator.calls);
        let service = AuditService::new(
            fetcher,
            Box::new(generator),
            Box::new(RecordingMailer::new()),
            max_chunk_tokens,
        );
        (service, calls)
    }

    #[tokio::test]
    async fn run_audit_preserves_chunk_order_in_combined_prompt() {
        let generator = RecordingGenerator::new();
        let (service, calls) = service_with(
            Box::new(StaticFetcher("alpha\n\nbeta\n\ngamma")),
            generator,
            1,
        );

        let outcome = service
            .run_audit("https://example.com")
            .await
            .expect("audit succeeded");

        assert_eq!(outcome.summary, "FINAL-REPORT");
        assert_eq!(outcome.scraped, "alpha\n\nbeta\n\ngamma");

        let calls = calls.lock().expect("calls lock").clone();
        let summaries: Vec<_> = calls
            .iter()
            .filter(|(system, _)| system == SUMMARIZE_PROMPT)
            .collect();
        assert_eq!(summaries.len(), 3);

        // The slow first chunk must still come first in the combined prompt.
        let combine = calls
            .iter()
            .find(|(system, _)| system == COMBINE_PROMPT)
            .expect("combine call recorded");
        assert_eq!(combine.1, "S[alpha]\n\nS[beta]\n\nS[gamma]");
    }

    #[tokio::test]
    async fn run_audit_aborts_before_combining_on_summary_failure() {
        let generator = RecordingGenerator::failing();
        let (service, calls) = service_with(
            Box::new(StaticFetcher("alpha\n\nbeta")),
            generator,
            1,
        );

        let error = service
            .run_audit("https://example.com")
            .await
            .expect_err("audit failed");

        assert!(matches!(error, AuditError::Generation(_)));
        assert!(!error.is_missing_content());

        let calls = calls.lock().expect("calls lock").clone();
        assert!(calls.iter().all(|(system, _)| system != COMBINE_PROMPT));
    }

    #[tokio::test]
    async fn run_audit_flags_pages_without_main_content() {
        let generator = RecordingGenerator::new();
        let (service, calls) = service_with(Box::new(NoContentFetcher), generator, 1);

        let error = service
            .run_audit("https://example.com")
            .await
            .expect_err("audit failed");

        assert!(error.is_missing_content());
        assert!(calls.lock().expect("calls lock").is_empty());
    }

    #[tokio::test]
    async fn run_audit_combines_once_for_empty_documents() {
        let generator = RecordingGenerator::new();
        let (service, calls) = service_with(Box::new(StaticFetcher("")), generator, 1);

        let outcome = service
            .run_audit("https://example.com")
            .await
            .expect("audit succeeded");

        assert_eq!(outcome.summary, "FINAL-REPORT");
        assert_eq!(outcome.scraped, "");

        let calls = calls.lock().expect("calls lock").clone();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, COMBINE_PROMPT);
        assert_eq!(calls[0].1, "");
    }

    #[tokio::test]
    async fn send_report_delegates_to_mailer() {
        let mailer = RecordingMailer::new();
        let sent = Arc::clone(&mailer.sent);
        let service = AuditService::new(
            Box::new(StaticFetcher("")),
            Box::new(RecordingGenerator::new()),
            Box::new(mailer),
            1,
        );

        let message = OutgoingMessage {
            to: "client@example.com".to_string(),
            sender_name: None,
            subject: "Your audit".to_string(),
            text: Some("Findings".to_string()),
            html: None,
        };
        service.send_report(&message).await.expect("delivery");

        let sent = sent.lock().expect("sent lock").clone();
        assert_eq!(sent, vec![("client@example.com".into(), "Your audit".into())]);
    }
}

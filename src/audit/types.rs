//! Core data types and error definitions for the audit pipeline.

use crate::llm::LlmError;
use crate::scrape::ScrapeError;
use thiserror::Error;

/// Errors emitted by the audit pipeline.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Scrape step failed to retrieve the page content.
    #[error("Failed to scrape content: {0}")]
    Scrape(#[from] ScrapeError),
    /// Completion service failed while summarizing or combining.
    #[error("Failed to generate text: {0}")]
    Generation(#[from] LlmError),
}

impl AuditError {
    /// True when the target page yielded no main content to audit.
    ///
    /// Callers use this to distinguish "nothing to scrape" from transport or
    /// generation failures when mapping the error to a client response.
    pub fn is_missing_content(&self) -> bool {
        matches!(self, AuditError::Scrape(ScrapeError::MissingContent))
    }
}

/// Result of a completed audit produced by [`crate::audit::AuditService::run_audit`].
#[derive(Debug, Clone)]
pub struct AuditOutcome {
    /// Client-ready summary combined from the per-chunk summaries.
    pub summary: String,
    /// Raw markdown scraped from the target page.
    pub scraped: String,
}

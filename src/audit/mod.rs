//! Audit pipeline: scraping, chunked summarization, and report assembly.

pub mod chunking;
mod service;
pub mod types;

pub use service::{AuditApi, AuditService};
pub use types::{AuditError, AuditOutcome};

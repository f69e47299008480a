#![deny(missing_docs)]

//! Core library for the webaudit server.

/// HTTP routing and REST handlers.
pub mod api;
/// Audit pipeline: chunking, fan-out summarization, and reduction.
pub mod audit;
/// Environment-driven configuration management.
pub mod config;
/// Text-generation collaborator client.
pub mod llm;
/// Structured logging and tracing setup.
pub mod logging;
/// Mail-delivery collaborator client.
pub mod mail;
/// Content-retrieval collaborator client.
pub mod scrape;

#![deny(missing_docs)]

//! Core library for the knowledge-base gateway.

/// HTTP routing and REST handlers.
pub mod api;
/// Managed knowledge-base clients.
pub mod bedrock;
/// Environment-driven configuration management.
pub mod config;
/// Upload, ingestion, polling and query orchestration.
pub mod knowledge_base;
/// Structured logging and tracing setup.
pub mod logging;
/// Object storage for uploaded documents.
pub mod storage;

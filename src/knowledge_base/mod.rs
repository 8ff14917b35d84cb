//! Knowledge-base orchestration: document upload, ingestion jobs, and querying.

pub mod classify;
pub mod poller;
mod service;
pub mod types;

pub use classify::{QueryFailure, classify_query_failure};
pub use poller::{JobPhase, PollError, PollPolicy, poll_until_terminal};
pub use service::{KnowledgeBaseApi, KnowledgeBaseService};
pub use types::{IngestionJob, KnowledgeBaseError, UploadOutcome};

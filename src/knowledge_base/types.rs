//! Data types and error definitions for knowledge-base operations.

use crate::bedrock::BedrockError;
use crate::storage::StorageError;
use serde::Serialize;
use thiserror::Error;

/// Result of storing a document in the bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadOutcome {
    /// Key the document was written under.
    pub s3_key: String,
    /// Confirmation naming the full object location.
    pub message: String,
}

/// Ingestion job as reported by the knowledge-base service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestionJob {
    /// Opaque job identifier.
    pub ingestion_job_id: String,
    /// Status string exactly as reported, e.g. `STARTING`, `IN_PROGRESS`, `COMPLETE`.
    pub status: String,
}

/// Errors emitted by knowledge-base operations.
#[derive(Debug, Error)]
pub enum KnowledgeBaseError {
    /// Uploaded filename does not carry the accepted extension.
    #[error("Only {extension} files are supported")]
    UnsupportedFileType {
        /// Rejected filename.
        filename: String,
        /// Extension that would have been accepted.
        extension: String,
    },
    /// Object storage rejected the write.
    #[error("Error uploading file: {0}")]
    Storage(#[source] StorageError),
    /// Starting an ingestion job failed.
    #[error("Error during ingestion: {0}")]
    StartIngestion(#[source] BedrockError),
    /// Reading an ingestion job failed.
    #[error("Error getting ingestion status: {0}")]
    IngestionStatus(#[source] BedrockError),
    /// Upstream refused the query because of credentials or permissions.
    #[error("AWS credential error. Please check your AWS credentials.")]
    Unauthorized,
    /// Upstream rejected the configured foundation model reference.
    #[error("Invalid model ARN format.")]
    InvalidModelReference,
    /// Any other query failure, carrying the upstream message.
    #[error("Error calling Bedrock API: {0}")]
    Upstream(String),
}

//! Clients for the managed knowledge-base service.
//!
//! Ingestion control (start a job, read its status) and retrieve-and-generate live behind two
//! small traits so the service layer can be exercised without network access. The Bedrock
//! implementations hold the knowledge-base identifiers they are scoped to.

pub mod ingestion;
pub mod runtime;

use crate::knowledge_base::IngestionJob;
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use thiserror::Error;

pub use ingestion::BedrockIngestionClient;
pub use runtime::BedrockRetrievalClient;

/// Errors raised by knowledge-base clients.
#[derive(Debug, Error)]
pub enum BedrockError {
    /// The service rejected or failed the call. Carries the rendered upstream error.
    #[error("{0}")]
    Service(String),
    /// The service answered without a member the caller depends on.
    #[error("response is missing `{0}`")]
    MissingField(&'static str),
    /// Request parameters could not be assembled.
    #[error("failed to build request: {0}")]
    Build(String),
}

/// Interface implemented by ingestion job backends.
#[async_trait]
pub trait IngestionClient {
    /// Start a new ingestion job for the configured data source.
    async fn start_ingestion_job(&self) -> Result<IngestionJob, BedrockError>;

    /// Read the current state of an ingestion job.
    async fn get_ingestion_job(&self, job_id: &str) -> Result<IngestionJob, BedrockError>;
}

/// Interface implemented by retrieve-and-generate backends.
#[async_trait]
pub trait RetrievalClient {
    /// Answer a natural-language question from the knowledge base.
    async fn retrieve_and_generate(&self, text: &str) -> Result<String, BedrockError>;
}

/// Resolve the shared SDK configuration (credentials chain, region) once at start-up.
pub async fn load_sdk_config(region: &str) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .load()
        .await
}

fn build_error(err: impl std::fmt::Display) -> BedrockError {
    BedrockError::Build(err.to_string())
}

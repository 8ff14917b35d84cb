//! Knowledge-base service coordinating object storage and the managed knowledge base.

use crate::{
    bedrock::{
        self, BedrockIngestionClient, BedrockRetrievalClient, IngestionClient, RetrievalClient,
    },
    config::Config,
    knowledge_base::{
        classify::{QueryFailure, classify_query_failure},
        types::{IngestionJob, KnowledgeBaseError, UploadOutcome},
    },
    storage::{DocumentStore, S3DocumentStore, StorageLayout},
};
use async_trait::async_trait;
use bytes::Bytes;

/// Abstraction over knowledge-base operations used by the HTTP surface and the batch tool.
#[async_trait]
pub trait KnowledgeBaseApi: Send + Sync {
    /// Store a document under the derived key.
    async fn upload_document(
        &self,
        filename: &str,
        content: Bytes,
    ) -> Result<UploadOutcome, KnowledgeBaseError>;

    /// Start an ingestion job for the configured data source.
    async fn start_ingestion(&self) -> Result<IngestionJob, KnowledgeBaseError>;

    /// Read the current state of an ingestion job.
    async fn ingestion_status(&self, job_id: &str) -> Result<IngestionJob, KnowledgeBaseError>;

    /// Answer a question from the knowledge base.
    async fn query(&self, text: &str) -> Result<String, KnowledgeBaseError>;
}

/// Owns the long-lived storage and knowledge-base handles.
///
/// Construct once at process start and share through an `Arc`; every method is a single
/// upstream round trip with no local state.
pub struct KnowledgeBaseService {
    layout: StorageLayout,
    store: Box<dyn DocumentStore + Send + Sync>,
    ingestion: Box<dyn IngestionClient + Send + Sync>,
    retrieval: Box<dyn RetrievalClient + Send + Sync>,
}

impl KnowledgeBaseService {
    /// Build the service with S3 and Bedrock clients sharing one ambient credentials chain.
    pub async fn new(config: &Config) -> Self {
        tracing::info!(region = %config.region, "Loading AWS SDK configuration");
        let sdk_config = bedrock::load_sdk_config(&config.region).await;

        Self::with_clients(
            StorageLayout::from_config(config),
            Box::new(S3DocumentStore::from_sdk_config(
                &sdk_config,
                config.bucket_name.clone(),
                config.s3_force_path_style,
            )),
            Box::new(BedrockIngestionClient::from_sdk_config(&sdk_config, config)),
            Box::new(BedrockRetrievalClient::from_sdk_config(&sdk_config, config)),
        )
    }

    /// Assemble the service from explicit components.
    pub fn with_clients(
        layout: StorageLayout,
        store: Box<dyn DocumentStore + Send + Sync>,
        ingestion: Box<dyn IngestionClient + Send + Sync>,
        retrieval: Box<dyn RetrievalClient + Send + Sync>,
    ) -> Self {
        Self {
            layout,
            store,
            ingestion,
            retrieval,
        }
    }
}

#[async_trait]
impl KnowledgeBaseApi for KnowledgeBaseService {
    async fn upload_document(
        &self,
        filename: &str,
        content: Bytes,
    ) -> Result<UploadOutcome, KnowledgeBaseError> {
        if !self.layout.accepts(filename) {
            tracing::warn!(filename, "Rejected upload with unsupported extension");
            return Err(KnowledgeBaseError::UnsupportedFileType {
                filename: filename.to_string(),
                extension: self.layout.allowed_extension.clone(),
            });
        }

        let key = self.layout.object_key(filename);
        let size = content.len();
        self.store.put_document(&key, content).await.map_err(|err| {
            tracing::error!(key = %key, error = %err, "Object upload failed");
            KnowledgeBaseError::Storage(err)
        })?;

        let location = self.layout.object_url(&key);
        tracing::info!(key = %key, bytes = size, "Document uploaded");
        Ok(UploadOutcome {
            message: format!("File uploaded successfully to {location}"),
            s3_key: key,
        })
    }

    async fn start_ingestion(&self) -> Result<IngestionJob, KnowledgeBaseError> {
        self.ingestion
            .start_ingestion_job()
            .await
            .map_err(KnowledgeBaseError::StartIngestion)
    }

    async fn ingestion_status(&self, job_id: &str) -> Result<IngestionJob, KnowledgeBaseError> {
        self.ingestion
            .get_ingestion_job(job_id)
            .await
            .map_err(KnowledgeBaseError::IngestionStatus)
    }

    async fn query(&self, text: &str) -> Result<String, KnowledgeBaseError> {
        tracing::info!(chars = text.chars().count(), "Querying knowledge base");
        match self.retrieval.retrieve_and_generate(text).await {
            Ok(answer) => {
                tracing::debug!("Query answered");
                Ok(answer)
            }
            Err(err) => {
                let message = err.to_string();
                let failure = classify_query_failure(&message);
                tracing::error!(error = %message, class = ?failure, "Query failed");
                Err(match failure {
                    QueryFailure::Unauthorized => KnowledgeBaseError::Unauthorized,
                    QueryFailure::InvalidModelReference => {
                        KnowledgeBaseError::InvalidModelReference
                    }
                    QueryFailure::Upstream => KnowledgeBaseError::Upstream(message),
                })
            }
        }
    }
}

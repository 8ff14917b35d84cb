//! Ingestion job control over the Bedrock Agent API.

use super::{BedrockError, IngestionClient};
use crate::config::Config;
use crate::knowledge_base::IngestionJob;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_bedrockagent::{Client, error::DisplayErrorContext, types};

/// Starts and inspects ingestion jobs for one knowledge base data source.
pub struct BedrockIngestionClient {
    client: Client,
    knowledge_base_id: String,
    data_source_id: String,
}

impl BedrockIngestionClient {
    /// Wrap an existing SDK client.
    pub fn new(
        client: Client,
        knowledge_base_id: impl Into<String>,
        data_source_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            knowledge_base_id: knowledge_base_id.into(),
            data_source_id: data_source_id.into(),
        }
    }

    /// Build a client from the shared SDK configuration.
    pub fn from_sdk_config(sdk_config: &SdkConfig, config: &Config) -> Self {
        Self::new(
            Client::new(sdk_config),
            config.knowledge_base_id.clone(),
            config.data_source_id.clone(),
        )
    }
}

#[async_trait]
impl IngestionClient for BedrockIngestionClient {
    async fn start_ingestion_job(&self) -> Result<IngestionJob, BedrockError> {
        let output = self
            .client
            .start_ingestion_job()
            .knowledge_base_id(&self.knowledge_base_id)
            .data_source_id(&self.data_source_id)
            .send()
            .await
            .map_err(|err| {
                let error = BedrockError::Service(DisplayErrorContext(&err).to_string());
                tracing::error!(
                    knowledge_base_id = %self.knowledge_base_id,
                    data_source_id = %self.data_source_id,
                    error = %error,
                    "StartIngestionJob failed"
                );
                error
            })?;
        let job = map_job(output.ingestion_job())?;
        tracing::info!(
            job_id = %job.ingestion_job_id,
            status = %job.status,
            "Started ingestion job"
        );
        Ok(job)
    }

    async fn get_ingestion_job(&self, job_id: &str) -> Result<IngestionJob, BedrockError> {
        let output = self
            .client
            .get_ingestion_job()
            .knowledge_base_id(&self.knowledge_base_id)
            .data_source_id(&self.data_source_id)
            .ingestion_job_id(job_id)
            .send()
            .await
            .map_err(|err| {
                let error = BedrockError::Service(DisplayErrorContext(&err).to_string());
                tracing::error!(job_id, error = %error, "GetIngestionJob failed");
                error
            })?;
        map_job(output.ingestion_job())
    }
}

fn map_job(job: Option<&types::IngestionJob>) -> Result<IngestionJob, BedrockError> {
    let job = job.ok_or(BedrockError::MissingField("ingestionJob"))?;
    Ok(IngestionJob {
        ingestion_job_id: job.ingestion_job_id().to_string(),
        status: job.status().as_str().to_string(),
    })
}

//! Retrieve-and-generate over the Bedrock Agent Runtime API.

use super::{BedrockError, RetrievalClient, build_error};
use crate::config::Config;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_bedrockagentruntime::{
    Client,
    error::DisplayErrorContext,
    types::{
        KnowledgeBaseRetrieveAndGenerateConfiguration, RetrieveAndGenerateConfiguration,
        RetrieveAndGenerateInput, RetrieveAndGenerateType,
    },
};

/// Queries one knowledge base with a fixed foundation model.
pub struct BedrockRetrievalClient {
    client: Client,
    knowledge_base_id: String,
    model_arn: String,
}

impl BedrockRetrievalClient {
    /// Wrap an existing SDK client.
    pub fn new(
        client: Client,
        knowledge_base_id: impl Into<String>,
        model_arn: impl Into<String>,
    ) -> Self {
        Self {
            client,
            knowledge_base_id: knowledge_base_id.into(),
            model_arn: model_arn.into(),
        }
    }

    /// Build a client from the shared SDK configuration.
    pub fn from_sdk_config(sdk_config: &SdkConfig, config: &Config) -> Self {
        Self::new(
            Client::new(sdk_config),
            config.knowledge_base_id.clone(),
            config.model_arn.clone(),
        )
    }

    fn configuration(&self) -> Result<RetrieveAndGenerateConfiguration, BedrockError> {
        let knowledge_base = KnowledgeBaseRetrieveAndGenerateConfiguration::builder()
            .knowledge_base_id(&self.knowledge_base_id)
            .model_arn(&self.model_arn)
            .build()
            .map_err(build_error)?;
        RetrieveAndGenerateConfiguration::builder()
            .r#type(RetrieveAndGenerateType::KnowledgeBase)
            .knowledge_base_configuration(knowledge_base)
            .build()
            .map_err(build_error)
    }
}

#[async_trait]
impl RetrievalClient for BedrockRetrievalClient {
    async fn retrieve_and_generate(&self, text: &str) -> Result<String, BedrockError> {
        tracing::debug!(
            knowledge_base_id = %self.knowledge_base_id,
            model_arn = %self.model_arn,
            "Calling RetrieveAndGenerate"
        );
        let input = RetrieveAndGenerateInput::builder()
            .text(text)
            .build()
            .map_err(build_error)?;
        let output = self
            .client
            .retrieve_and_generate()
            .input(input)
            .retrieve_and_generate_configuration(self.configuration()?)
            .send()
            .await
            .map_err(|err| BedrockError::Service(DisplayErrorContext(&err).to_string()))?;

        output
            .output()
            .map(|generated| generated.text().to_string())
            .ok_or(BedrockError::MissingField("output"))
    }
}

//! Object storage for uploaded documents.
//!
//! Keys are derived as `<prefix>/<filename>` with no collision handling, so uploading the same
//! filename twice replaces the stored object. Keys are handed to the store verbatim.

use crate::config::Config;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::{Client, error::DisplayErrorContext, primitives::ByteStream};
use bytes::Bytes;
use thiserror::Error;

/// Errors raised while writing documents.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The store rejected or failed the write. Carries the rendered upstream error.
    #[error("{0}")]
    Service(String),
}

/// Interface implemented by document stores.
#[async_trait]
pub trait DocumentStore {
    /// Write `content` under exactly `key`, replacing any existing object.
    async fn put_document(&self, key: &str, content: Bytes) -> Result<(), StorageError>;
}

/// S3 bucket sharing the SDK configuration (and credentials chain) of the Bedrock clients.
pub struct S3DocumentStore {
    client: Client,
    bucket_name: String,
}

impl S3DocumentStore {
    /// Wrap an existing SDK client.
    pub fn new(client: Client, bucket_name: impl Into<String>) -> Self {
        Self {
            client,
            bucket_name: bucket_name.into(),
        }
    }

    /// Build a store from the shared SDK configuration.
    ///
    /// Path-style addressing is needed for S3-compatible endpoints such as MinIO.
    pub fn from_sdk_config(
        sdk_config: &SdkConfig,
        bucket_name: impl Into<String>,
        force_path_style: bool,
    ) -> Self {
        let s3_config = aws_sdk_s3::config::Builder::from(sdk_config)
            .force_path_style(force_path_style)
            .build();
        Self::new(Client::from_conf(s3_config), bucket_name)
    }
}

#[async_trait]
impl DocumentStore for S3DocumentStore {
    async fn put_document(&self, key: &str, content: Bytes) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .body(ByteStream::from(content))
            .send()
            .await
            .map_err(|err| StorageError::Service(DisplayErrorContext(&err).to_string()))?;
        tracing::debug!(bucket = %self.bucket_name, key, "PutObject succeeded");
        Ok(())
    }
}

/// Naming rules for documents written to the bucket.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    /// Bucket receiving documents, used in confirmation messages.
    pub bucket_name: String,
    /// Prefix prepended to every key.
    pub key_prefix: String,
    /// Suffix a filename must carry to be accepted.
    pub allowed_extension: String,
}

impl StorageLayout {
    /// Build the layout from runtime configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            bucket_name: config.bucket_name.clone(),
            key_prefix: config.key_prefix.clone(),
            allowed_extension: config.allowed_extension.clone(),
        }
    }

    /// Whether a filename passes the extension check.
    pub fn accepts(&self, filename: &str) -> bool {
        filename.ends_with(&self.allowed_extension)
    }

    /// Storage key for an uploaded file.
    pub fn object_key(&self, filename: &str) -> String {
        format!("{}/{}", self.key_prefix, filename)
    }

    /// Human-readable location of a stored object.
    pub fn object_url(&self, key: &str) -> String {
        format!("s3://{}/{}", self.bucket_name, key)
    }
}

#[cfg(test)]
mod tests {
    use super::StorageLayout;

    fn layout() -> StorageLayout {
        StorageLayout {
            bucket_name: "docs-bucket".into(),
            key_prefix: "publisher-kb".into(),
            allowed_extension: ".txt".into(),
        }
    }

    #[test]
    fn extension_check_is_case_sensitive_suffix_match() {
        let layout = layout();
        assert!(layout.accepts("notes.txt"));
        assert!(layout.accepts("archive.tar.txt"));
        assert!(!layout.accepts("notes.TXT"));
        assert!(!layout.accepts("notes.txt.pdf"));
        assert!(!layout.accepts("notes"));
        assert!(!layout.accepts(""));
    }

    #[test]
    fn key_is_prefix_plus_filename() {
        let layout = layout();
        assert_eq!(layout.object_key("notes.txt"), "publisher-kb/notes.txt");
        assert_eq!(layout.object_key("report#1.txt"), "publisher-kb/report#1.txt");
        assert_eq!(
            layout.object_url("publisher-kb/notes.txt"),
            "s3://docs-bucket/publisher-kb/notes.txt"
        );
    }
}

use std::sync::Once;

use bytes::Bytes;
use kbgateway::{
    config,
    knowledge_base::{KnowledgeBaseApi, KnowledgeBaseService},
};

static INIT: Once = Once::new();

fn init_config_once() {
    INIT.call_once(config::init_config);
}

#[tokio::test]
#[ignore = "Requires live AWS credentials and a configured bucket"]
async fn live_upload_roundtrip() {
    init_config_once();
    let service = KnowledgeBaseService::new(config::get_config()).await;
    let outcome = service
        .upload_document(
            "kbgateway-live-check.txt",
            Bytes::from_static(b"kbgateway live validation"),
        )
        .await
        .expect("upload to bucket");
    assert!(outcome.s3_key.ends_with("/kbgateway-live-check.txt"));
}

#[tokio::test]
#[ignore = "Requires live AWS credentials and a populated knowledge base"]
async fn live_query_returns_text() {
    init_config_once();
    let service = KnowledgeBaseService::new(config::get_config()).await;
    let answer = service
        .query("What documents are available?")
        .await
        .expect("retrieve and generate");
    assert!(!answer.trim().is_empty());
}

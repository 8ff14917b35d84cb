//! HTTP surface for the knowledge-base gateway.
//!
//! - `POST /upload` – Multipart upload (field `file`) of a text document into the bucket.
//! - `POST /ingest` – Start an ingestion job for the configured data source.
//! - `GET /ingest/:ingestion_job_id` – Current status of an ingestion job.
//! - `POST /query` – Retrieve-and-generate answer for `{ "text": ... }`.
//! - `GET /` – Liveness check.
//!
//! Failures become `{ "detail": ... }` bodies: 400 for rejected input and malformed model
//! references, 401 for credential problems, 413 for uploads over the body limit, 500 for
//! everything else.

use crate::knowledge_base::{KnowledgeBaseApi, KnowledgeBaseError};
use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, Multipart, Path, State,
        multipart::MultipartError,
        rejection::JsonRejection,
    },
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

/// Build the HTTP router exposing the knowledge-base API surface.
///
/// `max_upload_bytes` replaces axum's 2 MB default body limit on `POST /upload` only.
pub fn create_router<S>(service: Arc<S>, max_upload_bytes: usize) -> Router
where
    S: KnowledgeBaseApi + 'static,
{
    Router::new()
        .route("/", get(read_root))
        .route(
            "/upload",
            post(upload_document::<S>).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/ingest", post(start_ingestion::<S>))
        .route("/ingest/:ingestion_job_id", get(ingestion_status::<S>))
        .route("/query", post(query_knowledge_base::<S>))
        .with_state(service)
}

/// CORS policy allowing the listed browser origins with credentials.
///
/// Methods and headers mirror the preflight request since wildcards cannot be combined with
/// credentials.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

#[derive(Serialize)]
struct RootResponse {
    message: &'static str,
    status: &'static str,
}

async fn read_root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Knowledge Base API is running",
        status: "online",
    })
}

/// Success response for `POST /upload`.
#[derive(Serialize)]
struct UploadResponse {
    s3_key: String,
    message: String,
}

/// Store the multipart `file` field under the configured key prefix.
async fn upload_document<S>(
    State(service): State<Arc<S>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError>
where
    S: KnowledgeBaseApi,
{
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::multipart("Invalid multipart body", err))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let content = field
            .bytes()
            .await
            .map_err(|err| AppError::multipart("Failed to read upload", err))?;
        let outcome = service.upload_document(&filename, content).await?;
        return Ok(Json(UploadResponse {
            s3_key: outcome.s3_key,
            message: outcome.message,
        }));
    }

    Err(AppError::BadRequest("Missing multipart field `file`".into()))
}

/// Response body for both ingestion endpoints.
#[derive(Serialize)]
struct IngestResponse {
    ingestion_job_id: String,
    status: String,
}

async fn start_ingestion<S>(State(service): State<Arc<S>>) -> Result<Json<IngestResponse>, AppError>
where
    S: KnowledgeBaseApi,
{
    let job = service.start_ingestion().await?;
    Ok(Json(IngestResponse {
        ingestion_job_id: job.ingestion_job_id,
        status: job.status,
    }))
}

async fn ingestion_status<S>(
    State(service): State<Arc<S>>,
    Path(ingestion_job_id): Path<String>,
) -> Result<Json<IngestResponse>, AppError>
where
    S: KnowledgeBaseApi,
{
    let job = service.ingestion_status(&ingestion_job_id).await?;
    Ok(Json(IngestResponse {
        ingestion_job_id: job.ingestion_job_id,
        status: job.status,
    }))
}

/// Request body for `POST /query`.
#[derive(Deserialize)]
struct QueryRequest {
    text: String,
}

#[derive(Serialize)]
struct QueryResponse {
    response: String,
}

async fn query_knowledge_base<S>(
    State(service): State<Arc<S>>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, AppError>
where
    S: KnowledgeBaseApi,
{
    let Json(request) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    let response = service.query(&request.text).await?;
    Ok(Json(QueryResponse { response }))
}

enum AppError {
    BadRequest(String),
    PayloadTooLarge(String),
    Service(KnowledgeBaseError),
}

impl AppError {
    /// Body-limit hits surface as multipart errors; keep their 413.
    fn multipart(context: &str, err: MultipartError) -> Self {
        let detail = format!("{context}: {}", err.body_text());
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge(detail)
        } else {
            Self::BadRequest(detail)
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Service(
                KnowledgeBaseError::UnsupportedFileType { .. }
                | KnowledgeBaseError::InvalidModelReference,
            ) => StatusCode::BAD_REQUEST,
            Self::Service(KnowledgeBaseError::Unauthorized) => StatusCode::UNAUTHORIZED,
            Self::Service(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match self {
            Self::BadRequest(message) | Self::PayloadTooLarge(message) => message,
            Self::Service(err) => err.to_string(),
        };
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), detail = %detail, "Request failed");
        } else {
            tracing::warn!(status = status.as_u16(), detail = %detail, "Request rejected");
        }
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

impl From<KnowledgeBaseError> for AppError {
    fn from(inner: KnowledgeBaseError) -> Self {
        Self::Service(inner)
    }
}

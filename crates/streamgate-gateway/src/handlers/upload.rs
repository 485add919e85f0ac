//! Upload handlers: the admission pipeline end to end
//!
//! Every file moves through rate limiting, sanitization and validation,
//! quota reservation, cooldown-aware worker acquisition, the bounded relay
//! step, quota commit, and finally capability-link generation. Batch uploads
//! run the same pipeline per file with independent outcomes.

use crate::middleware::CallerIdentity;
use crate::{ApiError, AppState};
use axum::{
    extract::{Extension, Multipart, State},
    Json,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use streamgate_core::{pack, sanitize_filename, short_hash, stream_url, download_url, RateDecision, Worker};
use streamgate_relay::{Delivery, MediaKind, MediaPayload, RelayError};
use tracing::{error, info};

/// Upper bound on files per batch request.
const MAX_BATCH_FILES: usize = 10;

/// A successfully relayed file.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub filename: String,
    pub size: u64,
    pub mime_type: String,
    pub message_id: i64,
    pub stream_url: String,
    pub download_url: String,
    pub hash: String,
    pub upload_time: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub message: &'static str,
    pub data: UploadResult,
    pub upload_time_secs: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse {
    pub success: bool,
    pub message: &'static str,
    pub summary: BatchSummary,
    pub results: Vec<BatchItem>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub total_files: usize,
    pub success_count: usize,
    pub failed_count: usize,
    pub total_size: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItem {
    pub filename: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<UploadResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
}

/// One file pulled out of a multipart body.
struct FilePart {
    filename: String,
    content_type: String,
    data: Bytes,
}

/// POST /upload - single-file upload
pub async fn upload(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CallerIdentity>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let start = Instant::now();

    let file = next_file_part(&mut multipart, "file")
        .await?
        .ok_or_else(|| ApiError::BadRequest("missing \"file\" form field".to_string()))?;

    let result = process_one(&state, &caller.0, file).await?;

    info!(
        filename = %result.filename,
        size = result.size,
        caller = %caller.0,
        duration_ms = start.elapsed().as_millis() as u64,
        "file uploaded"
    );

    Ok(Json(UploadResponse {
        success: true,
        message: "upload complete",
        data: result,
        upload_time_secs: start.elapsed().as_secs_f64(),
    }))
}

/// POST /upload/batch - up to [`MAX_BATCH_FILES`] files with independent
/// per-file outcomes
pub async fn upload_batch(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CallerIdentity>,
    mut multipart: Multipart,
) -> Result<Json<BatchResponse>, ApiError> {
    let mut files = Vec::new();
    while let Some(file) = next_file_part(&mut multipart, "files").await? {
        files.push(file);
        if files.len() > MAX_BATCH_FILES {
            return Err(ApiError::BadRequest(format!(
                "batch upload supports at most {MAX_BATCH_FILES} files"
            )));
        }
    }
    if files.is_empty() {
        return Err(ApiError::BadRequest("no files found in request".to_string()));
    }

    let total_files = files.len();
    let mut results = Vec::with_capacity(total_files);
    let mut success_count = 0;
    let mut total_size = 0u64;

    for file in files {
        let filename = file.filename.clone();
        match process_one(&state, &caller.0, file).await {
            Ok(result) => {
                success_count += 1;
                total_size += result.size;
                results.push(BatchItem {
                    filename,
                    success: true,
                    data: Some(result),
                    error: None,
                    code: None,
                });
            }
            Err(e) => {
                results.push(BatchItem {
                    filename,
                    success: false,
                    data: None,
                    error: Some(e.to_string()),
                    code: Some(e.error_code().as_str()),
                });
            }
        }
    }

    info!(
        caller = %caller.0,
        total_files,
        success_count,
        total_size,
        "batch upload finished"
    );

    Ok(Json(BatchResponse {
        success: true,
        message: "batch upload complete",
        summary: BatchSummary {
            total_files,
            success_count,
            failed_count: total_files - success_count,
            total_size,
        },
        results,
    }))
}

/// Pull the next multipart field with the given name, skipping others.
async fn next_file_part(
    multipart: &mut Multipart,
    field_name: &str,
) -> Result<Option<FilePart>, ApiError> {
    loop {
        let field = match multipart
            .next_field()
            .await
            .map_err(|e| ApiError::BadRequest(format!("malformed multipart body: {e}")))?
        {
            Some(field) => field,
            None => return Ok(None),
        };
        if field.name() != Some(field_name) {
            continue;
        }
        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .ok_or_else(|| ApiError::BadRequest("file field has no filename".to_string()))?;
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("failed to read file data: {e}")))?;
        return Ok(Some(FilePart {
            filename,
            content_type,
            data,
        }));
    }
}

/// Run the full admission pipeline for one file and relay it.
async fn process_one(
    state: &AppState,
    caller: &str,
    file: FilePart,
) -> Result<UploadResult, ApiError> {
    if let RateDecision::Denied { retry_after } = state.rate_limiter.check_and_record(caller) {
        state.metrics.record_blocked();
        return Err(ApiError::RateLimited { wait: retry_after });
    }

    let filename = sanitize_filename(&file.filename);
    let size = file.data.len() as u64;

    if let Err(e) = state
        .validator
        .validate(&filename, size, &file.content_type, &file.data)
    {
        state.metrics.record_failure();
        return Err(e.into());
    }

    let reservation = match state.quota.try_reserve(caller, size) {
        Ok(reservation) => reservation,
        Err(e) => {
            state.metrics.record_failure();
            return Err(e.into());
        }
    };

    let worker = match state.scheduler.acquire() {
        Ok(worker) => worker,
        Err(e) => {
            state.metrics.record_failure();
            reservation.release();
            return Err(e.into());
        }
    };

    let relay_timeout = Duration::from_secs(state.config.relay_timeout_secs);
    let relayed = tokio::time::timeout(
        relay_timeout,
        relay_file(&worker, &filename, &file.content_type, file.data),
    )
    .await;

    let delivery = match relayed {
        Ok(Ok(delivery)) => delivery,
        Ok(Err(e)) => {
            error!(error = %e, filename = %filename, caller, worker_id = worker.id, "relay failed");
            state.metrics.record_failure();
            reservation.release();
            return Err(e.into());
        }
        Err(_) => {
            error!(filename = %filename, caller, worker_id = worker.id, "relay timed out");
            state.metrics.record_failure();
            reservation.release();
            return Err(ApiError::RelayTimeout);
        }
    };

    reservation.commit();
    state.metrics.record_success(size);

    let file_id = delivery.file_id_or_message_id();
    let digest = pack(&filename, size, &file.content_type, file_id);
    let token = short_hash(&digest, state.config.hash_length);
    let host = &state.config.public_url;

    Ok(UploadResult {
        stream_url: stream_url(host, delivery.message_id, token),
        download_url: download_url(host, delivery.message_id, token),
        hash: token.to_string(),
        message_id: delivery.message_id,
        mime_type: file.content_type,
        filename,
        size,
        upload_time: Utc::now(),
    })
}

/// The relay step: upload the bytes through the worker's session, then send
/// the media message carrying them.
async fn relay_file(
    worker: &Worker,
    filename: &str,
    mime_type: &str,
    data: Bytes,
) -> Result<Delivery, RelayError> {
    let handle = worker.session.upload(filename, data).await?;
    worker
        .session
        .send_media(MediaPayload {
            kind: MediaKind::from_mime(mime_type),
            mime_type: mime_type.to_string(),
            filename: filename.to_string(),
            caption: format!("uploaded via API: {filename}"),
            handle,
        })
        .await
}

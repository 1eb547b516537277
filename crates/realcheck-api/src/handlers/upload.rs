//! Upload and scoring handler.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::Json;
use realcheck_models::{is_allowed_file, Verdict};
use realcheck_storage::{sanitize_filename, StagedFile};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// Multipart field carrying the upload.
const FILE_FIELD: &str = "file";

/// Successful upload response.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    /// Sanitized client filename, before any collision suffix
    pub filename: String,
    /// Path the upload was staged at
    pub filepath: String,
    /// Classifier score rounded to one decimal
    pub percentage: f64,
    /// Human-readable verdict, e.g. "87.5% sure this is AI"
    pub analysis_result: String,
    /// Whether the real classifier produced the score
    pub model_used: bool,
}

/// A file part pulled out of the multipart body.
struct UploadedFile {
    file_name: Option<String>,
    data: Bytes,
}

/// Accept one file, score it, and delete it.
///
/// POST /upload
pub async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<UploadResponse>> {
    let multipart = multipart.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let upload = read_file_field(multipart)
        .await?
        .ok_or_else(|| ApiError::validation("No file provided"))?;

    let client_name = upload
        .file_name
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ApiError::validation("No file selected"))?;

    if !is_allowed_file(&client_name) {
        return Err(ApiError::validation("File type not allowed"));
    }

    let filename = sanitize_filename(&client_name);
    if filename.is_empty() {
        return Err(ApiError::validation("Invalid filename"));
    }

    let staged = state.staging.stage(&filename, &upload.data).await?;
    drop(upload.data);

    // Deletes the upload if the request is dropped before cleanup runs
    let guard = scopeguard::guard(staged.path().to_path_buf(), remove_abandoned);

    let start = Instant::now();
    let outcome = state.analyzer.analyze(staged.path()).await;

    metrics::record_upload(outcome.kind.as_str(), staged.size());
    metrics::record_analysis_duration(
        outcome.kind.as_str(),
        outcome.model_used,
        start.elapsed().as_secs_f64(),
    );
    if let Some(reason) = outcome.fallback {
        metrics::record_fallback(reason.as_str());
    }

    let filepath = staged.path().display().to_string();
    discard(&staged).await;
    scopeguard::ScopeGuard::into_inner(guard);
    state.analyzer.reclaim_memory();

    let verdict = Verdict::from_score(outcome.percentage);
    metrics::record_verdict(verdict.label.as_str());

    info!(
        filename = %filename,
        kind = %outcome.kind,
        percentage = outcome.percentage,
        model_used = outcome.model_used,
        verdict = %verdict,
        "Upload analyzed"
    );

    Ok(Json(UploadResponse {
        message: "File uploaded successfully".to_string(),
        filename,
        filepath,
        percentage: outcome.percentage,
        analysis_result: verdict.message(),
        model_used: outcome.model_used,
    }))
}

/// Pull the `file` part out of the body, skipping any other fields.
async fn read_file_field(mut multipart: Multipart) -> ApiResult<Option<UploadedFile>> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(|s| s.to_string());
        let data = field.bytes().await?;
        return Ok(Some(UploadedFile { file_name, data }));
    }

    Ok(None)
}

/// Delete the staged upload; failures are logged and counted, never raised.
async fn discard(staged: &StagedFile) {
    if let Err(e) = staged.remove().await {
        warn!(path = %staged.path().display(), error = %e, "Failed to delete staged upload");
        metrics::record_cleanup_failure();
    }
}

/// Blocking delete for uploads abandoned by a cancelled request.
fn remove_abandoned(path: PathBuf) {
    match std::fs::remove_file(&path) {
        Ok(()) => warn!(path = %path.display(), "Request cancelled, staged upload deleted"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to delete abandoned upload");
            metrics::record_cleanup_failure();
        }
    }
}

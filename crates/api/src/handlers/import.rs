//! Handlers for CSV sheet uploads and import job polling.
//!
//! Uploads are `multipart/form-data` with the sheet in a `csvfile`
//! part. Preview endpoints parse synchronously and return rows without
//! creating a job; start endpoints hand the parsed rows to a background
//! executor and answer `202 Accepted` with the job id to poll.

use std::sync::Arc;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use chorus_core::rows::{self, CollectionRow, EventRow, PREVIEW_ROW_LIMIT};
use chorus_core::{EventKind, ImportJob, JobId};
use chorus_jobs::{runner, CatalogId, Resolutions};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Query parameters for event sheet uploads.
#[derive(Debug, Deserialize)]
pub struct EventUploadParams {
    /// Event kind tag, `REHEARSAL` or `SERVICE`.
    #[serde(rename = "type")]
    pub kind: String,
}

/// 202 payload for accepted imports.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobAccepted {
    pub job_id: JobId,
}

// ── Event sheets ─────────────────────────────────────────────────────

/// POST /api/v1/import/events/preview?type=REHEARSAL|SERVICE
///
/// Parse the uploaded sheet and return its first rows for user
/// confirmation. Nothing is imported and no job is created.
pub async fn preview_events(
    Query(params): Query<EventUploadParams>,
    multipart: Multipart,
) -> AppResult<Json<Vec<EventRow>>> {
    event_kind(&params)?;
    let (csv_data, _) = read_upload(multipart).await?;

    let mut rows = rows::parse_event_rows(&csv_data)?;
    rows.truncate(PREVIEW_ROW_LIMIT);
    Ok(Json(rows))
}

/// POST /api/v1/import/events?type=REHEARSAL|SERVICE
///
/// Parse the sheet, start the import in the background, and return the
/// job id with `202 Accepted`.
pub async fn start_events(
    State(state): State<AppState>,
    Query(params): Query<EventUploadParams>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<JobAccepted>)> {
    let kind = event_kind(&params)?;
    let (csv_data, _) = read_upload(multipart).await?;
    let rows = rows::parse_event_rows(&csv_data)?;

    let job_id = runner::start_event_import(
        Arc::clone(&state.registry),
        Arc::clone(&state.catalog),
        kind,
        rows,
    )
    .await;

    Ok((StatusCode::ACCEPTED, Json(JobAccepted { job_id })))
}

// ── Collection sheets ────────────────────────────────────────────────

/// POST /api/v1/import/collections/{id}/preview
///
/// Parse the uploaded sheet and return its first rows. 404 when the
/// collection does not exist.
pub async fn preview_collection(
    State(state): State<AppState>,
    Path(id): Path<CatalogId>,
    multipart: Multipart,
) -> AppResult<Json<Vec<CollectionRow>>> {
    ensure_collection(&state, id).await?;
    let (csv_data, _) = read_upload(multipart).await?;

    let mut rows = rows::parse_collection_rows(&csv_data)?;
    rows.truncate(PREVIEW_ROW_LIMIT);
    Ok(Json(rows))
}

/// POST /api/v1/import/collections/{id}
///
/// Start a collection import. An optional `resolutions` part carries a
/// JSON object keyed by row index with user answers for rows the
/// matcher reported as ambiguous.
pub async fn start_collection(
    State(state): State<AppState>,
    Path(id): Path<CatalogId>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<JobAccepted>)> {
    ensure_collection(&state, id).await?;
    let (csv_data, raw_resolutions) = read_upload(multipart).await?;
    let rows = rows::parse_collection_rows(&csv_data)?;

    let resolutions: Resolutions = match raw_resolutions {
        Some(raw) => serde_json::from_str(&raw)
            .map_err(|e| AppError::BadRequest(format!("Invalid resolutions: {e}")))?,
        None => Resolutions::default(),
    };

    let job_id = runner::start_collection_import(
        Arc::clone(&state.registry),
        Arc::clone(&state.catalog),
        id,
        rows,
        resolutions,
    )
    .await;

    Ok((StatusCode::ACCEPTED, Json(JobAccepted { job_id })))
}

// ── Job status ───────────────────────────────────────────────────────

/// GET /api/v1/import/status/{job_id}
///
/// Current snapshot of an import job. Unknown and expired ids both
/// return 404; pollers must treat that as the job being gone.
pub async fn job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> AppResult<Json<ImportJob>> {
    let job = state
        .registry
        .snapshot(&job_id)
        .await
        .ok_or(AppError::JobNotFound)?;
    Ok(Json(job))
}

// ── Private helpers ──────────────────────────────────────────────────

fn event_kind(params: &EventUploadParams) -> AppResult<EventKind> {
    match params.kind.as_str() {
        "REHEARSAL" => Ok(EventKind::Rehearsal),
        "SERVICE" => Ok(EventKind::Service),
        other => Err(AppError::BadRequest(format!(
            "Unknown event type \"{other}\". Expected REHEARSAL or SERVICE."
        ))),
    }
}

async fn ensure_collection(state: &AppState, id: CatalogId) -> AppResult<()> {
    state
        .catalog
        .collection(id)
        .await?
        .ok_or(AppError::CollectionNotFound)?;
    Ok(())
}

/// Pull the `csvfile` part (and the optional `resolutions` part) out of
/// a multipart upload.
async fn read_upload(mut multipart: Multipart) -> AppResult<(Vec<u8>, Option<String>)> {
    let mut csv_data: Option<Vec<u8>> = None;
    let mut resolutions: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("csvfile") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                csv_data = Some(bytes.to_vec());
            }
            Some("resolutions") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                resolutions = Some(text);
            }
            _ => {}
        }
    }

    let csv_data =
        csv_data.ok_or_else(|| AppError::BadRequest("No CSV file uploaded.".to_string()))?;
    Ok((csv_data, resolutions))
}

//! Launching import jobs onto background tasks.
//!
//! Callers get the job id back immediately; the executor runs on a
//! spawned task and reports through the registry. Executors always
//! drive their job to a terminal state, so a returned id can be polled
//! until `completed` or `failed`.

use std::sync::Arc;

use chorus_core::rows::{CollectionRow, EventRow};
use chorus_core::{EventKind, JobId};

use crate::catalog::{Catalog, CatalogId};
use crate::collection_import::{self, Resolutions};
use crate::event_import;
use crate::registry::JobRegistry;

/// Start an event import in the background and return its job id.
pub async fn start_event_import(
    registry: Arc<JobRegistry>,
    catalog: Arc<dyn Catalog>,
    kind: EventKind,
    rows: Vec<EventRow>,
) -> JobId {
    let job_id = registry.create().await;
    registry.mark_running(&job_id).await;
    tracing::info!(job_id = %job_id, kind = %kind, rows = rows.len(), "Starting event import");

    let id = job_id.clone();
    tokio::spawn(async move {
        event_import::run(&registry, catalog.as_ref(), &id, kind, rows).await;
    });
    job_id
}

/// Start a collection import in the background and return its job id.
pub async fn start_collection_import(
    registry: Arc<JobRegistry>,
    catalog: Arc<dyn Catalog>,
    collection_id: CatalogId,
    rows: Vec<CollectionRow>,
    resolutions: Resolutions,
) -> JobId {
    let job_id = registry.create().await;
    registry.mark_running(&job_id).await;
    tracing::info!(
        job_id = %job_id,
        collection_id,
        rows = rows.len(),
        "Starting collection import"
    );

    let id = job_id.clone();
    tokio::spawn(async move {
        collection_import::run(&registry, catalog.as_ref(), &id, collection_id, rows, resolutions)
            .await;
    });
    job_id
}

// ── Tests ────────────────────────────────────────────────────────────

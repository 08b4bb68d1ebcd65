//! Import job snapshots as exchanged on the status wire.

use serde::{Deserialize, Serialize};

use crate::{JobId, JobStatus};

/// Snapshot of one import job.
///
/// The server appends log lines and bumps progress while an executor
/// runs; a polling client replaces its whole view with each snapshot.
/// `result` is set exactly when the job completes, `error` exactly when
/// it fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportJob {
    pub id: JobId,
    pub status: JobStatus,
    /// Rows processed so far. Never exceeds `total` once `total > 0`.
    pub progress: u32,
    /// Row count of the sheet; 0 until the executor has counted it.
    pub total: u32,
    /// Append-only on the server side.
    pub logs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ImportResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ImportJob {
    /// Fresh pending job with empty counters.
    pub fn new(id: JobId) -> Self {
        Self {
            id,
            status: JobStatus::Pending,
            progress: 0,
            total: 0,
            logs: Vec::new(),
            result: None,
            error: None,
        }
    }
}

/// Outcome payload of a completed job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    /// Human-readable summary, surfaced verbatim by clients.
    pub message: String,
    pub added_count: u32,
    /// Row-level errors that did not fail the job as a whole.
    #[serde(default)]
    pub errors: Vec<String>,
}

// ── Tests ────────────────────────────────────────────────────────────

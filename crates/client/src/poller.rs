//! Fixed-cadence polling of a running import job.
//!
//! The server keeps the full log list and the row counters on the job
//! snapshot; the poller fetches that snapshot every 500ms and hands the
//! derived percentage plus the log lines to a display callback. It
//! stops on the first terminal snapshot, on cancellation, or on a
//! failed status request.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use chorus_core::progress::percent_complete;
use chorus_core::{ImportResult, JobStatus};

use crate::api::{ImportApi, ImportApiError};

/// Delay between status requests. The first request fires immediately.
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// How a polling loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The job reached `completed`, carrying the result payload from
    /// the final snapshot when the server attached one.
    Completed(Option<ImportResult>),
    /// The job reached `failed` with the server's error message.
    Failed(Option<String>),
    /// The cancellation token fired before a terminal snapshot.
    Cancelled,
    /// A status request failed. Polling stops without retry; the job
    /// may well still be running server-side.
    TransportError(String),
}

impl PollOutcome {
    fn from_error(job_id: &str, e: ImportApiError) -> Self {
        tracing::warn!(job_id, error = %e, "Status request failed, stopping poll");
        Self::TransportError(e.to_string())
    }
}

/// Poll the status endpoint until the job is terminal.
///
/// `on_update` runs once per snapshot with the completed percentage
/// (0 when the total is still unknown) and the job's log lines; the
/// lines replace whatever the display currently shows, they are never
/// appended. Statuses only move forward, so the first terminal
/// snapshot is also the last distinct one and the loop returns there.
///
/// Once `cancel` fires, no further status request is issued.
pub async fn poll_until_terminal(
    api: &ImportApi,
    job_id: &str,
    cancel: &CancellationToken,
    mut on_update: impl FnMut(u8, &[String]),
) -> PollOutcome {
    let mut ticker = tokio::time::interval(POLL_INTERVAL);

    loop {
        // Biased so a pending cancellation always beats a due tick.
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!(job_id, "Polling cancelled");
                return PollOutcome::Cancelled;
            }
            _ = ticker.tick() => {}
        }

        let job = match api.job_status(job_id).await {
            Ok(job) => job,
            Err(e) => return PollOutcome::from_error(job_id, e),
        };

        tracing::debug!(
            job_id,
            status = %job.status,
            progress = job.progress,
            total = job.total,
            "Polled import status",
        );

        on_update(percent_complete(job.progress, job.total), &job.logs);

        match job.status {
            JobStatus::Completed => return PollOutcome::Completed(job.result),
            JobStatus::Failed => return PollOutcome::Failed(job.error),
            JobStatus::Pending | JobStatus::Running => {}
        }
    }
}

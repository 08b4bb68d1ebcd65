//! Periodic expiry of finished import jobs.
//!
//! Terminal jobs stay queryable for a grace period so slow pollers can
//! still read the outcome, then get dropped to keep the registry
//! bounded. Runs on a fixed interval until cancelled.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::registry::JobRegistry;

/// How often the sweep runs.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Run the job expiry loop until `cancel` is triggered.
///
/// Jobs are dropped `ttl` after reaching a terminal state. Pending and
/// running jobs are never touched.
pub async fn run(registry: Arc<JobRegistry>, ttl: Duration, cancel: CancellationToken) {
    tracing::info!(
        ttl_secs = ttl.as_secs(),
        interval_secs = SWEEP_INTERVAL.as_secs(),
        "Job expiry sweep started"
    );

    let mut interval = tokio::time::interval(SWEEP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Job expiry sweep stopping");
                break;
            }
            _ = interval.tick() => {
                let reaped = registry.reap_expired(ttl).await;
                if reaped > 0 {
                    tracing::info!(reaped, "Job expiry: dropped finished jobs");
                } else {
                    tracing::debug!("Job expiry: nothing to drop");
                }
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chorus_core::ImportResult;

    #[tokio::test(start_paused = true)]
    async fn test_sweep_drops_expired_jobs_and_stops_on_cancel() {
        let registry = Arc::new(JobRegistry::new());
        let done = registry.create().await;
        registry
            .complete(
                &done,
                ImportResult {
                    message: "done".into(),
                    added_count: 0,
                    errors: vec![],
                },
            )
            .await;

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(registry.clone(), Duration::ZERO, cancel.clone()));

        // First tick fires immediately; give the task a chance to run.
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(registry.job_count().await, 0);

        cancel.cancel();
        handle.await.unwrap();
    }
}

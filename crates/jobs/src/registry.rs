//! In-memory registry of import jobs.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chorus_core::{ImportJob, ImportResult, JobId, JobStatus};
use tokio::sync::RwLock;
use uuid::Uuid;

/// A registered job plus its server-side expiry bookkeeping.
struct JobEntry {
    job: ImportJob,
    /// Set when the job reaches a terminal state; drives expiry.
    terminal_at: Option<Instant>,
}

/// Tracks every import job the server has accepted.
///
/// Thread-safe via interior `RwLock`; designed to be wrapped in `Arc`
/// and shared across handlers, executors, and the expiry sweep. Status
/// transitions only move forward (pending → running → terminal), and a
/// terminal snapshot never changes again: late progress updates and
/// log lines are dropped, late `complete`/`fail` calls are rejected.
pub struct JobRegistry {
    jobs: RwLock<HashMap<JobId, JobEntry>>,
}

impl JobRegistry {
    /// Create a new, empty registry.
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
        }
    }

    /// Register a fresh pending job and return its id.
    pub async fn create(&self) -> JobId {
        let id = Uuid::new_v4().to_string();
        let entry = JobEntry {
            job: ImportJob::new(id.clone()),
            terminal_at: None,
        };
        self.jobs.write().await.insert(id.clone(), entry);
        id
    }

    /// Clone out the current snapshot of a job.
    pub async fn snapshot(&self, id: &str) -> Option<ImportJob> {
        self.jobs.read().await.get(id).map(|entry| entry.job.clone())
    }

    /// Move a pending job to running. Any other starting state is left
    /// untouched.
    pub async fn mark_running(&self, id: &str) {
        if let Some(entry) = self.jobs.write().await.get_mut(id) {
            if entry.job.status == JobStatus::Pending {
                entry.job.status = JobStatus::Running;
            }
        }
    }

    /// Append a `[HH:MM:SS] message` log line. Dropped once the job is
    /// terminal.
    pub async fn append_log(&self, id: &str, message: &str) {
        if let Some(entry) = self.jobs.write().await.get_mut(id) {
            if entry.job.status.is_terminal() {
                return;
            }
            let stamp = chrono::Local::now().format("%H:%M:%S");
            entry.job.logs.push(format!("[{stamp}] {message}"));
        }
    }

    /// Record row progress. `progress` is clamped to `total` when a
    /// total is known; updates after the terminal state are dropped.
    pub async fn update_progress(&self, id: &str, progress: u32, total: u32) {
        if let Some(entry) = self.jobs.write().await.get_mut(id) {
            if entry.job.status.is_terminal() {
                return;
            }
            entry.job.total = total;
            entry.job.progress = if total > 0 { progress.min(total) } else { progress };
        }
    }

    /// Mark a job completed with its result payload.
    ///
    /// Returns `false` without touching the job when it is unknown or
    /// already terminal.
    pub async fn complete(&self, id: &str, result: ImportResult) -> bool {
        let mut jobs = self.jobs.write().await;
        let Some(entry) = jobs.get_mut(id) else {
            return false;
        };
        if entry.job.status.is_terminal() {
            return false;
        }
        entry.job.status = JobStatus::Completed;
        entry.job.result = Some(result);
        entry.terminal_at = Some(Instant::now());
        true
    }

    /// Mark a job failed with an error message.
    ///
    /// Returns `false` without touching the job when it is unknown or
    /// already terminal.
    pub async fn fail(&self, id: &str, error: &str) -> bool {
        let mut jobs = self.jobs.write().await;
        let Some(entry) = jobs.get_mut(id) else {
            return false;
        };
        if entry.job.status.is_terminal() {
            return false;
        }
        entry.job.status = JobStatus::Failed;
        entry.job.error = Some(error.to_string());
        entry.terminal_at = Some(Instant::now());
        true
    }

    /// Drop terminal jobs that finished at least `ttl` ago. Returns the
    /// number of jobs removed; running and pending jobs are never
    /// touched.
    pub async fn reap_expired(&self, ttl: Duration) -> usize {
        let mut jobs = self.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|_, entry| match entry.terminal_at {
            Some(at) => at.elapsed() < ttl,
            None => true,
        });
        before - jobs.len()
    }

    /// Current number of tracked jobs.
    pub async fn job_count(&self) -> usize {
        self.jobs.read().await.len()
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ────────────────────────────────────────────────────────────

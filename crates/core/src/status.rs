//! Import job lifecycle states.

use serde::{Deserialize, Serialize};

/// Lifecycle state of an import job.
///
/// Serialized lowercase on the wire (`"pending"`, `"running"`,
/// `"completed"`, `"failed"`). Transitions only ever move forward:
/// pending → running → completed | failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Created but not yet picked up by an executor.
    Pending,
    /// An executor is working through the rows.
    Running,
    /// Finished; a result payload is available.
    Completed,
    /// Aborted; an error message is available.
    Failed,
}

impl JobStatus {
    /// Completed and failed jobs never change state again.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Position in the forward-only progression:
    /// pending (0) < running (1) < terminal (2).
    pub fn rank(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Running => 1,
            Self::Completed | Self::Failed => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Tests ────────────────────────────────────────────────────────────

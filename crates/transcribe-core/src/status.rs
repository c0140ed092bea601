//! Job lifecycle status.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a single transcription job.
///
/// Ordered by lifecycle progression `NONE < UPLOADED < QUEUED < IN_PROGRESS <
/// {SUCCEEDED, FAILED}`. SUCCEEDED and FAILED are both terminal but are not
/// mutually ordered, so this type intentionally does not derive `Ord` --
/// callers compare lifecycle position via [`JobStatus::rank`] and check
/// terminality via [`JobStatus::is_terminal`] rather than relying on a total
/// order that would falsely rank one terminal state above the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobStatus {
    /// Initial/unknown sentinel. Never reported by the provider.
    None,
    /// Local upload completed; not yet submitted to the provider.
    Uploaded,
    Queued,
    InProgress,
    Succeeded,
    Failed,
}

impl JobStatus {
    /// Position in the lifecycle order. Equal ranks for SUCCEEDED/FAILED would
    /// be wrong since they're a terminal set, not a next step after each
    /// other; callers needing "did this advance" should gate on
    /// `!is_terminal()` first, which is how this crate always uses it.
    pub fn rank(self) -> u8 {
        match self {
            JobStatus::None => 0,
            JobStatus::Uploaded => 1,
            JobStatus::Queued => 2,
            JobStatus::InProgress => 3,
            JobStatus::Succeeded => 4,
            JobStatus::Failed => 4,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }

    /// True iff moving from `self` to `next` is a legal, non-regressing
    /// transition. Terminal states never accept a further transition, even to
    /// the same rank (that case is handled separately by `job_completed`).
    pub fn can_advance_to(self, next: JobStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        next.rank() >= self.rank()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::None => "NONE",
            JobStatus::Uploaded => "UPLOADED",
            JobStatus::Queued => "QUEUED",
            JobStatus::InProgress => "IN_PROGRESS",
            JobStatus::Succeeded => "SUCCEEDED",
            JobStatus::Failed => "FAILED",
        }
    }

    /// Maps a provider status string per the §4.5 table. Unknown strings
    /// yield `None`, which the orchestrator treats as a contract violation to
    /// log and skip.
    pub fn from_provider_str(s: &str) -> JobStatus {
        match s {
            "QUEUED" => JobStatus::Queued,
            "IN_PROGRESS" => JobStatus::InProgress,
            "FAILED" => JobStatus::Failed,
            "COMPLETED" => JobStatus::Succeeded,
            _ => JobStatus::None,
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

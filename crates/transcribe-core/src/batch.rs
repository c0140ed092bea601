//! Batch result container: atomic per-job mutators plus summary accessors.

use crate::job::TranscribeJob;
use crate::status::JobStatus;
use std::collections::HashMap;

/// Per-status counts derived from a [`TranscribeBatchResult`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub none: usize,
    pub uploaded: usize,
    pub queued: usize,
    pub in_progress: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub count_total: usize,
}

impl BatchSummary {
    pub fn count_completed(&self) -> usize {
        self.succeeded + self.failed
    }

    pub fn count(&self, status: JobStatus) -> usize {
        match status {
            JobStatus::None => self.none,
            JobStatus::Uploaded => self.uploaded,
            JobStatus::Queued => self.queued,
            JobStatus::InProgress => self.in_progress,
            JobStatus::Succeeded => self.succeeded,
            JobStatus::Failed => self.failed,
        }
    }
}

/// Mapping FQID -> job state. Cloning this type is the crate's
/// shallow-copy-on-write mechanism: an owned `HashMap` of owned `TranscribeJob`
/// values has no shared mutable identity, so a clone handed to an observer is
/// never touched by a subsequent mutation of the orchestrator's live copy.
#[derive(Debug, Clone, Default)]
pub struct TranscribeBatchResult {
    jobs_by_id: HashMap<String, TranscribeJob>,
}

impl TranscribeBatchResult {
    pub fn new(jobs_by_id: HashMap<String, TranscribeJob>) -> Self {
        Self { jobs_by_id }
    }

    pub fn jobs(&self) -> impl Iterator<Item = &TranscribeJob> {
        self.jobs_by_id.values()
    }

    pub fn get(&self, fqid: &str) -> Option<&TranscribeJob> {
        self.jobs_by_id.get(fqid)
    }

    pub fn len(&self) -> usize {
        self.jobs_by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs_by_id.is_empty()
    }

    pub fn has_any_unresolved(&self) -> bool {
        self.jobs_by_id.values().any(|j| !j.status.is_terminal())
    }

    pub fn summary(&self) -> BatchSummary {
        let mut summary = BatchSummary {
            count_total: self.jobs_by_id.len(),
            ..Default::default()
        };
        for job in self.jobs_by_id.values() {
            match job.status {
                JobStatus::None => summary.none += 1,
                JobStatus::Uploaded => summary.uploaded += 1,
                JobStatus::Queued => summary.queued += 1,
                JobStatus::InProgress => summary.in_progress += 1,
                JobStatus::Succeeded => summary.succeeded += 1,
                JobStatus::Failed => summary.failed += 1,
            }
        }
        summary
    }

    /// True iff the stored job is already terminal with exactly `incoming_status`
    /// -- used to skip redundant provider reports before doing any further work
    /// (e.g. a transcript fetch) for a job we've already resolved.
    pub fn job_completed(&self, fqid: &str, incoming_status: JobStatus) -> bool {
        match self.jobs_by_id.get(fqid) {
            Some(job) => job.status.is_terminal() && job.status.as_str() == incoming_status.as_str(),
            None => false,
        }
    }

    /// Applies a status/transcript update to `fqid`, returning true iff any
    /// field actually changed. A no-op (and `false`) if the job is missing, if
    /// the job is already terminal (monotonicity enforcement -- logs a warning
    /// when the rejected transition would have been a real change), or if
    /// neither field differs from the stored value.
    pub fn update_job(
        &mut self,
        fqid: &str,
        status: Option<JobStatus>,
        transcript: Option<String>,
    ) -> bool {
        let Some(job) = self.jobs_by_id.get_mut(fqid) else {
            tracing::warn!(fqid = %fqid, "update_job called for unknown fqid");
            return false;
        };

        if let Some(new_status) = status {
            if job.status.is_terminal() {
                if job.status.as_str() != new_status.as_str() {
                    tracing::warn!(
                        fqid = %fqid,
                        stored_status = %job.status,
                        rejected_status = %new_status,
                        "rejected non-monotonic status transition for terminal job"
                    );
                }
                return false;
            }
        }

        let mut changed = false;

        if let Some(new_status) = status {
            if new_status.as_str() != job.status.as_str() {
                job.status = new_status;
                changed = true;
            }
        }

        if let Some(new_transcript) = transcript {
            if new_transcript != job.transcript {
                job.transcript = new_transcript;
                changed = true;
            }
        }

        changed
    }
}

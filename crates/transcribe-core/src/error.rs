//! Crate-boundary error taxonomy for the batch orchestrator.

use thiserror::Error;

/// Errors that can escape `transcribe-core`'s public API.
///
/// Per-job provider errors (start/list/get/transcript-parse) are absorbed and
/// logged inside the orchestrator tick and never reach this type except for
/// the two cases the spec calls out as batch-aborting: a non-throttle
/// `list_jobs` failure and any upload failure.
#[derive(Debug, Error)]
pub enum TranscribeError {
    #[error("missing required env var {0}")]
    MissingConfig(String),

    #[error("failed to initialize capability handle: {0}")]
    InitFailed(#[source] anyhow::Error),

    #[error("upload failed for job {fqid}: {source}")]
    UploadFailed {
        fqid: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("provider call failed: {0}")]
    ProviderCallFailed(#[source] anyhow::Error),

    #[error("failed to parse transcript for job {fqid}: {reason}")]
    TranscriptParseError { fqid: String, reason: String },
}

pub type Result<T> = std::result::Result<T, TranscribeError>;

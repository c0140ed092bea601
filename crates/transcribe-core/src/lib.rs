//! Synchronous batch speech-to-text orchestration core.
//!
//! Given a set of audio files, uploads each to an object store, submits a
//! transcription job per file to a managed cloud transcription provider, then
//! polls provider-wide status listings until every job resolves. Returns a
//! batch result mapping each job identifier to its final status and
//! transcript text, streaming incremental progress updates to a
//! caller-supplied observer throughout.
//!
//! The object store and transcription provider are injected as the
//! [`ObjectStore`] and [`TranscriptionProvider`] traits; this crate has no
//! knowledge of any specific cloud vendor. See the `transcribe-aws` crate for
//! an AWS-backed implementation of both.

mod batch;
mod capability;
mod config;
mod error;
mod job;
mod orchestrator;
mod registry;
mod status;
mod update;

pub use batch::{BatchSummary, TranscribeBatchResult};
pub use capability::{
    JobDescriptor, JobListingPage, JobSummary, ObjectAcl, ObjectStore, StartJobRequest,
    TranscriptionProvider,
};
pub use config::{ConfigMap, ServiceConfig};
pub use error::{Result, TranscribeError};
pub use job::{TranscribeJob, TranscribeJobRequest};
pub use orchestrator::{get_s3_path, media_uri, TranscribeService};
pub use registry::{
    init_transcription_service, DynOnUpdate, DynTranscriptionService, ServiceFactory,
    ServiceRegistry,
};
pub use status::JobStatus;
pub use update::TranscribeJobsUpdate;

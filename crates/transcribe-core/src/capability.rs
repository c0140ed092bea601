//! Capability traits the orchestrator is generic over: an object store for
//! uploading source audio, and a transcription provider for submitting and
//! polling jobs. Concrete AWS-backed implementations live in the
//! `transcribe-aws` crate; tests in this crate use in-memory mocks.

use async_trait::async_trait;

/// Object-store ACL requested for an uploaded object. The spec only ever
/// requests `PublicRead`, but the type is kept open for future backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectAcl {
    Private,
    PublicRead,
}

/// Upload capability. Any error propagates out of `transcribe()` and aborts
/// the batch -- uploads are never retried by the orchestrator.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(
        &self,
        local_path: &str,
        bucket: &str,
        key: &str,
        acl: ObjectAcl,
    ) -> anyhow::Result<()>;
}

/// Request to start a transcription job.
#[derive(Debug, Clone)]
pub struct StartJobRequest {
    pub name: String,
    pub language_code: String,
    pub media_uri: String,
    pub media_format: String,
}

/// One row of a `list_jobs` response page.
#[derive(Debug, Clone)]
pub struct JobSummary {
    pub name: String,
    pub status: String,
}

/// A page of job listing results.
#[derive(Debug, Clone, Default)]
pub struct JobListingPage {
    pub summaries: Vec<JobSummary>,
    pub next_page_token: Option<String>,
}

/// The subset of a provider's job descriptor the transcript loader needs.
#[derive(Debug, Clone)]
pub struct JobDescriptor {
    pub status: String,
    pub transcript_file_uri: Option<String>,
}

/// Transcription provider capability: start a job, list jobs by a batch-id
/// substring (paginated), and fetch one job's descriptor.
#[async_trait]
pub trait TranscriptionProvider: Send + Sync {
    async fn start_job(&self, request: StartJobRequest) -> anyhow::Result<()>;

    async fn list_jobs(
        &self,
        containing: &str,
        page_token: Option<String>,
    ) -> anyhow::Result<JobListingPage>;

    async fn get_job(&self, name: &str) -> anyhow::Result<JobDescriptor>;
}

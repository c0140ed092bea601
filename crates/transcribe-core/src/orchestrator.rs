//! The batch orchestrator: the upload -> start -> poll -> resolve state
//! machine described in SPEC_FULL.md §4.3-§4.6.

use crate::batch::TranscribeBatchResult;
use crate::capability::{
    JobListingPage, JobSummary, ObjectAcl, ObjectStore, StartJobRequest, TranscriptionProvider,
};
use crate::config::ServiceConfig;
use crate::error::TranscribeError;
use crate::job::TranscribeJobRequest;
use crate::status::JobStatus;
use crate::update::TranscribeJobsUpdate;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;
use std::time::Duration;
use uuid::Uuid;

type OnUpdate<'a> = Option<&'a mut dyn FnMut(&TranscribeJobsUpdate) -> anyhow::Result<()>>;

fn throttle_regex() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r"(?i)throttlingexception|limitexceeded").unwrap())
}

fn is_throttle(err: &anyhow::Error) -> bool {
    throttle_regex().is_match(&err.to_string())
}

/// `root_path + "/" + fqid.lower() + ext`, or just the suffix when
/// `root_path` is empty. `ext` includes its leading dot.
pub fn get_s3_path(source_file: &str, fqid: &str, root_path: &str) -> String {
    let ext = std::path::Path::new(source_file)
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let suffix = format!("{}{}", fqid.to_lowercase(), ext);
    if root_path.is_empty() {
        suffix
    } else {
        format!("{root_path}/{suffix}")
    }
}

/// Virtual path-style S3 URL the provider is told to read the media from.
pub fn media_uri(region: &str, bucket: &str, key: &str) -> String {
    format!("https://s3.{region}.amazonaws.com/{bucket}/{key}")
}

fn emit(result: &TranscribeBatchResult, mut ids_updated: Vec<String>, on_update: &mut OnUpdate<'_>) {
    if ids_updated.is_empty() {
        return;
    }
    ids_updated.sort();
    let update = TranscribeJobsUpdate {
        result: result.clone(),
        ids_updated,
    };
    if let Some(cb) = on_update.as_deref_mut() {
        if let Err(e) = cb(&update) {
            tracing::error!(error = %e, "observer callback raised; swallowing");
        }
    }
}

/// The orchestrator, generic over the two injected capability handles.
pub struct TranscribeService<O, P> {
    object_store: O,
    provider: P,
    config: ServiceConfig,
    http_client: reqwest::Client,
}

impl<O, P> TranscribeService<O, P>
where
    O: ObjectStore,
    P: TranscriptionProvider,
{
    pub fn new(object_store: O, provider: P, config: ServiceConfig) -> Self {
        Self {
            object_store,
            provider,
            config,
            http_client: reqwest::Client::new(),
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Runs one batch to completion: uploads every request's source file in
    /// order, opportunistically submits uploaded jobs, then polls until every
    /// job resolves. `on_update` is invoked at most once per tick and only
    /// when at least one job actually changed.
    pub async fn transcribe(
        &self,
        requests: Vec<TranscribeJobRequest>,
        batch_id: Option<String>,
        mut on_update: OnUpdate<'_>,
    ) -> Result<TranscribeBatchResult, TranscribeError> {
        let batch_id = match batch_id {
            Some(id) if !id.is_empty() => id,
            _ => Uuid::new_v4().to_string(),
        };

        let mut ordered_fqids = Vec::with_capacity(requests.len());
        let mut jobs_by_id = HashMap::with_capacity(requests.len());
        for request in requests {
            let job = request.into_job(&batch_id);
            let fqid = job.fqid();
            ordered_fqids.push(fqid.clone());
            jobs_by_id.insert(fqid, job);
        }
        let mut result = TranscribeBatchResult::new(jobs_by_id);

        tracing::info!(batch_id = %batch_id, jobs = result.len(), "starting transcription batch");

        for fqid in &ordered_fqids {
            let job = result
                .get(fqid)
                .expect("fqid just inserted above")
                .clone();
            let key = get_s3_path(&job.source_file, fqid, &self.config.s3_root_path);

            tracing::info!(fqid = %fqid, key = %key, "uploading source file");

            self.object_store
                .upload(&job.source_file, &self.config.s3_bucket, &key, ObjectAcl::PublicRead)
                .await
                .map_err(|source| TranscribeError::UploadFailed {
                    fqid: fqid.clone(),
                    source,
                })?;

            if result.update_job(fqid, Some(JobStatus::Uploaded), None) {
                emit(&result, vec![fqid.clone()], &mut on_update);
            }

            self.try_ensure_all_jobs_started(&mut result, &mut on_update)
                .await;
        }

        while result.has_any_unresolved() {
            if self.config.poll_interval_secs > 0.0 {
                tokio::time::sleep(Duration::from_secs_f64(self.config.poll_interval_secs)).await;
            }

            self.try_ensure_all_jobs_started(&mut result, &mut on_update)
                .await;
            result = self.update_status(&result, &batch_id, &mut on_update).await?;

            let summary = result.summary();
            tracing::info!(
                batch_id = %batch_id,
                completed = summary.count_completed(),
                total = summary.count_total,
                succeeded = summary.succeeded,
                failed = summary.failed,
                queued = summary.queued,
                in_progress = summary.in_progress,
                "poll tick complete"
            );
        }

        Ok(result)
    }

    /// Submits every UPLOADED job to the provider. A start-job error of any
    /// kind (throttle or otherwise) aborts the scan for this tick without
    /// propagating: the remaining UPLOADED jobs, including the one that just
    /// failed, are retried on the next tick.
    async fn try_ensure_all_jobs_started(
        &self,
        result: &mut TranscribeBatchResult,
        on_update: &mut OnUpdate<'_>,
    ) {
        let uploaded: Vec<_> = result
            .jobs()
            .filter(|j| j.status == JobStatus::Uploaded)
            .map(|j| j.fqid())
            .collect();

        let mut ids_updated = Vec::new();

        for fqid in uploaded {
            let job = result.get(&fqid).expect("fqid from snapshot exists").clone();
            let key = get_s3_path(&job.source_file, &fqid, &self.config.s3_root_path);
            let request = StartJobRequest {
                name: fqid.clone(),
                language_code: job.language_code.clone(),
                media_uri: media_uri(&self.config.aws_region, &self.config.s3_bucket, &key),
                media_format: job.media_format.clone(),
            };

            match self.provider.start_job(request).await {
                Ok(()) => {
                    if result.update_job(&fqid, Some(JobStatus::Queued), None) {
                        ids_updated.push(fqid);
                    }
                }
                Err(e) => {
                    if is_throttle(&e) {
                        tracing::info!(fqid = %fqid, "start_job throttled; retrying next tick");
                    } else {
                        tracing::error!(fqid = %fqid, error = %e, "start_job failed; retrying next tick");
                    }
                    break;
                }
            }
        }

        emit(result, ids_updated, on_update);
    }

    /// One status-update tick: fetch the current provider listing for this
    /// batch and fold it into a fresh snapshot. A non-throttle error from the
    /// listing adapter propagates and aborts the whole batch (§4.4); per-job
    /// errors (unknown status strings, transcript load failures) are absorbed
    /// and the affected job is retried next tick.
    async fn update_status(
        &self,
        result: &TranscribeBatchResult,
        batch_id: &str,
        on_update: &mut OnUpdate<'_>,
    ) -> Result<TranscribeBatchResult, TranscribeError> {
        let expected: HashSet<String> = result.jobs().map(|j| j.fqid()).collect();
        let summaries = self.get_batch_status(batch_id, expected).await?;

        let mut new_result = result.clone();
        let mut ids_updated = Vec::new();

        for summary in summaries {
            let status = JobStatus::from_provider_str(&summary.status);
            if status == JobStatus::None {
                tracing::warn!(
                    fqid = %summary.name,
                    reported = %summary.status,
                    "provider reported an unrecognized status; skipping"
                );
                continue;
            }

            if new_result.job_completed(&summary.name, status) {
                continue;
            }

            let transcript = if status == JobStatus::Succeeded {
                match self.load_transcript(&summary.name).await {
                    Ok(t) => t,
                    Err(e) => {
                        tracing::error!(
                            fqid = %summary.name,
                            error = %e,
                            "failed to load transcript; retrying next tick"
                        );
                        continue;
                    }
                }
            } else {
                String::new()
            };

            if new_result.update_job(&summary.name, Some(status), Some(transcript)) {
                ids_updated.push(summary.name);
            }
        }

        emit(&new_result, ids_updated, on_update);
        Ok(new_result)
    }

    /// Resilient paginated fetch of batch status, with the two mitigations
    /// for the known provider listing bug applied in order after each page:
    /// empty-page termination, then expected-set short-circuit.
    async fn get_batch_status(
        &self,
        batch_id: &str,
        mut still_need: HashSet<String>,
    ) -> Result<Vec<JobSummary>, TranscribeError> {
        let mut accumulated = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = match self.provider.list_jobs(batch_id, page_token.clone()).await {
                Ok(page) => page,
                Err(e) => {
                    if is_throttle(&e) {
                        tracing::info!(batch_id = %batch_id, "list_jobs throttled; returning partial listing");
                        return Ok(accumulated);
                    }
                    return Err(TranscribeError::ProviderCallFailed(e));
                }
            };

            if page.summaries.is_empty() {
                break;
            }

            for summary in page.summaries {
                still_need.remove(&summary.name);
                accumulated.push(summary);
            }

            if still_need.is_empty() {
                break;
            }

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(accumulated)
    }

    /// Fetches a SUCCEEDED job's transcript descriptor, then the transcript
    /// artifact itself, and extracts the text at `results.transcripts[0].transcript`.
    async fn load_transcript(&self, fqid: &str) -> Result<String, TranscribeError> {
        let descriptor = self
            .provider
            .get_job(fqid)
            .await
            .map_err(TranscribeError::ProviderCallFailed)?;

        let uri = descriptor
            .transcript_file_uri
            .ok_or_else(|| TranscribeError::TranscriptParseError {
                fqid: fqid.to_string(),
                reason: "transcript file uri missing from job descriptor".to_string(),
            })?;

        let response =
            self.http_client
                .get(&uri)
                .send()
                .await
                .map_err(|e| TranscribeError::TranscriptParseError {
                    fqid: fqid.to_string(),
                    reason: format!("transcript fetch failed: {e}"),
                })?;

        if !response.status().is_success() {
            return Err(TranscribeError::TranscriptParseError {
                fqid: fqid.to_string(),
                reason: format!("transcript fetch returned HTTP {}", response.status()),
            });
        }

        let body: serde_json::Value =
            response
                .json()
                .await
                .map_err(|e| TranscribeError::TranscriptParseError {
                    fqid: fqid.to_string(),
                    reason: format!("invalid transcript JSON: {e}"),
                })?;

        body.pointer("/results/transcripts/0/transcript")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| TranscribeError::TranscriptParseError {
                fqid: fqid.to_string(),
                reason: "missing results.transcripts[0].transcript".to_string(),
            })
    }
}

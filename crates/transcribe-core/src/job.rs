//! Per-job request and state types.

use crate::status::JobStatus;
use serde::{Deserialize, Serialize};

fn default_language_code() -> String {
    "en-US".to_string()
}

/// Caller input for a single job within a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscribeJobRequest {
    /// Ignored once the request is placed into a batch: the batch's own id
    /// always wins (§4.3 Main sequence, step 1).
    #[serde(default)]
    pub batch_id: Option<String>,
    pub job_id: String,
    pub source_file: String,
    #[serde(default)]
    pub language_code: Option<String>,
    #[serde(default)]
    pub media_format: Option<String>,
}

impl TranscribeJobRequest {
    pub fn new(job_id: impl Into<String>, source_file: impl Into<String>) -> Self {
        Self {
            batch_id: None,
            job_id: job_id.into(),
            source_file: source_file.into(),
            language_code: None,
            media_format: None,
        }
    }

    pub fn with_language_code(mut self, language_code: impl Into<String>) -> Self {
        self.language_code = Some(language_code.into());
        self
    }

    pub fn with_media_format(mut self, media_format: impl Into<String>) -> Self {
        self.media_format = Some(media_format.into());
        self
    }

    fn resolved_language_code(&self) -> String {
        self.language_code
            .clone()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_language_code)
    }

    fn resolved_media_format(&self) -> String {
        if let Some(fmt) = &self.media_format {
            if !fmt.is_empty() {
                return fmt.to_lowercase();
            }
        }
        std::path::Path::new(&self.source_file)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default()
    }

    /// Materializes this request into a job owned by `batch_id`, overriding
    /// any per-request `batch_id` the caller may have set.
    pub fn into_job(self, batch_id: &str) -> TranscribeJob {
        let language_code = self.resolved_language_code();
        let media_format = self.resolved_media_format();
        TranscribeJob {
            batch_id: batch_id.to_string(),
            job_id: self.job_id,
            source_file: self.source_file,
            media_format,
            language_code,
            status: JobStatus::None,
            transcript: String::new(),
        }
    }
}

/// Internal per-job state tracked by the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscribeJob {
    pub batch_id: String,
    pub job_id: String,
    pub source_file: String,
    pub media_format: String,
    pub language_code: String,
    pub status: JobStatus,
    pub transcript: String,
}

impl TranscribeJob {
    /// Fully qualified id: the unique key within a batch and the name
    /// submitted to the provider.
    pub fn fqid(&self) -> String {
        format!("{}-{}", self.batch_id, self.job_id)
    }
}

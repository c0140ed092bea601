//! Amazon Transcribe-backed [`TranscriptionProvider`] implementation.

use aws_config::BehaviorVersion;
use aws_sdk_transcribe::types::{LanguageCode, Media, MediaFormat};
use aws_sdk_transcribe::Client;
use transcribe_core::{JobDescriptor, JobListingPage, JobSummary, StartJobRequest, TranscriptionProvider};

#[derive(Clone)]
pub struct AwsTranscribeProvider {
    client: Client,
}

impl AwsTranscribeProvider {
    pub async fn new(
        region: &str,
        access_key_id: &str,
        secret_access_key: &str,
    ) -> anyhow::Result<Self> {
        let credentials = aws_credential_types::Credentials::new(
            access_key_id,
            secret_access_key,
            None,
            None,
            "transcribe-aws",
        );

        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()))
            .credentials_provider(credentials)
            .load()
            .await;

        Ok(Self {
            client: Client::new(&config),
        })
    }
}

#[async_trait::async_trait]
impl TranscriptionProvider for AwsTranscribeProvider {
    #[tracing::instrument(skip(self), fields(transcribe.job_name = %request.name))]
    async fn start_job(&self, request: StartJobRequest) -> anyhow::Result<()> {
        let media = Media::builder().media_file_uri(&request.media_uri).build();

        self.client
            .start_transcription_job()
            .transcription_job_name(&request.name)
            .media(media)
            .language_code(LanguageCode::from(request.language_code.as_str()))
            .media_format(MediaFormat::from(request.media_format.as_str()))
            .send()
            .await?;

        tracing::info!("transcription job started");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn list_jobs(
        &self,
        containing: &str,
        page_token: Option<String>,
    ) -> anyhow::Result<JobListingPage> {
        let mut request = self.client.list_transcription_jobs().job_name_contains(containing);
        if let Some(token) = page_token {
            request = request.next_token(token);
        }

        let response = request.send().await?;

        let summaries = response
            .transcription_job_summaries()
            .iter()
            .filter_map(|job| {
                let name = job.transcription_job_name()?.to_string();
                let status = job
                    .transcription_job_status()
                    .map(|s| s.as_str().to_string())
                    .unwrap_or_default();
                Some(JobSummary { name, status })
            })
            .collect();

        Ok(JobListingPage {
            summaries,
            next_page_token: response.next_token().map(|s| s.to_string()),
        })
    }

    #[tracing::instrument(skip(self))]
    async fn get_job(&self, name: &str) -> anyhow::Result<JobDescriptor> {
        let response = self
            .client
            .get_transcription_job()
            .transcription_job_name(name)
            .send()
            .await?;

        let job = response
            .transcription_job()
            .ok_or_else(|| anyhow::anyhow!("no transcription job in response for {name}"))?;

        let status = job
            .transcription_job_status()
            .map(|s| s.as_str().to_string())
            .unwrap_or_default();

        let transcript_file_uri = job
            .transcript()
            .and_then(|t| t.transcript_file_uri())
            .map(|s| s.to_string());

        Ok(JobDescriptor {
            status,
            transcript_file_uri,
        })
    }
}

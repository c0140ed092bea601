//! End-to-end orchestrator scenarios against in-memory capability mocks,
//! mirroring the concrete scenarios this crate's batch state machine is
//! expected to satisfy.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use transcribe_core::{
    JobDescriptor, JobListingPage, JobSummary, ObjectAcl, ObjectStore, ServiceConfig,
    StartJobRequest, TranscribeJobRequest, TranscribeJobsUpdate, TranscribeService,
    TranscriptionProvider,
};

#[derive(Clone, Default)]
struct MockObjectStore {
    uploads: Arc<Mutex<Vec<(String, String, String)>>>,
    fail_with: Arc<Mutex<Option<String>>>,
}

impl MockObjectStore {
    fn uploads(&self) -> Vec<(String, String, String)> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn upload(
        &self,
        local_path: &str,
        bucket: &str,
        key: &str,
        _acl: ObjectAcl,
    ) -> anyhow::Result<()> {
        if let Some(reason) = self.fail_with.lock().unwrap().take() {
            return Err(anyhow::anyhow!(reason));
        }
        self.uploads
            .lock()
            .unwrap()
            .push((local_path.to_string(), bucket.to_string(), key.to_string()));
        Ok(())
    }
}

#[derive(Clone, Default)]
struct MockProvider {
    start_calls: Arc<Mutex<Vec<StartJobRequest>>>,
    start_script: Arc<Mutex<VecDeque<Result<(), String>>>>,
    list_script: Arc<Mutex<VecDeque<Result<JobListingPage, String>>>>,
    get_job_by_name: Arc<Mutex<HashMap<String, JobDescriptor>>>,
}

impl MockProvider {
    fn start_calls(&self) -> Vec<StartJobRequest> {
        self.start_calls.lock().unwrap().clone()
    }

    fn push_start_throttle(&self) {
        self.start_script
            .lock()
            .unwrap()
            .push_back(Err("LimitExceeded (fake)".to_string()));
    }

    fn push_list_page(&self, summaries: Vec<(&str, &str)>) {
        self.list_script
            .lock()
            .unwrap()
            .push_back(Ok(JobListingPage {
                summaries: summaries
                    .into_iter()
                    .map(|(name, status)| JobSummary {
                        name: name.to_string(),
                        status: status.to_string(),
                    })
                    .collect(),
                next_page_token: None,
            }));
    }

    fn push_list_error(&self, message: &str) {
        self.list_script
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
    }

    fn set_transcript_uri(&self, name: &str, uri: &str) {
        self.get_job_by_name.lock().unwrap().insert(
            name.to_string(),
            JobDescriptor {
                status: "COMPLETED".to_string(),
                transcript_file_uri: Some(uri.to_string()),
            },
        );
    }
}

#[async_trait]
impl TranscriptionProvider for MockProvider {
    async fn start_job(&self, request: StartJobRequest) -> anyhow::Result<()> {
        let outcome = self.start_script.lock().unwrap().pop_front();
        self.start_calls.lock().unwrap().push(request);
        match outcome {
            Some(Err(msg)) => Err(anyhow::anyhow!(msg)),
            _ => Ok(()),
        }
    }

    async fn list_jobs(
        &self,
        _containing: &str,
        _page_token: Option<String>,
    ) -> anyhow::Result<JobListingPage> {
        match self.list_script.lock().unwrap().pop_front() {
            Some(Ok(page)) => Ok(page),
            Some(Err(msg)) => Err(anyhow::anyhow!(msg)),
            None => Ok(JobListingPage::default()),
        }
    }

    async fn get_job(&self, name: &str) -> anyhow::Result<JobDescriptor> {
        self.get_job_by_name
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no job descriptor registered for {name}"))
    }
}

fn test_config() -> ServiceConfig {
    ServiceConfig {
        aws_region: "us-east-1".to_string(),
        aws_access_key_id: "a".to_string(),
        aws_secret_access_key: "s".to_string(),
        s3_bucket: "test-bucket".to_string(),
        s3_root_path: String::new(),
        poll_interval_secs: 0.0,
    }
}

#[tokio::test]
async fn single_job_happy_path() {
    let objects = MockObjectStore::default();
    let provider = MockProvider::default();
    provider.push_list_page(vec![("b1-m1-u1", "IN_PROGRESS")]);
    provider.push_list_page(vec![("b1-m1-u1", "COMPLETED")]);
    provider.set_transcript_uri("b1-m1-u1", "https://transcripts.example/b1-m1-u1.json");

    // Swap the real HTTP fetch target for a local mock server serving the
    // expected transcript JSON shape.
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/b1-m1-u1.json")
        .with_status(200)
        .with_body(r#"{"results":{"transcripts":[{"transcript":"hello"}]}}"#)
        .create_async()
        .await;
    provider.set_transcript_uri("b1-m1-u1", &format!("{}/b1-m1-u1.json", server.url()));

    let service = TranscribeService::new(objects.clone(), provider.clone(), test_config());

    let events: Arc<Mutex<Vec<TranscribeJobsUpdate>>> = Arc::new(Mutex::new(Vec::new()));
    let events_clone = events.clone();
    let mut on_update = move |update: &TranscribeJobsUpdate| {
        events_clone.lock().unwrap().push(update.clone());
        Ok(())
    };

    let result = service
        .transcribe(
            vec![TranscribeJobRequest::new("m1-u1", "/audio/m1/u1.wav")],
            Some("b1".to_string()),
            Some(&mut on_update),
        )
        .await
        .unwrap();

    assert!(!result.has_any_unresolved());
    let job = result.get("b1-m1-u1").unwrap();
    assert_eq!(job.status.as_str(), "SUCCEEDED");
    assert_eq!(job.transcript, "hello");

    let uploads = objects.uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].1, "test-bucket");
    assert_eq!(uploads[0].2, "b1-m1-u1.wav");

    let starts = provider.start_calls();
    assert_eq!(starts.len(), 1);
    assert_eq!(starts[0].name, "b1-m1-u1");
    assert_eq!(starts[0].language_code, "en-US");
    assert_eq!(starts[0].media_format, "wav");
    assert_eq!(
        starts[0].media_uri,
        "https://s3.us-east-1.amazonaws.com/test-bucket/b1-m1-u1.wav"
    );

    let recorded = events.lock().unwrap();
    let statuses: Vec<String> = recorded
        .iter()
        .map(|u| {
            let fqid = &u.ids_updated[0];
            u.result.get(fqid).unwrap().status.to_string()
        })
        .collect();
    assert_eq!(statuses, vec!["UPLOADED", "QUEUED", "IN_PROGRESS", "SUCCEEDED"]);
}

#[tokio::test]
async fn mixed_failure_only_fetches_transcript_for_completed_job() {
    let objects = MockObjectStore::default();
    let provider = MockProvider::default();

    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/transcript.json")
        .with_status(200)
        .with_body(r#"{"results":{"transcripts":[{"transcript":"C"}]}}"#)
        .create_async()
        .await;
    provider.set_transcript_uri("b1-m1-u3", &format!("{}/transcript.json", server.url()));

    provider.push_list_page(vec![
        ("b1-m1-u1", "FAILED"),
        ("b1-m1-u2", "FAILED"),
        ("b1-m1-u3", "COMPLETED"),
    ]);

    let service = TranscribeService::new(objects, provider, test_config());

    let result = service
        .transcribe(
            vec![
                TranscribeJobRequest::new("m1-u1", "/audio/m1/u1.wav"),
                TranscribeJobRequest::new("m1-u2", "/audio/m1/u2.wav"),
                TranscribeJobRequest::new("m1-u3", "/audio/m1/u3.wav"),
            ],
            Some("b1".to_string()),
            None::<&mut dyn FnMut(&TranscribeJobsUpdate) -> anyhow::Result<()>>,
        )
        .await
        .unwrap();

    assert_eq!(result.get("b1-m1-u1").unwrap().status.as_str(), "FAILED");
    assert_eq!(result.get("b1-m1-u1").unwrap().transcript, "");
    assert_eq!(result.get("b1-m1-u2").unwrap().status.as_str(), "FAILED");
    assert_eq!(result.get("b1-m1-u3").unwrap().status.as_str(), "SUCCEEDED");
    assert_eq!(result.get("b1-m1-u3").unwrap().transcript, "C");
}

#[tokio::test]
async fn empty_transcript_is_preserved() {
    let objects = MockObjectStore::default();
    let provider = MockProvider::default();

    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/transcript.json")
        .with_status(200)
        .with_body(r#"{"results":{"transcripts":[{"transcript":""}],"items":[]}}"#)
        .create_async()
        .await;
    provider.set_transcript_uri("b1-m1-u1", &format!("{}/transcript.json", server.url()));
    provider.push_list_page(vec![("b1-m1-u1", "COMPLETED")]);

    let service = TranscribeService::new(objects, provider, test_config());
    let result = service
        .transcribe(
            vec![TranscribeJobRequest::new("m1-u1", "/audio/m1/u1.wav")],
            Some("b1".to_string()),
            None::<&mut dyn FnMut(&TranscribeJobsUpdate) -> anyhow::Result<()>>,
        )
        .await
        .unwrap();

    let job = result.get("b1-m1-u1").unwrap();
    assert_eq!(job.status.as_str(), "SUCCEEDED");
    assert_eq!(job.transcript, "");
}

#[tokio::test]
async fn start_job_throttle_is_retried_next_tick() {
    let objects = MockObjectStore::default();
    let provider = MockProvider::default();
    provider.push_start_throttle();

    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/transcript.json")
        .with_status(200)
        .with_body(r#"{"results":{"transcripts":[{"transcript":"ok"}]}}"#)
        .create_async()
        .await;
    provider.set_transcript_uri("b1-m1-u1", &format!("{}/transcript.json", server.url()));
    provider.push_list_page(vec![("b1-m1-u1", "COMPLETED")]);

    let service = TranscribeService::new(objects, provider.clone(), test_config());
    let result = service
        .transcribe(
            vec![TranscribeJobRequest::new("m1-u1", "/audio/m1/u1.wav")],
            Some("b1".to_string()),
            None::<&mut dyn FnMut(&TranscribeJobsUpdate) -> anyhow::Result<()>>,
        )
        .await
        .unwrap();

    assert_eq!(result.get("b1-m1-u1").unwrap().status.as_str(), "SUCCEEDED");
    // First start attempt throttled, second (next tick) succeeded.
    assert_eq!(provider.start_calls().len(), 2);
}

#[tokio::test]
async fn upload_failure_aborts_the_batch() {
    let objects = MockObjectStore::default();
    *objects.fail_with.lock().unwrap() = Some("disk full".to_string());
    let provider = MockProvider::default();

    let service = TranscribeService::new(objects, provider, test_config());
    let err = service
        .transcribe(
            vec![TranscribeJobRequest::new("m1-u1", "/audio/m1/u1.wav")],
            Some("b1".to_string()),
            None::<&mut dyn FnMut(&TranscribeJobsUpdate) -> anyhow::Result<()>>,
        )
        .await
        .unwrap_err();

    assert!(err.to_string().contains("b1-m1-u1"));
}

#[tokio::test]
async fn non_throttle_list_jobs_error_propagates_and_aborts() {
    let objects = MockObjectStore::default();
    let provider = MockProvider::default();
    provider.push_list_error("AccessDenied: not authorized");

    let service = TranscribeService::new(objects, provider, test_config());
    let err = service
        .transcribe(
            vec![TranscribeJobRequest::new("m1-u1", "/audio/m1/u1.wav")],
            Some("b1".to_string()),
            None::<&mut dyn FnMut(&TranscribeJobsUpdate) -> anyhow::Result<()>>,
        )
        .await
        .unwrap_err();

    assert!(err.to_string().contains("provider call failed"));
}

/// Echoes back whatever job names have been started as immediately
/// COMPLETED, regardless of the (unpredictable, generated) batch id -- used
/// to exercise batch-id generation without needing to know the id ahead of
/// the call.
#[derive(Clone, Default)]
struct AutoCompleteProvider {
    started: Arc<Mutex<Vec<String>>>,
    transcript_uri: Arc<Mutex<String>>,
}

#[async_trait]
impl TranscriptionProvider for AutoCompleteProvider {
    async fn start_job(&self, request: StartJobRequest) -> anyhow::Result<()> {
        self.started.lock().unwrap().push(request.name);
        Ok(())
    }

    async fn list_jobs(
        &self,
        _containing: &str,
        _page_token: Option<String>,
    ) -> anyhow::Result<JobListingPage> {
        let summaries = self
            .started
            .lock()
            .unwrap()
            .iter()
            .map(|name| JobSummary {
                name: name.clone(),
                status: "COMPLETED".to_string(),
            })
            .collect();
        Ok(JobListingPage {
            summaries,
            next_page_token: None,
        })
    }

    async fn get_job(&self, _name: &str) -> anyhow::Result<JobDescriptor> {
        Ok(JobDescriptor {
            status: "COMPLETED".to_string(),
            transcript_file_uri: Some(self.transcript_uri.lock().unwrap().clone()),
        })
    }
}

#[tokio::test]
async fn empty_batch_id_generates_a_fresh_unique_id() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/transcript.json")
        .with_status(200)
        .with_body(r#"{"results":{"transcripts":[{"transcript":"ok"}]}}"#)
        .create_async()
        .await;

    let objects = MockObjectStore::default();
    let provider = AutoCompleteProvider::default();
    *provider.transcript_uri.lock().unwrap() = format!("{}/transcript.json", server.url());

    let service = TranscribeService::new(objects, provider, test_config());
    let result = service
        .transcribe(
            vec![TranscribeJobRequest::new("m1-u1", "/audio/m1/u1.wav")],
            None,
            None::<&mut dyn FnMut(&TranscribeJobsUpdate) -> anyhow::Result<()>>,
        )
        .await
        .unwrap();

    let jobs: Vec<_> = result.jobs().collect();
    assert_eq!(jobs.len(), 1);
    assert!(jobs[0].fqid().ends_with("-m1-u1"));
    assert_ne!(jobs[0].batch_id, "");
    assert_eq!(jobs[0].status.as_str(), "SUCCEEDED");
}

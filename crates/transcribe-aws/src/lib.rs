//! AWS-backed [`ObjectStore`](transcribe_core::ObjectStore) and
//! [`TranscriptionProvider`](transcribe_core::TranscriptionProvider)
//! implementations (S3 + Amazon Transcribe) for `transcribe-core`.

mod s3_object_store;
mod transcribe_provider;

pub use s3_object_store::S3ObjectStore;
pub use transcribe_provider::AwsTranscribeProvider;

use std::sync::Arc;
use transcribe_core::{
    ConfigMap, DynOnUpdate, DynTranscriptionService, ServiceConfig, ServiceFactory,
    TranscribeBatchResult, TranscribeError, TranscribeJobRequest, TranscribeService,
};

/// Name this provider registers under in a [`transcribe_core::ServiceRegistry`].
pub const PROVIDER_NAME: &str = "aws_transcribe";

/// Concrete service type this crate produces.
pub type AwsTranscribeService = TranscribeService<S3ObjectStore, AwsTranscribeProvider>;

/// Resolves config per §4.1 and constructs both capability handles. Failure
/// to construct either handle is a fatal initialization error.
pub async fn init_service(config: &ConfigMap) -> Result<AwsTranscribeService, TranscribeError> {
    let service_config = ServiceConfig::resolve(config)?;

    let object_store = S3ObjectStore::new(
        &service_config.aws_region,
        &service_config.aws_access_key_id,
        &service_config.aws_secret_access_key,
    )
    .await
    .map_err(TranscribeError::InitFailed)?;

    let provider = AwsTranscribeProvider::new(
        &service_config.aws_region,
        &service_config.aws_access_key_id,
        &service_config.aws_secret_access_key,
    )
    .await
    .map_err(TranscribeError::InitFailed)?;

    Ok(TranscribeService::new(object_store, provider, service_config))
}

#[async_trait::async_trait]
impl DynTranscriptionService for AwsTranscribeService {
    fn provider_name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn transcribe(
        &self,
        requests: Vec<TranscribeJobRequest>,
        batch_id: Option<String>,
        mut on_update: Option<DynOnUpdate>,
    ) -> Result<TranscribeBatchResult, TranscribeError> {
        match on_update.as_mut() {
            Some(cb) => TranscribeService::transcribe(self, requests, batch_id, Some(&mut **cb)).await,
            None => TranscribeService::transcribe(self, requests, batch_id, None).await,
        }
    }
}

/// A [`ServiceFactory`] suitable for registration in a
/// [`transcribe_core::ServiceRegistry`] under [`PROVIDER_NAME`]. The registry's
/// factory signature is synchronous; `init_service` is bridged onto the
/// calling thread's tokio runtime via `block_in_place`, so this must be
/// called from a multi-threaded runtime.
pub fn factory() -> ServiceFactory {
    Arc::new(|config: &ConfigMap| {
        let config = config.clone();
        let handle = tokio::runtime::Handle::try_current().map_err(|e| {
            TranscribeError::InitFailed(anyhow::anyhow!(
                "factory() must be called from within a tokio runtime: {e}"
            ))
        })?;
        let service = tokio::task::block_in_place(|| handle.block_on(init_service(&config)))?;
        Ok(Arc::new(service) as Arc<dyn DynTranscriptionService>)
    })
}

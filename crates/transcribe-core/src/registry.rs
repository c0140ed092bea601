//! Explicit service registry: a caller-constructed replacement for the
//! source language's process-wide import-time registration.

use crate::batch::TranscribeBatchResult;
use crate::config::ConfigMap;
use crate::error::TranscribeError;
use crate::job::TranscribeJobRequest;
use crate::update::TranscribeJobsUpdate;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A factory builds a boxed, type-erased transcription service from a
/// resolved config map. Concrete crates (e.g. `transcribe-aws`) register one
/// of these under a provider name.
pub type ServiceFactory = Arc<
    dyn Fn(&ConfigMap) -> Result<Arc<dyn DynTranscriptionService>, TranscribeError> + Send + Sync,
>;

/// A boxed, object-safe stand-in for the `on_update` observer closure the
/// concrete `TranscribeService::transcribe` takes by `&mut dyn FnMut`.
pub type DynOnUpdate = Box<dyn FnMut(&TranscribeJobsUpdate) -> anyhow::Result<()> + Send>;

/// Object-safe handle for a constructed service, so the registry can hand
/// back a value without naming the concrete `TranscribeService<O, P>` type
/// parameters. `transcribe` is the actual operation a caller resolves a
/// service through the registry for; `provider_name` only identifies it.
#[async_trait::async_trait]
pub trait DynTranscriptionService: Send + Sync {
    /// Opaque identity string for logging; concrete services typically
    /// return their provider name.
    fn provider_name(&self) -> &str;

    /// Type-erased equivalent of `TranscribeService::transcribe`.
    async fn transcribe(
        &self,
        requests: Vec<TranscribeJobRequest>,
        batch_id: Option<String>,
        on_update: Option<DynOnUpdate>,
    ) -> Result<TranscribeBatchResult, TranscribeError>;
}

/// Registry mapping provider name -> factory. Thread-safe and
/// async-compatible via `tokio::sync::RwLock`, matching the registration
/// pattern used elsewhere for similar plug-in style lookups.
#[derive(Clone, Default)]
pub struct ServiceRegistry {
    factories: Arc<RwLock<HashMap<String, ServiceFactory>>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self {
            factories: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn register(&self, name: impl Into<String>, factory: ServiceFactory) {
        self.factories.write().await.insert(name.into(), factory);
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.factories.read().await.contains_key(name)
    }

    pub async fn list(&self) -> Vec<String> {
        self.factories.read().await.keys().cloned().collect()
    }

    async fn get_factory(&self, name: &str) -> Option<ServiceFactory> {
        self.factories.read().await.get(name).cloned()
    }
}

/// Resolves `name` in `registry` and invokes its factory with `config`.
/// Unlike the source's implicit module-load-time registration, nothing is
/// registered as a side effect of importing this crate: the caller must
/// populate the registry explicitly before calling this.
pub async fn init_transcription_service(
    registry: &ServiceRegistry,
    name: &str,
    config: &ConfigMap,
) -> Result<Arc<dyn DynTranscriptionService>, TranscribeError> {
    let factory = registry.get_factory(name).await.ok_or_else(|| {
        TranscribeError::InitFailed(anyhow::anyhow!("no transcription service registered as '{name}'"))
    })?;
    factory(config)
}

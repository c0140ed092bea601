//! S3-backed [`ObjectStore`] implementation.

use aws_config::meta::region::RegionProviderChain;
use aws_config::retry::{RetryConfig, RetryMode};
use aws_config::BehaviorVersion;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use aws_sdk_s3::Client;
use transcribe_core::{ObjectAcl, ObjectStore};

/// Thin wrapper around an `aws_sdk_s3::Client`, constructed once at service
/// init and reused for every upload in a batch.
#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    pub async fn new(
        region: &str,
        access_key_id: &str,
        secret_access_key: &str,
    ) -> anyhow::Result<Self> {
        let region_provider = RegionProviderChain::first_try(aws_config::Region::new(region.to_string()));

        let retry_config = RetryConfig::standard()
            .with_max_attempts(5)
            .with_retry_mode(RetryMode::Adaptive);

        let credentials = aws_credential_types::Credentials::new(
            access_key_id,
            secret_access_key,
            None,
            None,
            "transcribe-aws",
        );

        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(region_provider)
            .retry_config(retry_config)
            .credentials_provider(credentials)
            .load()
            .await;

        Ok(Self {
            client: Client::new(&config),
        })
    }
}

#[async_trait::async_trait]
impl ObjectStore for S3ObjectStore {
    #[tracing::instrument(skip(self), fields(
        aws.service.name = "s3",
        s3.bucket = %bucket,
        s3.key = %key,
        s3.operation = "PutObject",
    ))]
    async fn upload(
        &self,
        local_path: &str,
        bucket: &str,
        key: &str,
        acl: ObjectAcl,
    ) -> anyhow::Result<()> {
        let start = std::time::Instant::now();
        let body = ByteStream::from_path(local_path).await?;

        let canned_acl = match acl {
            ObjectAcl::Private => ObjectCannedAcl::Private,
            ObjectAcl::PublicRead => ObjectCannedAcl::PublicRead,
        };

        let result = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .acl(canned_acl)
            .send()
            .await;

        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

        match result {
            Ok(_) => {
                tracing::info!(duration_ms, "S3 upload successful");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, duration_ms, "S3 upload failed");
                Err(e.into())
            }
        }
    }
}

//! Config resolution: caller-supplied map with env-var fallback, per §4.1.

use crate::error::TranscribeError;
use std::collections::HashMap;
use std::env;

/// Caller-supplied configuration map. A loader input only, not the runtime
/// shape: `ServiceConfig::resolve` turns this into a typed [`ServiceConfig`].
pub type ConfigMap = HashMap<String, String>;

/// Typed, resolved configuration for constructing the two capability handles.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub aws_region: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub s3_bucket: String,
    pub s3_root_path: String,
    pub poll_interval_secs: f64,
}

/// One resolvable config key: the config-map key to check first, and the
/// ordered list of env var names to fall back to (first non-empty wins).
struct KeySpec {
    config_key: &'static str,
    env_names: &'static [&'static str],
}

fn resolve_required(config: &ConfigMap, spec: &KeySpec) -> Result<String, TranscribeError> {
    if let Some(v) = config.get(spec.config_key) {
        if !v.is_empty() {
            return Ok(v.clone());
        }
    }
    for name in spec.env_names {
        if let Ok(v) = env::var(name) {
            if !v.is_empty() {
                return Ok(v);
            }
        }
    }
    Err(TranscribeError::MissingConfig(spec.env_names.join("|")))
}

fn resolve_optional(config: &ConfigMap, spec: &KeySpec, default: &str) -> String {
    resolve_required(config, spec).unwrap_or_else(|_| default.to_string())
}

impl ServiceConfig {
    /// Resolves configuration from `config`, consulting env vars for any key
    /// the map doesn't carry a non-empty value for. Best-effort loads a local
    /// `.env` file first (absent file is not an error), matching the
    /// reference platform's config loader convention.
    pub fn resolve(config: &ConfigMap) -> Result<Self, TranscribeError> {
        dotenvy::dotenv().ok();

        let region_spec = KeySpec {
            config_key: "AWS_REGION",
            env_names: &["TRANSCRIBE_AWS_REGION", "AWS_REGION"],
        };
        let access_key_spec = KeySpec {
            config_key: "AWS_ACCESS_KEY_ID",
            env_names: &["TRANSCRIBE_AWS_ACCESS_KEY_ID", "AWS_ACCESS_KEY_ID"],
        };
        let secret_key_spec = KeySpec {
            config_key: "AWS_SECRET_ACCESS_KEY",
            env_names: &["TRANSCRIBE_AWS_SECRET_ACCESS_KEY", "AWS_SECRET_ACCESS_KEY"],
        };
        let bucket_spec = KeySpec {
            config_key: "TRANSCRIBE_AWS_S3_BUCKET_SOURCE",
            env_names: &["TRANSCRIBE_AWS_S3_BUCKET_SOURCE"],
        };
        let root_path_spec = KeySpec {
            config_key: "TRANSCRIBE_AWS_S3_ROOT_PATH",
            env_names: &["TRANSCRIBE_AWS_S3_ROOT_PATH"],
        };
        let poll_interval_spec = KeySpec {
            config_key: "POLL_INTERVAL",
            env_names: &["TRANSCRIBE_AWS_POLL_INTERVAL"],
        };

        let aws_region = resolve_required(config, &region_spec)?;
        let aws_access_key_id = resolve_required(config, &access_key_spec)?;
        let aws_secret_access_key = resolve_required(config, &secret_key_spec)?;
        let s3_bucket = resolve_required(config, &bucket_spec)?;
        let s3_root_path = resolve_optional(config, &root_path_spec, "");
        let poll_interval_secs = resolve_optional(config, &poll_interval_spec, "5.0")
            .parse::<f64>()
            .unwrap_or(5.0);

        Ok(ServiceConfig {
            aws_region,
            aws_access_key_id,
            aws_secret_access_key,
            s3_bucket,
            s3_root_path,
            poll_interval_secs,
        })
    }
}

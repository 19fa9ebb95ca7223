//! Configuration module for environment variable parsing.
//!
//! All settings come from the execution environment. Only `STAGE` has a
//! logged default; the rest fall back silently.

use std::env;
use std::time::Duration;

use tracing::warn;

use crate::secrets::{DEFAULT_NAMESPACE, DEFAULT_SUFFIX};

/// Stage used when `STAGE` is unset.
pub const DEFAULT_STAGE: &str = "dev";

/// Application configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    /// Deployment stage, part of the secret name
    pub stage: String,

    /// Port for the authorizer service to listen on
    pub port: u16,

    /// Secret name prefix
    pub secret_namespace: String,

    /// Secret name suffix
    pub secret_suffix: String,

    /// Base URL of the secrets extension; unset selects the in-memory store
    pub secrets_extension_endpoint: Option<String>,

    /// Session token sent to the secrets extension
    pub secrets_extension_token: Option<String>,

    /// Timeout for one secrets extension request in milliseconds
    pub secret_request_timeout_ms: u64,

    /// How long a fetched secret may be reused, in seconds (0 disables)
    pub secret_cache_ttl_secs: u64,

    /// App secret for the current stage when running without a secret store
    pub local_app_secret: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Config {
            stage: stage_from_env(),

            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),

            secret_namespace: env::var("SECRET_NAMESPACE")
                .unwrap_or_else(|_| DEFAULT_NAMESPACE.to_string()),

            secret_suffix: env::var("SECRET_SUFFIX")
                .unwrap_or_else(|_| DEFAULT_SUFFIX.to_string()),

            secrets_extension_endpoint: non_empty_var("SECRETS_EXTENSION_ENDPOINT"),

            secrets_extension_token: non_empty_var("AWS_SESSION_TOKEN"),

            secret_request_timeout_ms: env::var("SECRET_REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(2000),

            secret_cache_ttl_secs: env::var("SECRET_CACHE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),

            local_app_secret: non_empty_var("LOCAL_APP_SECRET"),
        }
    }

    pub fn secret_request_timeout(&self) -> Duration {
        Duration::from_millis(self.secret_request_timeout_ms)
    }

    pub fn secret_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.secret_cache_ttl_secs)
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("stage", &self.stage)
            .field("port", &self.port)
            .field("secret_namespace", &self.secret_namespace)
            .field("secret_suffix", &self.secret_suffix)
            .field("secrets_extension_endpoint", &self.secrets_extension_endpoint)
            .field(
                "secrets_extension_token",
                &self.secrets_extension_token.as_ref().map(|_| "<REDACTED>"),
            )
            .field("secret_request_timeout_ms", &self.secret_request_timeout_ms)
            .field("secret_cache_ttl_secs", &self.secret_cache_ttl_secs)
            .field(
                "local_app_secret",
                &self.local_app_secret.as_ref().map(|_| "<REDACTED>"),
            )
            .finish()
    }
}

/// Read `STAGE`, defaulting to [`DEFAULT_STAGE`] with a warning.
fn stage_from_env() -> String {
    match non_empty_var("STAGE") {
        Some(stage) => stage,
        None => {
            warn!(default_stage = DEFAULT_STAGE, "stage_not_set_using_default");
            DEFAULT_STAGE.to_string()
        }
    }
}

/// Read an environment variable, treating blank values as unset.
fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

//! App secret resolution.
//!
//! The signing key lives in a secret store under a stage-scoped name:
//!
//! ```text
//! <namespace>/<stage>/<suffix>      e.g. whatsapp-webhook/prod/app-secret
//! ```
//!
//! [`SecretProvider`] builds that name and asks a [`SecretStore`] for it.
//! Any failure to produce a value becomes [`AuthError::SecretUnavailable`];
//! there are no retries here.

pub mod extension;
pub mod memory;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, error, warn};
use zeroize::Zeroize;

use crate::error::AuthError;

pub use extension::ExtensionSecretStore;
pub use memory::InMemorySecretStore;

/// Default secret name prefix.
pub const DEFAULT_NAMESPACE: &str = "whatsapp-webhook";

/// Default secret name suffix.
pub const DEFAULT_SUFFIX: &str = "app-secret";

/// Stage-scoped secret name: `<namespace>/<stage>/<suffix>`.
pub fn secret_name(namespace: &str, stage: &str, suffix: &str) -> String {
    format!("{}/{}/{}", namespace, stage, suffix)
}

/// The shared signing key. Redacted in `Debug`, wiped on drop.
#[derive(Clone)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: String) -> Self {
        Self(value)
    }

    /// Borrow the raw value. Only the signature check should need this.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl Drop for Secret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Failure talking to the backing store.
#[derive(Debug, Error)]
pub enum SecretStoreError {
    #[error("secret store request failed: {0}")]
    Transport(String),

    #[error("secret store returned status {status}")]
    Status { status: u16 },

    #[error("secret store response invalid: {0}")]
    InvalidResponse(String),
}

/// Key-value lookup of secrets by name.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// `Ok(None)` when the store has no value for `name`.
    async fn get_secret(&self, name: &str) -> Result<Option<String>, SecretStoreError>;
}

struct CachedSecret {
    secret: Secret,
    fetched_at: Instant,
}

/// Resolves the app secret for a stage.
pub struct SecretProvider {
    store: Arc<dyn SecretStore>,
    namespace: String,
    suffix: String,
    cache_ttl: Duration,
    cache: RwLock<HashMap<String, CachedSecret>>,
}

impl SecretProvider {
    /// Create a provider with the default naming and no cache.
    pub fn new(store: Arc<dyn SecretStore>) -> Self {
        Self {
            store,
            namespace: DEFAULT_NAMESPACE.to_string(),
            suffix: DEFAULT_SUFFIX.to_string(),
            cache_ttl: Duration::ZERO,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Override the namespace and suffix used to build secret names.
    pub fn with_naming(mut self, namespace: impl Into<String>, suffix: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self.suffix = suffix.into();
        self
    }

    /// Keep fetched secrets for at most `ttl`. Zero disables caching.
    ///
    /// Entries are keyed by the full stage-scoped name, so stages never
    /// share an entry. A rotated key is picked up once the entry expires.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Stage-scoped secret name.
    pub fn secret_name(&self, stage: &str) -> String {
        secret_name(&self.namespace, stage, &self.suffix)
    }

    /// Fetch the app secret for `stage`.
    pub async fn fetch(&self, stage: &str) -> Result<Secret, AuthError> {
        let name = self.secret_name(stage);

        if let Some(secret) = self.cached(&name).await {
            debug!(secret_name = %name, "secret_cache_hit");
            return Ok(secret);
        }

        let value = match self.store.get_secret(&name).await {
            Ok(Some(value)) if !value.is_empty() => value,
            Ok(_) => {
                warn!(secret_name = %name, "secret_not_found");
                return Err(AuthError::SecretUnavailable { name });
            }
            Err(e) => {
                error!(secret_name = %name, error = %e, "secret_fetch_failed");
                return Err(AuthError::SecretUnavailable { name });
            }
        };

        let secret = Secret::new(value);

        if !self.cache_ttl.is_zero() {
            self.cache.write().await.insert(
                name,
                CachedSecret {
                    secret: secret.clone(),
                    fetched_at: Instant::now(),
                },
            );
        }

        Ok(secret)
    }

    async fn cached(&self, name: &str) -> Option<Secret> {
        if self.cache_ttl.is_zero() {
            return None;
        }

        let cache = self.cache.read().await;
        cache
            .get(name)
            .filter(|entry| entry.fetched_at.elapsed() < self.cache_ttl)
            .map(|entry| entry.secret.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Store that counts lookups and can be told to fail.
    struct CountingStore {
        inner: InMemorySecretStore,
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingStore {
        fn new(inner: InMemorySecretStore) -> Self {
            Self {
                inner,
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                inner: InMemorySecretStore::new(),
                calls: AtomicUsize::new(0),
                fail: true,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SecretStore for CountingStore {
        async fn get_secret(&self, name: &str) -> Result<Option<String>, SecretStoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(SecretStoreError::Transport("connection refused".to_string()));
            }
            self.inner.get_secret(name).await
        }
    }

    #[test]
    fn test_secret_name_layout() {
        let provider = SecretProvider::new(Arc::new(InMemorySecretStore::new()));
        assert_eq!(provider.secret_name("prod"), "whatsapp-webhook/prod/app-secret");

        let provider = provider.with_naming("acme", "signing-key");
        assert_eq!(provider.secret_name("dev"), "acme/dev/signing-key");
    }

    #[test]
    fn test_secret_debug_redacted() {
        let secret = Secret::new("super-secret".to_string());
        let rendered = format!("{:?}", secret);
        assert_eq!(rendered, "Secret(***)");
        assert!(!rendered.contains("super"));
    }

    #[tokio::test]
    async fn test_fetch_found() {
        let store =
            InMemorySecretStore::new().with_secret("whatsapp-webhook/dev/app-secret", "s3cr3t");
        let provider = SecretProvider::new(Arc::new(store));

        let secret = provider.fetch("dev").await.unwrap();
        assert_eq!(secret.expose(), "s3cr3t");
    }

    #[tokio::test]
    async fn test_fetch_not_found() {
        let store =
            InMemorySecretStore::new().with_secret("whatsapp-webhook/prod/app-secret", "s3cr3t");
        let provider = SecretProvider::new(Arc::new(store));

        let err = provider.fetch("dev").await.unwrap_err();
        assert_eq!(
            err,
            AuthError::SecretUnavailable {
                name: "whatsapp-webhook/dev/app-secret".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_fetch_empty_value_is_unavailable() {
        let store = InMemorySecretStore::new().with_secret("whatsapp-webhook/dev/app-secret", "");
        let provider = SecretProvider::new(Arc::new(store));

        assert!(provider.fetch("dev").await.unwrap_err().is_operational());
    }

    #[tokio::test]
    async fn test_fetch_store_error() {
        let provider = SecretProvider::new(Arc::new(CountingStore::failing()));

        let err = provider.fetch("dev").await.unwrap_err();
        assert!(matches!(err, AuthError::SecretUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_fetch_without_cache_hits_store_each_time() {
        let store = Arc::new(CountingStore::new(
            InMemorySecretStore::new().with_secret("whatsapp-webhook/dev/app-secret", "s3cr3t"),
        ));
        let provider = SecretProvider::new(store.clone());

        provider.fetch("dev").await.unwrap();
        provider.fetch("dev").await.unwrap();
        assert_eq!(store.calls(), 2);
    }

    #[tokio::test]
    async fn test_fetch_with_cache_reuses_per_stage() {
        let store = Arc::new(CountingStore::new(
            InMemorySecretStore::new()
                .with_secret("whatsapp-webhook/dev/app-secret", "dev-secret")
                .with_secret("whatsapp-webhook/prod/app-secret", "prod-secret"),
        ));
        let provider = SecretProvider::new(store.clone()).with_cache_ttl(Duration::from_secs(60));

        assert_eq!(provider.fetch("dev").await.unwrap().expose(), "dev-secret");
        assert_eq!(provider.fetch("dev").await.unwrap().expose(), "dev-secret");
        assert_eq!(store.calls(), 1);

        assert_eq!(provider.fetch("prod").await.unwrap().expose(), "prod-secret");
        assert_eq!(store.calls(), 2);
    }

    #[tokio::test]
    async fn test_fetch_failures_not_cached() {
        let store = Arc::new(CountingStore::failing());
        let provider = SecretProvider::new(store.clone()).with_cache_ttl(Duration::from_secs(60));

        assert!(provider.fetch("dev").await.is_err());
        assert!(provider.fetch("dev").await.is_err());
        assert_eq!(store.calls(), 2);
    }

    #[tokio::test]
    async fn test_cache_entry_expires() {
        let store = Arc::new(CountingStore::new(
            InMemorySecretStore::new().with_secret("whatsapp-webhook/dev/app-secret", "s3cr3t"),
        ));
        let provider = SecretProvider::new(store.clone()).with_cache_ttl(Duration::from_millis(20));

        provider.fetch("dev").await.unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
        provider.fetch("dev").await.unwrap();
        assert_eq!(store.calls(), 2);
    }
}

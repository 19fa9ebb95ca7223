//! In-process secret store.
//!
//! Backs local development (seeded from `LOCAL_APP_SECRET`) and tests.

use std::collections::HashMap;

use async_trait::async_trait;

use super::{SecretStore, SecretStoreError};

/// Fixed map of secret name to value.
#[derive(Default)]
pub struct InMemorySecretStore {
    secrets: HashMap<String, String>,
}

impl InMemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a secret, builder style.
    pub fn with_secret(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.secrets.insert(name.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    async fn get_secret(&self, name: &str) -> Result<Option<String>, SecretStoreError> {
        Ok(self.secrets.get(name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lookup_is_exact() {
        let store = InMemorySecretStore::new().with_secret("ns/dev/app-secret", "value");

        assert_eq!(
            store.get_secret("ns/dev/app-secret").await.unwrap(),
            Some("value".to_string())
        );
        assert_eq!(store.get_secret("NS/DEV/APP-SECRET").await.unwrap(), None);
        assert!(!store.is_empty());
        assert!(InMemorySecretStore::new().is_empty());
    }
}

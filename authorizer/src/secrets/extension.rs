//! Secret store backed by the AWS Parameters and Secrets extension.
//!
//! The extension exposes Secrets Manager over a local HTTP endpoint:
//!
//! ```text
//! GET {endpoint}/secretsmanager/get?secretId=<name>
//! X-Aws-Parameters-Secrets-Token: <session token>
//! ```
//!
//! and answers with the `GetSecretValue` JSON, of which only `SecretString`
//! is used here.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, error};

use super::{SecretStore, SecretStoreError};

const TOKEN_HEADER: &str = "X-Aws-Parameters-Secrets-Token";

#[derive(Debug, Deserialize)]
struct GetSecretValueResponse {
    #[serde(rename = "SecretString", default)]
    secret_string: Option<String>,
}

/// HTTP client for the secrets extension.
pub struct ExtensionSecretStore {
    client: Client,
    endpoint: String,
    session_token: Option<String>,
    timeout: Duration,
}

impl ExtensionSecretStore {
    /// `endpoint` is the extension base URL, e.g. `http://localhost:2773`.
    pub fn new(
        endpoint: impl Into<String>,
        session_token: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            session_token,
            timeout,
        }
    }
}

#[async_trait]
impl SecretStore for ExtensionSecretStore {
    async fn get_secret(&self, name: &str) -> Result<Option<String>, SecretStoreError> {
        let url = format!("{}/secretsmanager/get", self.endpoint);

        let mut request = self
            .client
            .get(&url)
            .query(&[("secretId", name)])
            .timeout(self.timeout);

        if let Some(token) = &self.session_token {
            request = request.header(TOKEN_HEADER, token.as_str());
        }

        let resp = match request.send().await {
            Ok(resp) => resp,
            Err(e) => {
                if e.is_timeout() {
                    error!(
                        secret_name = name,
                        timeout_ms = self.timeout.as_millis() as u64,
                        "secret_extension_timeout"
                    );
                } else {
                    error!(secret_name = name, error = %e, "secret_extension_request_error");
                }
                return Err(SecretStoreError::Transport(e.to_string()));
            }
        };

        let status = resp.status();
        debug!(secret_name = name, status_code = status.as_u16(), "secret_extension_response");

        // The extension reports ResourceNotFoundException as 400.
        match status {
            StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST => return Ok(None),
            s if !s.is_success() => {
                return Err(SecretStoreError::Status { status: s.as_u16() });
            }
            _ => {}
        }

        let body: GetSecretValueResponse = resp
            .json()
            .await
            .map_err(|e| SecretStoreError::InvalidResponse(e.to_string()))?;

        Ok(body.secret_string)
    }
}

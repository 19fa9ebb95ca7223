//! Authorizer endpoint handlers.
//!
//! `/authorize` always answers 200 with a policy document, Allow or Deny.
//! The front door enforces it; an error status here would only make the
//! front door fail closed with less information.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::decider::AuthorizationDecider;
use crate::decision::{AuthorizationDecision, PolicyResponse};
use crate::error::AuthError;
use crate::request::{Headers, InboundRequest, Method};
use crate::secrets::{
    secret_name, ExtensionSecretStore, InMemorySecretStore, SecretProvider, SecretStore,
};
use crate::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub stage: Arc<str>,
    pub decider: Arc<AuthorizationDecider>,
}

impl AppState {
    pub fn new(stage: impl Into<String>, decider: AuthorizationDecider) -> Self {
        Self {
            stage: Arc::from(stage.into()),
            decider: Arc::new(decider),
        }
    }

    /// Wire the secret store and decider described by `config`.
    pub fn from_config(config: &Config) -> Self {
        let store: Arc<dyn SecretStore> = match &config.secrets_extension_endpoint {
            Some(endpoint) => {
                info!(endpoint = %endpoint, "secret_store_extension");
                Arc::new(ExtensionSecretStore::new(
                    endpoint.clone(),
                    config.secrets_extension_token.clone(),
                    config.secret_request_timeout(),
                ))
            }
            None => {
                let mut store = InMemorySecretStore::new();
                if let Some(secret) = &config.local_app_secret {
                    let name =
                        secret_name(&config.secret_namespace, &config.stage, &config.secret_suffix);
                    store = store.with_secret(name, secret.clone());
                }
                warn!(seeded = !store.is_empty(), "secret_store_in_memory");
                Arc::new(store)
            }
        };

        let provider = SecretProvider::new(store)
            .with_naming(config.secret_namespace.clone(), config.secret_suffix.clone())
            .with_cache_ttl(config.secret_cache_ttl());

        Self::new(config.stage.clone(), AuthorizationDecider::new(provider))
    }
}

/// Build the service router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/authorize", post(authorize))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Authorize
// =============================================================================

/// REQUEST-authorizer event sent by the front door.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizerEvent {
    pub method_arn: String,
    pub http_method: String,
    #[serde(default)]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

impl AuthorizerEvent {
    /// Normalize the event. Fails only when a base64 body does not decode.
    pub fn into_request(self) -> Result<InboundRequest, AuthError> {
        let raw_body = match self.body {
            None => Vec::new(),
            Some(body) if self.is_base64_encoded => STANDARD
                .decode(body.as_bytes())
                .map_err(|e| AuthError::MalformedJson(format!("body is not valid base64: {e}")))?,
            Some(body) => body.into_bytes(),
        };

        let headers: Headers = self.headers.unwrap_or_default().into_iter().collect();

        Ok(InboundRequest {
            method: Method::parse(&self.http_method),
            resource_id: self.method_arn,
            headers,
            raw_body,
        })
    }
}

/// Authorizer endpoint.
pub async fn authorize(
    State(state): State<AppState>,
    Json(event): Json<AuthorizerEvent>,
) -> Json<PolicyResponse> {
    let resource = event.method_arn.clone();

    let decision = match event.into_request() {
        Ok(request) => state.decider.decide(&request, &state.stage).await,
        Err(reason) => {
            warn!(reason = reason.kind(), error = %reason, "authorize_event_rejected");
            AuthorizationDecision::deny(resource, reason)
        }
    };

    Json(decision.to_policy())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(json: serde_json::Value) -> AuthorizerEvent {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_event_plain_body() {
        let request = event(serde_json::json!({
            "type": "REQUEST",
            "methodArn": "arn:test",
            "httpMethod": "POST",
            "headers": {"X-Hub-Signature-256": "sha256=ab"},
            "body": "{\"object\":\"x\"}"
        }))
        .into_request()
        .unwrap();

        assert_eq!(request.method, Method::Post);
        assert_eq!(request.resource_id, "arn:test");
        assert_eq!(request.headers.get("x-hub-signature-256"), Some("sha256=ab"));
        assert_eq!(request.raw_body, br#"{"object":"x"}"#);
    }

    #[test]
    fn test_event_base64_body() {
        let request = event(serde_json::json!({
            "methodArn": "arn:test",
            "httpMethod": "POST",
            "body": STANDARD.encode(b"{\"a\":1}"),
            "isBase64Encoded": true
        }))
        .into_request()
        .unwrap();

        assert_eq!(request.raw_body, br#"{"a":1}"#);
    }

    #[test]
    fn test_event_bad_base64() {
        let err = event(serde_json::json!({
            "methodArn": "arn:test",
            "httpMethod": "POST",
            "body": "***",
            "isBase64Encoded": true
        }))
        .into_request()
        .unwrap_err();

        assert!(matches!(err, AuthError::MalformedJson(_)));
    }

    #[tokio::test]
    async fn test_event_duplicate_signature_casings_denied_every_time() {
        use crate::signature::compute_signature;

        let body = serde_json::json!({
            "object": "whatsapp_business_account",
            "entry": [{"changes": [{"value": {"messaging_product": "whatsapp"}}]}]
        })
        .to_string();
        let good = format!("sha256={}", compute_signature(body.as_bytes(), "k").unwrap());
        let store =
            InMemorySecretStore::new().with_secret("whatsapp-webhook/dev/app-secret", "k");
        let decider = AuthorizationDecider::new(SecretProvider::new(Arc::new(store)));

        let raw = serde_json::json!({
            "methodArn": "arn:test",
            "httpMethod": "POST",
            "headers": {
                "X-Hub-Signature-256": good,
                "x-hub-signature-256": "sha256=00"
            },
            "body": body
        });

        for _ in 0..50 {
            let request = event(raw.clone()).into_request().unwrap();
            assert!(request.headers.is_conflicting("x-hub-signature-256"));

            let decision = decider.decide(&request, "dev").await;
            assert_eq!(decision.reason, Some(AuthError::SignatureMismatch));
        }
    }

    #[test]
    fn test_event_null_headers_and_body() {
        let request = event(serde_json::json!({
            "methodArn": "arn:test",
            "httpMethod": "GET",
            "headers": null,
            "body": null
        }))
        .into_request()
        .unwrap();

        assert_eq!(request.method, Method::Get);
        assert!(request.headers.is_empty());
        assert!(request.raw_body.is_empty());
    }
}

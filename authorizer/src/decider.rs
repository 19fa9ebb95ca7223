//! Per-request authorization decision.
//!
//! ```text
//! GET                               → Allow   (subscription handshake)
//! POST  no X-Hub-Signature-256      → Deny
//!       conflicting signature values → Deny
//!       app secret unavailable      → Deny
//!       signature mismatch          → Deny
//!       envelope invalid            → Deny
//!       otherwise                   → Allow
//! anything else                     → Deny
//! ```
//!
//! Each guard in [`AuthorizationDecider::evaluate`] returns early with the
//! reason it failed; reaching the end is the only way to Allow.

use tracing::{error, info, warn};

use crate::decision::AuthorizationDecision;
use crate::error::AuthError;
use crate::payload::validate_payload;
use crate::request::{InboundRequest, Method};
use crate::secrets::SecretProvider;
use crate::signature::{verify_signature, SIGNATURE_HEADER};

/// Decides whether an inbound webhook request may reach the application.
///
/// Holds no per-request state; one instance serves concurrent requests.
pub struct AuthorizationDecider {
    secrets: SecretProvider,
}

impl AuthorizationDecider {
    pub fn new(secrets: SecretProvider) -> Self {
        Self { secrets }
    }

    /// Authorize `request` for `stage`. Never fails: every error is a Deny.
    pub async fn decide(&self, request: &InboundRequest, stage: &str) -> AuthorizationDecision {
        info!(
            method = %request.method,
            stage = stage,
            body_length = request.raw_body.len(),
            header_count = request.headers.len(),
            "authorize_request_received"
        );

        match self.evaluate(request, stage).await {
            Ok(()) => {
                info!(method = %request.method, "authorize_allow");
                AuthorizationDecision::allow(&request.resource_id)
            }
            Err(reason) => {
                if reason.is_operational() {
                    error!(
                        method = %request.method,
                        reason = reason.kind(),
                        error = %reason,
                        "authorize_deny_operational"
                    );
                } else {
                    warn!(
                        method = %request.method,
                        reason = reason.kind(),
                        error = %reason,
                        "authorize_deny"
                    );
                }
                AuthorizationDecision::deny(&request.resource_id, reason)
            }
        }
    }

    /// Run the guards in order. `Ok` means every check passed.
    pub async fn evaluate(&self, request: &InboundRequest, stage: &str) -> Result<(), AuthError> {
        match &request.method {
            Method::Get => {
                info!("verification_request_bypass");
                Ok(())
            }
            Method::Post => self.evaluate_submission(request, stage).await,
            Method::Other(method) => Err(AuthError::UnsupportedMethod(method.clone())),
        }
    }

    async fn evaluate_submission(
        &self,
        request: &InboundRequest,
        stage: &str,
    ) -> Result<(), AuthError> {
        let token = request
            .headers
            .get(SIGNATURE_HEADER)
            .ok_or(AuthError::MissingSignature)?;

        if request.headers.is_conflicting(SIGNATURE_HEADER) {
            return Err(AuthError::SignatureMismatch);
        }

        let secret = self.secrets.fetch(stage).await?;

        if !verify_signature(&request.raw_body, token, &secret) {
            return Err(AuthError::SignatureMismatch);
        }

        validate_payload(&request.raw_body)
    }
}

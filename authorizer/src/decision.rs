//! Allow/Deny decision and its policy-document wire form.
//!
//! The front door receives the decision as an API Gateway authorizer
//! response:
//!
//! ```json
//! {
//!   "principalId": "whatsapp-webhook",
//!   "policyDocument": {
//!     "Version": "2012-10-17",
//!     "Statement": [
//!       { "Action": "execute-api:Invoke", "Effect": "Allow", "Resource": "<resource id>" }
//!     ]
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Principal reported for every decision made by this integration.
pub const PRINCIPAL_ID: &str = "whatsapp-webhook";

/// IAM policy language version.
pub const POLICY_VERSION: &str = "2012-10-17";

/// Action the policy statement grants or refuses.
pub const INVOKE_ACTION: &str = "execute-api:Invoke";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    Allow,
    Deny,
}

/// Outcome of authorizing one request. Built fresh every time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationDecision {
    pub principal_id: String,
    pub effect: Effect,
    pub resource: String,
    /// Which check denied the request. Never sent to the front door.
    pub reason: Option<AuthError>,
}

impl AuthorizationDecision {
    pub fn allow(resource: impl Into<String>) -> Self {
        Self {
            principal_id: PRINCIPAL_ID.to_string(),
            effect: Effect::Allow,
            resource: resource.into(),
            reason: None,
        }
    }

    pub fn deny(resource: impl Into<String>, reason: AuthError) -> Self {
        Self {
            principal_id: PRINCIPAL_ID.to_string(),
            effect: Effect::Deny,
            resource: resource.into(),
            reason: Some(reason),
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.effect == Effect::Allow
    }

    /// Render the decision as the authorizer response body.
    pub fn to_policy(&self) -> PolicyResponse {
        PolicyResponse {
            principal_id: self.principal_id.clone(),
            policy_document: PolicyDocument {
                version: POLICY_VERSION.to_string(),
                statement: vec![PolicyStatement {
                    action: INVOKE_ACTION.to_string(),
                    effect: self.effect,
                    resource: self.resource.clone(),
                }],
            },
        }
    }
}

/// Authorizer response as returned to the front door.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyResponse {
    pub principal_id: String,
    pub policy_document: PolicyDocument,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    pub version: String,
    pub statement: Vec<PolicyStatement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyStatement {
    pub action: String,
    pub effect: Effect,
    pub resource: String,
}

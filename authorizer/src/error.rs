//! Reasons an inbound webhook request is denied.
//!
//! Every variant maps to a Deny decision. None of them is surfaced to the
//! front door as a fault; they only travel inside the decision and the logs.

use thiserror::Error;

/// Why the authorizer refused a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The submission carried no `X-Hub-Signature-256` header.
    #[error("signature header missing")]
    MissingSignature,

    /// The app secret could not be resolved for the current stage.
    #[error("app secret unavailable: {name}")]
    SecretUnavailable { name: String },

    /// The presented signature is malformed or does not match the body.
    #[error("signature mismatch")]
    SignatureMismatch,

    /// The body is not a JSON document.
    #[error("malformed json: {0}")]
    MalformedJson(String),

    /// A required envelope field is absent or empty.
    #[error("missing field `{field}`{}", entry_suffix(.entry))]
    MissingField {
        field: &'static str,
        entry: Option<usize>,
    },

    /// A change reports a messaging product other than WhatsApp.
    #[error("unexpected messaging_product {observed} at entry {entry}, change {change}")]
    UnexpectedValue {
        entry: usize,
        change: usize,
        observed: String,
    },

    /// Only GET and POST are accepted.
    #[error("unsupported method: {0}")]
    UnsupportedMethod(String),
}

fn entry_suffix(entry: &Option<usize>) -> String {
    entry.map(|i| format!(" in entry {i}")).unwrap_or_default()
}

impl AuthError {
    /// True for misconfiguration on our side rather than a bad request.
    pub fn is_operational(&self) -> bool {
        matches!(self, AuthError::SecretUnavailable { .. })
    }

    /// Short machine-readable tag used in log events.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::MissingSignature => "missing_signature",
            AuthError::SecretUnavailable { .. } => "secret_unavailable",
            AuthError::SignatureMismatch => "signature_mismatch",
            AuthError::MalformedJson(_) => "malformed_json",
            AuthError::MissingField { .. } => "missing_field",
            AuthError::UnexpectedValue { .. } => "unexpected_value",
            AuthError::UnsupportedMethod(_) => "unsupported_method",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_secret_unavailable_is_operational() {
        assert!(AuthError::SecretUnavailable {
            name: "ns/dev/app-secret".to_string()
        }
        .is_operational());
        assert!(!AuthError::MissingSignature.is_operational());
        assert!(!AuthError::SignatureMismatch.is_operational());
        assert!(!AuthError::UnsupportedMethod("DELETE".to_string()).is_operational());
    }

    #[test]
    fn test_missing_field_display_includes_entry() {
        let top = AuthError::MissingField {
            field: "entry",
            entry: None,
        };
        assert_eq!(top.to_string(), "missing field `entry`");

        let nested = AuthError::MissingField {
            field: "changes",
            entry: Some(2),
        };
        assert_eq!(nested.to_string(), "missing field `changes` in entry 2");
    }
}

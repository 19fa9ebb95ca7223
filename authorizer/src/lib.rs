//! WhatsApp webhook authorizer.
//!
//! Sits in front of the public webhook endpoint and decides, per request,
//! whether it may reach the application:
//!
//! - `GET` subscription handshakes pass straight through
//! - `POST` notifications must carry a valid `X-Hub-Signature-256` over the
//!   raw body and a well-formed WhatsApp envelope
//! - everything else is denied
//!
//! ## Architecture
//!
//! ```text
//! Front door → /authorize → AuthorizationDecider → { SecretProvider, verify_signature, validate_payload }
//!                                                 → policy document → front door enforces
//! ```

pub mod config;
pub mod decider;
pub mod decision;
pub mod error;
pub mod payload;
pub mod request;
pub mod secrets;
pub mod signature;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use decider::AuthorizationDecider;
pub use decision::{AuthorizationDecision, Effect, PolicyResponse, PRINCIPAL_ID};
pub use error::AuthError;
pub use payload::validate_payload;
pub use request::{Headers, InboundRequest, Method};
pub use secrets::{Secret, SecretProvider, SecretStore};
pub use signature::verify_signature;
pub use web::AppState;

//! HTTP invocation boundary.
//!
//! The front door calls `POST /authorize` with a REQUEST-authorizer event
//! and enforces the policy it gets back. This module only translates
//! between that envelope and the authorizer types.

pub mod handlers;

pub use handlers::{authorize, health, router, AppState, AuthorizerEvent, HealthResponse};

//! WhatsApp (Meta) webhook signature verification.
//!
//! Meta signs every webhook POST with HMAC-SHA256 over the raw request body,
//! keyed by the app secret, and sends it as `X-Hub-Signature-256: sha256=<hex>`.
//! Reference: https://developers.facebook.com/docs/graph-api/webhooks/getting-started#event-notifications

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::secrets::Secret;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the body signature.
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

/// Algorithm prefix on the signature header value.
pub const SIGNATURE_PREFIX: &str = "sha256=";

/// Verify a webhook body signature.
///
/// # Arguments
///
/// * `body` - The raw request body, byte-exact as received
/// * `token` - The full `X-Hub-Signature-256` header value
/// * `secret` - The app secret for the current stage
///
/// # Returns
///
/// `true` only if the token carries the `sha256=` prefix and its remainder
/// equals the lowercase hex HMAC-SHA256 of `body`. An empty body or empty
/// digest is hashed and compared like any other input.
pub fn verify_signature(body: &[u8], token: &str, secret: &Secret) -> bool {
    let presented = match token.strip_prefix(SIGNATURE_PREFIX) {
        Some(rest) => rest,
        None => {
            warn!(token_length = token.len(), "signature_prefix_unrecognized");
            return false;
        }
    };

    let expected = match compute_signature(body, secret.expose()) {
        Ok(digest) => digest,
        Err(_) => {
            warn!("signature_invalid_key");
            return false;
        }
    };

    // `ct_eq` on slices checks the length first, then folds every byte
    // without an early exit.
    let valid: bool = expected.as_bytes().ct_eq(presented.as_bytes()).into();

    if !valid {
        warn!(
            expected_length = expected.len(),
            actual_length = presented.len(),
            "signature_mismatch"
        );
    }

    valid
}

/// Lowercase hex HMAC-SHA256 of `body` keyed by `key`.
pub fn compute_signature(body: &[u8], key: &str) -> Result<String, hmac::digest::InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(key.as_bytes())?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

//! Structural check of the WhatsApp webhook envelope.
//!
//! Only the envelope is inspected:
//!
//! ```text
//! { "object": "...",
//!   "entry": [ { "changes": [ { "value": { "messaging_product": "whatsapp" } } ] } ] }
//! ```
//!
//! Message content, timestamps and sender fields are left to the downstream
//! handler.

use serde_json::Value;

use crate::error::AuthError;

/// The only messaging product this endpoint accepts.
pub const EXPECTED_MESSAGING_PRODUCT: &str = "whatsapp";

/// Validate the envelope of a raw webhook body.
///
/// Checks run in order and stop at the first failure, which carries the
/// entry/change index where it was found. Every entry is checked for a
/// `changes` list before any change is inspected.
pub fn validate_payload(body: &[u8]) -> Result<(), AuthError> {
    let doc: Value =
        serde_json::from_slice(body).map_err(|e| AuthError::MalformedJson(e.to_string()))?;

    match doc.get("object").and_then(Value::as_str) {
        Some(object) if !object.is_empty() => {}
        _ => {
            return Err(AuthError::MissingField {
                field: "object",
                entry: None,
            })
        }
    }

    let entries = non_empty_array(&doc, "entry").ok_or(AuthError::MissingField {
        field: "entry",
        entry: None,
    })?;

    let mut all_changes = Vec::with_capacity(entries.len());
    for (entry_idx, entry) in entries.iter().enumerate() {
        let changes = non_empty_array(entry, "changes").ok_or(AuthError::MissingField {
            field: "changes",
            entry: Some(entry_idx),
        })?;
        all_changes.push(changes);
    }

    for (entry_idx, changes) in all_changes.into_iter().enumerate() {
        for (change_idx, change) in changes.iter().enumerate() {
            let product = change.pointer("/value/messaging_product");
            if product.and_then(Value::as_str) != Some(EXPECTED_MESSAGING_PRODUCT) {
                return Err(AuthError::UnexpectedValue {
                    entry: entry_idx,
                    change: change_idx,
                    observed: product.unwrap_or(&Value::Null).to_string(),
                });
            }
        }
    }

    Ok(())
}

fn non_empty_array<'a>(value: &'a Value, key: &str) -> Option<&'a Vec<Value>> {
    value
        .get(key)
        .and_then(Value::as_array)
        .filter(|items| !items.is_empty())
}

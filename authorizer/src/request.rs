//! Normalized description of an inbound webhook request.
//!
//! The front door translates its own transport envelope into an
//! [`InboundRequest`]; nothing here knows about HTTP servers.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Request method, reduced to what the decision cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    /// Subscription handshake.
    Get,
    /// Event notification carrying a signed body.
    Post,
    /// Anything else, uppercased.
    Other(String),
}

impl Method {
    pub fn parse(raw: &str) -> Self {
        let upper = raw.to_ascii_uppercase();
        match upper.as_str() {
            "GET" => Method::Get,
            "POST" => Method::Post,
            _ => Method::Other(upper),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Other(m) => m,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Header map with names folded to lowercase at construction.
///
/// Names that fold to the same key with different values are remembered as
/// conflicting, whatever order they arrived in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    values: HashMap<String, String>,
    conflicting: BTreeSet<String>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a header. A later name that folds to the same key replaces
    /// the earlier value; a differing value marks the key as conflicting.
    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        let key = name.to_ascii_lowercase();
        let value = value.into();
        if let Some(previous) = self.values.get(&key) {
            if *previous != value {
                self.conflicting.insert(key.clone());
            }
        }
        self.values.insert(key, value);
    }

    /// Case-insensitive lookup. The value is returned untouched.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// True when `name` was supplied more than once with different values.
    pub fn is_conflicting(&self, name: &str) -> bool {
        self.conflicting.contains(&name.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.insert(name.as_ref(), value);
        }
        headers
    }
}

/// One request as seen by the authorizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundRequest {
    pub method: Method,
    /// Protected resource, echoed back unchanged in the decision.
    pub resource_id: String,
    pub headers: Headers,
    /// Exactly as received. Signatures are checked over these bytes.
    pub raw_body: Vec<u8>,
}

impl InboundRequest {
    pub fn new(method: Method, resource_id: impl Into<String>) -> Self {
        Self {
            method,
            resource_id: resource_id.into(),
            headers: Headers::new(),
            raw_body: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.raw_body = body.into();
        self
    }
}

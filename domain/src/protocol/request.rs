//! Request value object

use serde::{Deserialize, Serialize};
use std::fmt;

/// A query extracted from the client stream (Value Object)
///
/// Always trimmed and never empty: a marker followed only by whitespace is
/// framing noise and never becomes a `Request`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    query: String,
}

impl Request {
    /// Build a request from the raw text that followed the marker.
    ///
    /// Returns `None` when nothing but whitespace remains after trimming.
    pub fn from_raw(raw: &str) -> Option<Self> {
        let query = raw.trim();
        if query.is_empty() {
            None
        } else {
            Some(Self {
                query: query.to_string(),
            })
        }
    }

    /// Get the trimmed query text
    pub fn query(&self) -> &str {
        &self.query
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.query)
    }
}

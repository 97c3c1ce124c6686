//! Case-insensitive inbound header map.

use std::collections::HashMap;

/// Header carrying the encoded identity claims.
pub const IDENTITY_HEADER: &str = "x-identity-claims";
/// Header carrying the client's idempotency key.
pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";
/// Conditional-write header (expected ETag).
pub const IF_MATCH_HEADER: &str = "if-match";
/// Conditional-read header.
pub const IF_NONE_MATCH_HEADER: &str = "if-none-match";
/// Correlation identifier; generated when absent.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Transport headers of one inbound call.
///
/// Names are matched case-insensitively; a repeated name keeps the last value.
/// Framework-specific code builds a `Headers` from its own request type and
/// hands it to [`extract_call`](super::extract_call).
///
/// # Examples
///
/// ```
/// use catalog_boundary::rpc::Headers;
///
/// let mut headers = Headers::new();
/// headers.insert("Idempotency-Key", "abc-123");
/// assert_eq!(headers.get("idempotency-key"), Some("abc-123"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Headers {
    entries: HashMap<String, String>,
}

impl Headers {
    /// Creates an empty header map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a header, replacing any previous value under the same name.
    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.entries
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
    }

    /// Returns the raw value of a header.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Returns the trimmed value of a header, treating blank values as absent.
    pub fn get_trimmed(&self, name: &str) -> Option<&str> {
        self.get(name).map(str::trim).filter(|v| !v.is_empty())
    }

    /// Number of distinct header names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no headers were supplied.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

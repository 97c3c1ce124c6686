use std::fmt;

/// A value that must never appear in logs or formatted output.
///
/// The raw identity token of an inbound call is kept in a `Secret` so that
/// `Debug`-printing a [`RequestMetadata`](crate::RequestMetadata) or a span
/// field cannot leak it.
///
/// # Examples
///
/// ```
/// use catalog_boundary::Secret;
///
/// let token = Secret::new("eyJzdWIiOiJhIn0".to_string());
/// assert_eq!(format!("{token:?}"), "[REDACTED]");
/// assert_eq!(token.expose_secret(), "eyJzdWIiOiJhIn0");
/// ```
// Do not derive Clone, Default or Serialize; each would hand the value out silently.
pub struct Secret<T> {
    inner: T,
}

impl<T> Secret<T> {
    /// Wraps a sensitive value.
    pub fn new(value: T) -> Self {
        Self { inner: value }
    }

    /// Explicitly exposes the wrapped value.
    pub fn expose_secret(&self) -> &T {
        &self.inner
    }
}

impl<T> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<T> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_and_display_are_redacted() {
        let token = Secret::new("header.payload.sig".to_string());
        assert_eq!(format!("{:?}", token), "[REDACTED]");
        assert_eq!(format!("{}", token), "[REDACTED]");
    }

    #[test]
    fn nested_debug_is_redacted() {
        #[derive(Debug)]
        #[allow(dead_code)]
        struct Carrier {
            token: Secret<String>,
        }

        let carrier = Carrier {
            token: Secret::new("eyJzdWIiOiJhbGljZSJ9".to_string()),
        };
        let out = format!("{:?}", carrier);
        assert!(!out.contains("eyJ"));
        assert!(out.contains("[REDACTED]"));
    }

    #[test]
    fn expose_returns_value() {
        let token = Secret::new(String::from("raw"));
        assert_eq!(token.expose_secret(), "raw");
    }
}

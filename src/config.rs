//! Boundary configuration.
//!
//! Only the per-kind timeouts are configurable. Each is optional and given in
//! milliseconds; unset values are filled in by [`TimeoutPolicy::resolve`].

use std::fmt;
use std::time::Duration;

use serde::Deserialize;

use crate::context::{Propagator, TimeoutPolicy};

/// Environment variable for the command timeout, in milliseconds.
pub const ENV_COMMAND_TIMEOUT_MS: &str = "CATALOG_COMMAND_TIMEOUT_MS";
/// Environment variable for the query timeout, in milliseconds.
pub const ENV_QUERY_TIMEOUT_MS: &str = "CATALOG_QUERY_TIMEOUT_MS";
/// Environment variable for the default timeout, in milliseconds.
pub const ENV_DEFAULT_TIMEOUT_MS: &str = "CATALOG_DEFAULT_TIMEOUT_MS";

/// Raw timeout configuration.
///
/// `0` is a valid value and means "no deadline" for that kind.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use catalog_boundary::config::BoundaryConfig;
/// use catalog_boundary::OperationKind;
///
/// let config = BoundaryConfig::from_json(r#"{"query_timeout_ms": 1500}"#).unwrap();
/// let policy = config.timeout_policy();
/// assert_eq!(policy.timeout_for(OperationKind::Query), Duration::from_millis(1500));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BoundaryConfig {
    /// Timeout for state-changing operations
    pub command_timeout_ms: Option<u64>,
    /// Timeout for read-only operations
    pub query_timeout_ms: Option<u64>,
    /// Timeout for unclassified operations
    pub default_timeout_ms: Option<u64>,
}

impl BoundaryConfig {
    /// Parses a JSON document.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(raw)
            .map_err(|e| ConfigError::new(ConfigErrorKind::Malformed, e.to_string()))
    }

    /// Reads the `CATALOG_*_TIMEOUT_MS` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads configuration through an arbitrary variable lookup.
    ///
    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &'static str| -> Result<Option<u64>, ConfigError> {
            match lookup(name) {
                Some(value) if !value.trim().is_empty() => value
                    .trim()
                    .parse::<u64>()
                    .map(Some)
                    .map_err(|_| ConfigError::invalid_value(name, &value)),
                _ => Ok(None),
            }
        };

        Ok(Self {
            command_timeout_ms: read(ENV_COMMAND_TIMEOUT_MS)?,
            query_timeout_ms: read(ENV_QUERY_TIMEOUT_MS)?,
            default_timeout_ms: read(ENV_DEFAULT_TIMEOUT_MS)?,
        })
    }

    /// Resolves the per-kind timeouts.
    pub fn timeout_policy(&self) -> TimeoutPolicy {
        let ms = |v: Option<u64>| v.map(Duration::from_millis);
        TimeoutPolicy::resolve(
            ms(self.command_timeout_ms),
            ms(self.query_timeout_ms),
            ms(self.default_timeout_ms),
        )
    }

    /// Builds a [`Propagator`] enforcing this configuration.
    pub fn propagator(&self) -> Propagator {
        Propagator::new(self.timeout_policy())
    }
}

/// A configuration that could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    /// What went wrong
    pub kind: ConfigErrorKind,
    /// Human-readable detail
    pub message: String,
}

impl ConfigError {
    /// Creates a new error.
    pub fn new(kind: ConfigErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    fn invalid_value(name: &str, value: &str) -> Self {
        Self::new(
            ConfigErrorKind::InvalidValue,
            format!("{name} must be a non-negative integer, got {value:?}"),
        )
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Categories of configuration errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigErrorKind {
    /// The document is not valid configuration JSON
    Malformed,
    /// A variable holds something other than a millisecond count
    InvalidValue,
}

impl fmt::Display for ConfigErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigErrorKind::Malformed => write!(f, "Malformed configuration"),
            ConfigErrorKind::InvalidValue => write!(f, "Invalid configuration value"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::context::{OperationKind, FALLBACK_DEFAULT_TIMEOUT, FALLBACK_QUERY_TIMEOUT};

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn empty_config_uses_fallbacks() {
        let policy = BoundaryConfig::default().timeout_policy();
        assert_eq!(policy.timeout_for(OperationKind::Command), FALLBACK_DEFAULT_TIMEOUT);
        assert_eq!(policy.timeout_for(OperationKind::Query), FALLBACK_DEFAULT_TIMEOUT);
    }

    #[test]
    fn json_fields_are_optional() {
        let config = BoundaryConfig::from_json("{}").unwrap();
        assert_eq!(config, BoundaryConfig::default());

        let config = BoundaryConfig::from_json(r#"{"command_timeout_ms": 0}"#).unwrap();
        let policy = config.timeout_policy();
        assert_eq!(policy.timeout_for(OperationKind::Command), Duration::ZERO);
        assert_eq!(policy.timeout_for(OperationKind::Query), FALLBACK_DEFAULT_TIMEOUT);
    }

    #[test]
    fn zero_default_leaves_query_on_fallback() {
        let config = BoundaryConfig::from_json(r#"{"default_timeout_ms": 0}"#).unwrap();
        let policy = config.timeout_policy();
        assert_eq!(policy.timeout_for(OperationKind::Query), FALLBACK_QUERY_TIMEOUT);
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = BoundaryConfig::from_json(r#"{"query_timeout_ms": "soon"}"#).unwrap_err();
        assert_eq!(err.kind, ConfigErrorKind::Malformed);

        let err = BoundaryConfig::from_json(r#"{"query_timeout": 5}"#).unwrap_err();
        assert_eq!(err.kind, ConfigErrorKind::Malformed);
    }

    #[test]
    fn env_values_are_parsed() {
        let config = BoundaryConfig::from_lookup(lookup(&[
            (ENV_COMMAND_TIMEOUT_MS, "8000"),
            (ENV_QUERY_TIMEOUT_MS, " 250 "),
            (ENV_DEFAULT_TIMEOUT_MS, ""),
        ]))
        .unwrap();

        assert_eq!(config.command_timeout_ms, Some(8000));
        assert_eq!(config.query_timeout_ms, Some(250));
        assert_eq!(config.default_timeout_ms, None);

        let policy = config.timeout_policy();
        assert_eq!(policy.timeout_for(OperationKind::Default), Duration::from_secs(8));
    }

    #[test]
    fn env_garbage_names_the_variable() {
        let err =
            BoundaryConfig::from_lookup(lookup(&[(ENV_QUERY_TIMEOUT_MS, "-1")])).unwrap_err();
        assert_eq!(err.kind, ConfigErrorKind::InvalidValue);
        assert!(err.to_string().contains(ENV_QUERY_TIMEOUT_MS));
    }
}

//! Call context and deadline propagation.
//!
//! A [`CallContext`] is the explicit, immutable carrier threaded through every
//! collaborator call: request id, the resolved [`RequestMetadata`], and the
//! effective deadline. [`Propagator`] derives the downstream context for one
//! operation and enforces its deadline.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use uuid::Uuid;

use crate::error::Status;
use crate::logging::CallLog;
use crate::metadata::RequestMetadata;

/// Fallback for the default timeout when nothing is configured.
pub const FALLBACK_DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
/// Fallback for the query timeout when neither it nor a default is usable.
pub const FALLBACK_QUERY_TIMEOUT: Duration = Duration::from_secs(3);

/// Execution context of one call.
///
/// Cloning is cheap: metadata is shared behind an `Arc`. There are no
/// mutable accessors; derived contexts are new values.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use catalog_boundary::{CallContext, RequestMetadata};
/// use catalog_boundary::rpc::Headers;
///
/// let ctx = CallContext::new("req-1");
/// // The zero value is never attached
/// let ctx = ctx.with_metadata(Arc::new(RequestMetadata::resolve(&Headers::new())));
/// assert!(ctx.metadata().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct CallContext {
    request_id: String,
    metadata: Option<Arc<RequestMetadata>>,
    deadline: Option<Instant>,
}

impl CallContext {
    /// Creates a root context with no metadata and no deadline.
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            metadata: None,
            deadline: None,
        }
    }

    /// Creates a root context with a freshly generated request id.
    pub fn generated() -> Self {
        Self::new(Uuid::new_v4().to_string())
    }

    /// Returns the correlation id of this call.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Returns the attached metadata, if any.
    pub fn metadata(&self) -> Option<&RequestMetadata> {
        self.metadata.as_deref()
    }

    /// Returns the effective deadline, if one is imposed.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline; `None` when no deadline is imposed.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Derives a context carrying `metadata`.
    ///
    /// Empty metadata is not attached, so unrelated calls never see a blank
    /// marker.
    pub fn with_metadata(&self, metadata: Arc<RequestMetadata>) -> Self {
        let mut derived = self.clone();
        if !metadata.is_empty() {
            derived.metadata = Some(metadata);
        }
        derived
    }

    /// Derives a context whose deadline is at most `deadline`.
    ///
    /// An inherited earlier deadline is kept.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let mut derived = self.clone();
        derived.deadline = Some(match self.deadline {
            Some(existing) if existing <= deadline => existing,
            _ => deadline,
        });
        derived
    }

    /// Derives a context that expires `timeout` from now.
    ///
    /// A zero timeout imposes nothing and returns the context unchanged, as
    /// does a timeout too large to be represented as an instant.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        if timeout.is_zero() {
            return self.clone();
        }
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self.clone(),
        }
    }

    /// Returns a logger that stamps every line with this call's request id.
    pub fn log(&self) -> CallLog<'_> {
        CallLog::new(&self.request_id)
    }
}

/// Operation class used to pick a timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// State-changing operation
    Command,
    /// Read-only operation
    Query,
    /// Anything not classified
    Default,
}

impl OperationKind {
    /// Returns the lowercase name used in log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Command => "command",
            OperationKind::Query => "query",
            OperationKind::Default => "default",
        }
    }
}

/// Resolved per-kind timeouts.
///
/// A zero duration means "no deadline" for that kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutPolicy {
    command: Duration,
    query: Duration,
    default: Duration,
}

impl TimeoutPolicy {
    /// Resolves a policy from up to three configured durations.
    ///
    /// - `default` missing: taken from a non-zero `command`, else a non-zero
    ///   `query`, else [`FALLBACK_DEFAULT_TIMEOUT`].
    /// - `command` missing: `default`.
    /// - `query` missing: a non-zero `default`, else [`FALLBACK_QUERY_TIMEOUT`].
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use catalog_boundary::{OperationKind, TimeoutPolicy};
    ///
    /// let policy = TimeoutPolicy::resolve(Some(Duration::from_secs(2)), None, None);
    /// assert_eq!(policy.timeout_for(OperationKind::Default), Duration::from_secs(2));
    /// assert_eq!(policy.timeout_for(OperationKind::Query), Duration::from_secs(2));
    /// ```
    pub fn resolve(
        command: Option<Duration>,
        query: Option<Duration>,
        default: Option<Duration>,
    ) -> Self {
        let non_zero = |d: Option<Duration>| d.filter(|d| !d.is_zero());

        let default = default
            .or_else(|| non_zero(command))
            .or_else(|| non_zero(query))
            .unwrap_or(FALLBACK_DEFAULT_TIMEOUT);
        let command = command.unwrap_or(default);
        let query = query
            .or_else(|| non_zero(Some(default)))
            .unwrap_or(FALLBACK_QUERY_TIMEOUT);

        Self {
            command,
            query,
            default,
        }
    }

    /// Returns the timeout applied to `kind`.
    pub fn timeout_for(&self, kind: OperationKind) -> Duration {
        match kind {
            OperationKind::Command => self.command,
            OperationKind::Query => self.query,
            OperationKind::Default => self.default,
        }
    }
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self::resolve(None, None, None)
    }
}

/// Derives downstream contexts and enforces their deadlines.
#[derive(Debug, Clone, Default)]
pub struct Propagator {
    policy: TimeoutPolicy,
}

impl Propagator {
    /// Creates a propagator with the given timeout policy.
    pub fn new(policy: TimeoutPolicy) -> Self {
        Self { policy }
    }

    /// Returns the timeout policy.
    pub fn policy(&self) -> &TimeoutPolicy {
        &self.policy
    }

    /// Builds the context a collaborator call of `kind` runs under.
    pub fn propagate(
        &self,
        parent: &CallContext,
        metadata: &Arc<RequestMetadata>,
        kind: OperationKind,
    ) -> CallContext {
        parent
            .with_metadata(Arc::clone(metadata))
            .with_timeout(self.policy.timeout_for(kind))
    }

    /// Runs `op` under the propagated context.
    ///
    /// When the deadline elapses the in-flight future is dropped, which
    /// cancels any collaborator calls it owns, and the call fails with
    /// [`Code::DeadlineExceeded`](crate::Code::DeadlineExceeded). The timer
    /// lives inside the awaited future and is released on every exit path.
    pub async fn call<T, F, Fut>(
        &self,
        parent: &CallContext,
        metadata: &Arc<RequestMetadata>,
        kind: OperationKind,
        op: F,
    ) -> Result<T, Status>
    where
        F: FnOnce(CallContext) -> Fut,
        Fut: Future<Output = Result<T, Status>>,
    {
        let ctx = self.propagate(parent, metadata, kind);
        let Some(deadline) = ctx.deadline() else {
            return op(ctx).await;
        };

        let request_id = ctx.request_id().to_owned();
        match tokio::time::timeout_at(deadline, op(ctx)).await {
            Ok(result) => result,
            Err(_) => {
                CallLog::new(&request_id)
                    .warn(format_args!("deadline exceeded for {} call", kind.as_str()));
                Err(Status::deadline_exceeded("deadline exceeded"))
            }
        }
    }
}

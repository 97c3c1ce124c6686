//! Collaborator service contracts.
//!
//! Each collaborator role is a narrow async trait so handlers can be composed
//! from independently substitutable parts. Every method receives the
//! propagated [`CallContext`] explicitly; nothing is read from ambient state.
//!
//! Collaborators fail with a [`ServiceError`] whose kind comes from a closed
//! set. Translation into outbound statuses happens in [`crate::error`].

use std::fmt;

use async_trait::async_trait;
use uuid::Uuid;

use crate::concurrency::ConditionalWrite;
use crate::context::CallContext;
use crate::model::{Engagement, EngagementKind, Profile, VideoProjection, VideoStats, WatchLogEntry};

/// A failure reported by a collaborator service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceError {
    /// The closed error kind
    pub kind: ServiceErrorKind,
    /// Collaborator-side detail; logged, only surfaced for client-facing kinds
    pub message: String,
}

impl ServiceError {
    /// Creates a new collaborator error.
    pub fn new(kind: ServiceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// The addressed entity (or the whole batch) does not exist.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::NotFound, message)
    }

    /// The stored version differs from the expected one.
    pub fn version_conflict(expected: i64, actual: i64) -> Self {
        Self::new(
            ServiceErrorKind::VersionConflict,
            format!("expected version {expected}, stored version {actual}"),
        )
    }

    /// The collaborator does not recognise part of the input.
    pub fn unsupported_input(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::UnsupportedInput, message)
    }

    /// Any other collaborator failure.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::Internal, message)
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ServiceError {}

/// The closed set of collaborator error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceErrorKind {
    /// Entity absent
    NotFound,
    /// Conditional write rejected
    VersionConflict,
    /// Input value the collaborator cannot handle
    UnsupportedInput,
    /// Everything else
    Internal,
}

impl ServiceErrorKind {
    /// Parses a collaborator's wire error code.
    ///
    /// Unrecognised codes map to [`ServiceErrorKind::Internal`].
    pub fn from_code(code: &str) -> Self {
        match code {
            "not_found" => ServiceErrorKind::NotFound,
            "version_conflict" => ServiceErrorKind::VersionConflict,
            "unsupported_input" => ServiceErrorKind::UnsupportedInput,
            _ => ServiceErrorKind::Internal,
        }
    }
}

impl fmt::Display for ServiceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceErrorKind::NotFound => write!(f, "not_found"),
            ServiceErrorKind::VersionConflict => write!(f, "version_conflict"),
            ServiceErrorKind::UnsupportedInput => write!(f, "unsupported_input"),
            ServiceErrorKind::Internal => write!(f, "internal"),
        }
    }
}

/// A profile write after identity, mask and precondition resolution.
///
/// `None` fields are left untouched by the writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    /// Profile being written
    pub user_id: Uuid,
    /// New display name, if in scope
    pub display_name: Option<String>,
    /// New avatar location, if in scope
    pub avatar_url: Option<String>,
    /// New biography, if in scope
    pub bio: Option<String>,
    /// Optional expected-version precondition
    pub precondition: ConditionalWrite,
    /// Client idempotency key, forwarded verbatim
    pub idempotency_key: Option<String>,
}

/// An engagement add/remove after boundary parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngagementWrite {
    /// Acting user
    pub user_id: Uuid,
    /// Target video
    pub video_id: Uuid,
    /// Engagement kind
    pub kind: EngagementKind,
    /// Client idempotency key, forwarded verbatim
    pub idempotency_key: Option<String>,
}

/// Reads stored profiles.
#[async_trait]
pub trait ProfileReader: Send + Sync {
    /// Fetches one profile.
    async fn get_profile(&self, ctx: &CallContext, user_id: Uuid) -> Result<Profile, ServiceError>;
}

/// Writes profiles under the conditional-write contract.
#[async_trait]
pub trait ProfileWriter: Send + Sync {
    /// Applies a partial update.
    ///
    /// Implementations must reject the write with
    /// [`ServiceErrorKind::VersionConflict`] when the update carries an
    /// expected version that differs from the stored one.
    async fn update_profile(
        &self,
        ctx: &CallContext,
        update: ProfileUpdate,
    ) -> Result<Profile, ServiceError>;
}

/// Engagement store: writes plus the primary favorites listing.
#[async_trait]
pub trait EngagementStore: Send + Sync {
    /// Records an engagement.
    async fn add_engagement(
        &self,
        ctx: &CallContext,
        write: EngagementWrite,
    ) -> Result<Engagement, ServiceError>;

    /// Removes an engagement.
    async fn remove_engagement(
        &self,
        ctx: &CallContext,
        write: EngagementWrite,
    ) -> Result<(), ServiceError>;

    /// Lists a user's engagements of one kind, newest first.
    async fn list_engagements(
        &self,
        ctx: &CallContext,
        user_id: Uuid,
        kind: EngagementKind,
        offset: i32,
        limit: i32,
    ) -> Result<Vec<Engagement>, ServiceError>;

    /// Returns which of `video_ids` the user has favorited.
    async fn favorited_among(
        &self,
        ctx: &CallContext,
        user_id: Uuid,
        video_ids: &[Uuid],
    ) -> Result<Vec<Uuid>, ServiceError>;
}

/// Reads the per-user watch log.
#[async_trait]
pub trait WatchHistoryReader: Send + Sync {
    /// Lists watch-log entries, most recent first.
    async fn list_watch_history(
        &self,
        ctx: &CallContext,
        user_id: Uuid,
        offset: i32,
        limit: i32,
    ) -> Result<Vec<WatchLogEntry>, ServiceError>;
}

/// Bulk reads from the stats aggregator.
#[async_trait]
pub trait StatsReader: Send + Sync {
    /// Fetches stats for every known id in `video_ids`; unknown ids are omitted.
    async fn batch_stats(
        &self,
        ctx: &CallContext,
        video_ids: &[Uuid],
    ) -> Result<Vec<VideoStats>, ServiceError>;
}

/// Bulk reads from the video-metadata projection.
#[async_trait]
pub trait ProjectionReader: Send + Sync {
    /// Fetches projections for every known id in `video_ids`; unknown ids are omitted.
    async fn batch_projections(
        &self,
        ctx: &CallContext,
        video_ids: &[Uuid],
    ) -> Result<Vec<VideoProjection>, ServiceError>;
}

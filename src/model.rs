//! Records exchanged with collaborator services.
//!
//! These mirror shapes owned by the profile store, engagement store, watch
//! log, stats aggregator and metadata projection. Past the boundary every
//! identifier is a parsed [`Uuid`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Status;

/// A stored user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Owner of the profile
    pub user_id: Uuid,
    /// Display name shown next to engagements
    pub display_name: String,
    /// Avatar image location
    pub avatar_url: String,
    /// Free-form biography
    pub bio: String,
    /// Optimistic-concurrency version, bumped on every write
    pub version: i64,
}

/// The kind of engagement a user has with a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngagementKind {
    /// Video saved to favorites
    Favorite,
    /// Video liked
    Like,
    /// Video queued to watch later
    WatchLater,
}

impl EngagementKind {
    /// Returns the wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            EngagementKind::Favorite => "favorite",
            EngagementKind::Like => "like",
            EngagementKind::WatchLater => "watch_later",
        }
    }
}

impl fmt::Display for EngagementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngagementKind {
    type Err = Status;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "favorite" => Ok(EngagementKind::Favorite),
            "like" => Ok(EngagementKind::Like),
            "watch_later" => Ok(EngagementKind::WatchLater),
            other => Err(Status::invalid_argument(format!(
                "unsupported engagement type: {other:?}"
            ))),
        }
    }
}

/// One engagement record (primary source for favorites listings).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engagement {
    /// Engaging user
    pub user_id: Uuid,
    /// Referenced video
    pub video_id: Uuid,
    /// What kind of engagement
    pub kind: EngagementKind,
    /// Creation time, milliseconds since the Unix epoch
    pub created_at_ms: i64,
}

/// One watch-log record (primary source for watch history).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchLogEntry {
    /// Watching user
    pub user_id: Uuid,
    /// Referenced video
    pub video_id: Uuid,
    /// Last playback position
    pub position_secs: u32,
    /// Time of the watch event, milliseconds since the Unix epoch
    pub watched_at_ms: i64,
}

/// Video metadata read model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoProjection {
    /// Projected video
    pub video_id: Uuid,
    /// Title; empty when the projection has no record
    pub title: String,
    /// Thumbnail location; empty when unknown
    pub thumbnail_url: String,
    /// Duration; zero when unknown
    pub duration_secs: u32,
}

impl VideoProjection {
    /// An empty projection for a video the read model has no record of.
    pub fn empty(video_id: Uuid) -> Self {
        Self {
            video_id,
            title: String::new(),
            thumbnail_url: String::new(),
            duration_secs: 0,
        }
    }
}

/// Aggregate counters for a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoStats {
    /// Counted video
    pub video_id: Uuid,
    /// Total views
    pub views: u64,
    /// Total favorites
    pub favorites: u64,
}

impl VideoStats {
    /// Zero counters for a video the aggregator has not seen.
    pub fn zero(video_id: Uuid) -> Self {
        Self {
            video_id,
            views: 0,
            favorites: 0,
        }
    }
}

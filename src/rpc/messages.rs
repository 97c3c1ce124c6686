//! Request and response messages of the profile/engagement RPC surface.
//!
//! Request fields whose presence matters are `Option`s; everything is parsed
//! into concrete types before a collaborator sees it.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{Engagement, Profile, VideoProjection, VideoStats, WatchLogEntry};

/// Fetch a profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GetProfileRequest {
    /// Explicit target; falls back to the caller identity
    pub user_id: Option<String>,
}

/// Partially update a profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateProfileRequest {
    /// Explicit target; falls back to the caller identity
    pub user_id: Option<String>,
    /// New display name
    pub display_name: Option<String>,
    /// New avatar location
    pub avatar_url: Option<String>,
    /// New biography
    pub bio: Option<String>,
    /// Field paths to apply; empty applies every provided field
    pub update_mask: Vec<String>,
    /// Optimistic-concurrency precondition
    pub expected_version: Option<i64>,
}

/// Delete a profile (not supported).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeleteProfileRequest {
    /// Explicit target; falls back to the caller identity
    pub user_id: Option<String>,
}

/// A profile as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileView {
    /// The stored profile
    pub profile: Profile,
    /// Strong ETag of the stored version, usable as `If-Match`
    pub etag: String,
}

/// Add or remove an engagement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngagementRequest {
    /// Explicit acting user; falls back to the caller identity
    pub user_id: Option<String>,
    /// Target video
    pub video_id: String,
    /// Wire name of the engagement kind
    pub kind: String,
}

/// Result of adding an engagement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementResponse {
    /// The stored engagement
    pub engagement: Engagement,
}

/// Page through a user's favorites.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListFavoritesRequest {
    /// Explicit target; falls back to the caller identity
    pub user_id: Option<String>,
    /// Requested page size; `<= 0` selects the default
    pub page_size: i32,
    /// Opaque token from a previous response
    pub page_token: String,
}

/// One favorite joined with its video metadata and counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteItem {
    /// Primary record
    pub engagement: Engagement,
    /// Projection attachment; empty when unknown
    pub video: VideoProjection,
    /// Stats attachment; zero when unknown
    pub stats: VideoStats,
}

/// A page of favorites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListFavoritesResponse {
    /// Joined items
    pub items: Vec<FavoriteItem>,
    /// Empty on the last page
    pub next_page_token: String,
}

/// Page through a user's watch history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListWatchHistoryRequest {
    /// Explicit target; falls back to the caller identity
    pub user_id: Option<String>,
    /// Requested page size; `<= 0` selects the default
    pub page_size: i32,
    /// Opaque token from a previous response
    pub page_token: String,
}

/// One watch-log entry joined with its video metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchHistoryItem {
    /// Primary record
    pub entry: WatchLogEntry,
    /// Projection attachment; empty when unknown
    pub video: VideoProjection,
}

/// A page of watch history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListWatchHistoryResponse {
    /// Joined items
    pub items: Vec<WatchHistoryItem>,
    /// Empty on the last page
    pub next_page_token: String,
}

/// Look up favorite state for several videos at once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchGetFavoritesRequest {
    /// Explicit target; falls back to the caller identity
    pub user_id: Option<String>,
    /// Videos to check; duplicates are collapsed
    pub video_ids: Vec<String>,
    /// Also attach stats for each video
    pub include_stats: bool,
}

/// Favorite state of one video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteState {
    /// Checked video
    pub video_id: Uuid,
    /// Whether the user has it in favorites
    pub favorited: bool,
    /// Counters, when requested
    pub stats: Option<VideoStats>,
}

/// Favorite states, in first-seen request order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchGetFavoritesResponse {
    /// One entry per distinct requested video
    pub states: Vec<FavoriteState>,
}

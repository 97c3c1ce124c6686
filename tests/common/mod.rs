//! In-memory collaborators shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use uuid::Uuid;

use catalog_boundary::rpc::{extract_call, Collaborators, Headers, InboundCall, ProfileHandler};
use catalog_boundary::service::{
    EngagementStore, EngagementWrite, ProfileReader, ProfileUpdate, ProfileWriter,
    ProjectionReader, StatsReader, WatchHistoryReader,
};
use catalog_boundary::{
    CallContext, Engagement, EngagementKind, Profile, Propagator, ServiceError, VideoProjection,
    VideoStats, WatchLogEntry,
};

/// One recorded secondary lookup: source name and the ids it was asked for.
pub type Lookup = (&'static str, Vec<Uuid>);

/// A whole catalog held in memory.
///
/// Every bulk read is recorded in `lookups`; every write input is recorded
/// so tests can inspect exactly what crossed the boundary.
#[derive(Default)]
pub struct Catalog {
    profiles: Mutex<HashMap<Uuid, Profile>>,
    engagements: Mutex<Vec<Engagement>>,
    watch_log: Mutex<Vec<WatchLogEntry>>,
    projections: Mutex<HashMap<Uuid, VideoProjection>>,
    stats: Mutex<HashMap<Uuid, VideoStats>>,
    failures: Mutex<HashMap<&'static str, ServiceError>>,
    stall: Mutex<Option<Duration>>,
    pub lookups: Mutex<Vec<Lookup>>,
    pub profile_updates: Mutex<Vec<ProfileUpdate>>,
    pub engagement_writes: Mutex<Vec<EngagementWrite>>,
    pub seen_request_ids: Mutex<Vec<String>>,
}

impl Catalog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn put_profile(&self, profile: Profile) {
        self.profiles.lock().unwrap().insert(profile.user_id, profile);
    }

    pub fn profile(&self, user_id: Uuid) -> Option<Profile> {
        self.profiles.lock().unwrap().get(&user_id).cloned()
    }

    pub fn favorite(&self, user_id: Uuid, video_id: Uuid, created_at_ms: i64) {
        self.engagements.lock().unwrap().push(Engagement {
            user_id,
            video_id,
            kind: EngagementKind::Favorite,
            created_at_ms,
        });
    }

    pub fn watched(&self, user_id: Uuid, video_id: Uuid, watched_at_ms: i64) {
        self.watch_log.lock().unwrap().push(WatchLogEntry {
            user_id,
            video_id,
            position_secs: 42,
            watched_at_ms,
        });
    }

    pub fn put_video(&self, video_id: Uuid, title: &str) {
        self.projections.lock().unwrap().insert(
            video_id,
            VideoProjection {
                video_id,
                title: title.to_string(),
                thumbnail_url: format!("https://img.example/{video_id}.jpg"),
                duration_secs: 300,
            },
        );
    }

    pub fn put_stats(&self, video_id: Uuid, views: u64, favorites: u64) {
        self.stats.lock().unwrap().insert(
            video_id,
            VideoStats {
                video_id,
                views,
                favorites,
            },
        );
    }

    /// Makes every call to `source` fail with `err`.
    pub fn fail(&self, source: &'static str, err: ServiceError) {
        self.failures.lock().unwrap().insert(source, err);
    }

    /// Delays every primary read by `delay`.
    pub fn stall_for(&self, delay: Duration) {
        *self.stall.lock().unwrap() = Some(delay);
    }

    pub fn lookups_of(&self, source: &str) -> Vec<Vec<Uuid>> {
        self.lookups
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, _)| *s == source)
            .map(|(_, ids)| ids.clone())
            .collect()
    }

    async fn enter(&self, source: &'static str, ctx: &CallContext) -> Result<(), ServiceError> {
        self.seen_request_ids
            .lock()
            .unwrap()
            .push(ctx.request_id().to_string());
        let stall = *self.stall.lock().unwrap();
        if let Some(delay) = stall {
            tokio::time::sleep(delay).await;
        }
        match self.failures.lock().unwrap().get(source) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn record(&self, source: &'static str, ids: &[Uuid]) {
        self.lookups.lock().unwrap().push((source, ids.to_vec()));
    }
}

#[async_trait]
impl ProfileReader for Catalog {
    async fn get_profile(&self, ctx: &CallContext, user_id: Uuid) -> Result<Profile, ServiceError> {
        self.enter("profiles", ctx).await?;
        self.profile(user_id)
            .ok_or_else(|| ServiceError::not_found(format!("profile {user_id} not found")))
    }
}

#[async_trait]
impl ProfileWriter for Catalog {
    async fn update_profile(
        &self,
        ctx: &CallContext,
        update: ProfileUpdate,
    ) -> Result<Profile, ServiceError> {
        self.enter("profiles", ctx).await?;
        self.profile_updates.lock().unwrap().push(update.clone());

        let mut profiles = self.profiles.lock().unwrap();
        let stored = profiles
            .get_mut(&update.user_id)
            .ok_or_else(|| ServiceError::not_found(format!("profile {} not found", update.user_id)))?;
        update.precondition.check(stored.version)?;

        if let Some(name) = update.display_name {
            stored.display_name = name;
        }
        if let Some(url) = update.avatar_url {
            stored.avatar_url = url;
        }
        if let Some(bio) = update.bio {
            stored.bio = bio;
        }
        stored.version += 1;
        Ok(stored.clone())
    }
}

#[async_trait]
impl EngagementStore for Catalog {
    async fn add_engagement(
        &self,
        ctx: &CallContext,
        write: EngagementWrite,
    ) -> Result<Engagement, ServiceError> {
        self.enter("engagements", ctx).await?;
        self.engagement_writes.lock().unwrap().push(write.clone());

        let engagement = Engagement {
            user_id: write.user_id,
            video_id: write.video_id,
            kind: write.kind,
            created_at_ms: 1_700_000_000_000,
        };
        self.engagements.lock().unwrap().push(engagement.clone());
        Ok(engagement)
    }

    async fn remove_engagement(
        &self,
        ctx: &CallContext,
        write: EngagementWrite,
    ) -> Result<(), ServiceError> {
        self.enter("engagements", ctx).await?;
        self.engagement_writes.lock().unwrap().push(write.clone());

        let mut engagements = self.engagements.lock().unwrap();
        let before = engagements.len();
        engagements.retain(|e| {
            !(e.user_id == write.user_id && e.video_id == write.video_id && e.kind == write.kind)
        });
        if engagements.len() == before {
            return Err(ServiceError::not_found("engagement not found"));
        }
        Ok(())
    }

    async fn list_engagements(
        &self,
        ctx: &CallContext,
        user_id: Uuid,
        kind: EngagementKind,
        offset: i32,
        limit: i32,
    ) -> Result<Vec<Engagement>, ServiceError> {
        self.enter("engagements", ctx).await?;
        let mut rows: Vec<Engagement> = self
            .engagements
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.user_id == user_id && e.kind == kind)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at_ms.cmp(&a.created_at_ms));
        Ok(rows
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn favorited_among(
        &self,
        ctx: &CallContext,
        user_id: Uuid,
        video_ids: &[Uuid],
    ) -> Result<Vec<Uuid>, ServiceError> {
        self.enter("favorites", ctx).await?;
        self.record("favorites", video_ids);
        let engagements = self.engagements.lock().unwrap();
        Ok(video_ids
            .iter()
            .copied()
            .filter(|id| {
                engagements.iter().any(|e| {
                    e.user_id == user_id && e.video_id == *id && e.kind == EngagementKind::Favorite
                })
            })
            .collect())
    }
}

#[async_trait]
impl WatchHistoryReader for Catalog {
    async fn list_watch_history(
        &self,
        ctx: &CallContext,
        user_id: Uuid,
        offset: i32,
        limit: i32,
    ) -> Result<Vec<WatchLogEntry>, ServiceError> {
        self.enter("watch_log", ctx).await?;
        let mut rows: Vec<WatchLogEntry> = self
            .watch_log
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.watched_at_ms.cmp(&a.watched_at_ms));
        Ok(rows
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }
}

#[async_trait]
impl StatsReader for Catalog {
    async fn batch_stats(
        &self,
        ctx: &CallContext,
        video_ids: &[Uuid],
    ) -> Result<Vec<VideoStats>, ServiceError> {
        self.record("stats", video_ids);
        self.enter("stats", ctx).await?;
        let stats = self.stats.lock().unwrap();
        Ok(video_ids.iter().filter_map(|id| stats.get(id).copied()).collect())
    }
}

#[async_trait]
impl ProjectionReader for Catalog {
    async fn batch_projections(
        &self,
        ctx: &CallContext,
        video_ids: &[Uuid],
    ) -> Result<Vec<VideoProjection>, ServiceError> {
        self.record("projection", video_ids);
        self.enter("projection", ctx).await?;
        let projections = self.projections.lock().unwrap();
        Ok(video_ids
            .iter()
            .filter_map(|id| projections.get(id).cloned())
            .collect())
    }
}

pub fn handler(catalog: &Arc<Catalog>) -> ProfileHandler {
    handler_with(catalog, Propagator::default())
}

pub fn handler_with(catalog: &Arc<Catalog>, propagator: Propagator) -> ProfileHandler {
    let collaborators = Collaborators {
        profile_reader: catalog.clone(),
        profile_writer: catalog.clone(),
        engagements: catalog.clone(),
        watch_history: catalog.clone(),
        stats: catalog.clone(),
        projections: catalog.clone(),
    };
    ProfileHandler::new(collaborators, propagator)
}

/// Encodes `{"sub": "<subject>"}` the way an upstream gateway would.
pub fn identity_token(subject: &str) -> String {
    URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"{subject}"}}"#))
}

/// An inbound call whose identity header names `user`.
pub fn call_as(user: Uuid) -> InboundCall {
    call_with(&[("X-Identity-Claims", identity_token(&user.to_string()).as_str())])
}

/// An inbound call with exactly these headers.
pub fn call_with(pairs: &[(&str, &str)]) -> InboundCall {
    let headers: Headers = pairs.iter().copied().collect();
    extract_call(&headers)
}

pub fn profile(user_id: Uuid, version: i64) -> Profile {
    Profile {
        user_id,
        display_name: "Ada".to_string(),
        avatar_url: "https://img.example/ada.png".to_string(),
        bio: "mathematician".to_string(),
        version,
    }
}

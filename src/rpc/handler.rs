//! Profile and engagement operations.
//!
//! [`ProfileHandler`] composes the boundary pieces for each operation:
//! metadata already resolved by [`extract_call`](super::extract_call), the
//! [`Propagator`] for the deadline, identity precedence, the concurrency
//! mediator for writes, and pagination plus fan-out for listings.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use tracing::Instrument;
use uuid::Uuid;

use crate::concurrency::{etag_for, mediate, ConditionalWrite, UpdateMask};
use crate::context::{CallContext, OperationKind, Propagator};
use crate::error::Status;
use crate::fanout::{bulk_lookup, AggregationKey, LookupTable};
use crate::identity::{parse_id, resolve_acting_user};
use crate::model::{EngagementKind, VideoProjection, VideoStats};
use crate::pagination::PageCursor;
use crate::service::{
    EngagementStore, EngagementWrite, ProfileReader, ProfileUpdate, ProfileWriter,
    ProjectionReader, StatsReader, WatchHistoryReader,
};

use super::extract::InboundCall;
use super::messages::{
    BatchGetFavoritesRequest, BatchGetFavoritesResponse, DeleteProfileRequest, EngagementRequest,
    EngagementResponse, FavoriteItem, FavoriteState, GetProfileRequest, ListFavoritesRequest,
    ListFavoritesResponse, ListWatchHistoryRequest, ListWatchHistoryResponse, ProfileView,
    UpdateProfileRequest, WatchHistoryItem,
};

/// Profile fields an update mask may name.
pub const PROFILE_MASK_PATHS: [&str; 3] = ["display_name", "avatar_url", "bio"];

/// Most video ids accepted by one batch favorite lookup.
pub const MAX_BATCH_IDS: usize = 100;

/// The collaborator services a handler is composed from.
#[derive(Clone)]
pub struct Collaborators {
    /// Profile store, read side
    pub profile_reader: Arc<dyn ProfileReader>,
    /// Profile store, conditional-write side
    pub profile_writer: Arc<dyn ProfileWriter>,
    /// Engagement store
    pub engagements: Arc<dyn EngagementStore>,
    /// Watch log
    pub watch_history: Arc<dyn WatchHistoryReader>,
    /// Stats aggregator
    pub stats: Arc<dyn StatsReader>,
    /// Video-metadata projection
    pub projections: Arc<dyn ProjectionReader>,
}

/// Handles the profile/engagement RPC surface.
///
/// Holds only shared collaborators and immutable configuration; all per-call
/// state is created inside each operation.
#[derive(Clone)]
pub struct ProfileHandler {
    collaborators: Collaborators,
    propagator: Propagator,
}

impl ProfileHandler {
    /// Composes a handler.
    pub fn new(collaborators: Collaborators, propagator: Propagator) -> Self {
        Self {
            collaborators,
            propagator,
        }
    }

    /// Returns the acting user's profile.
    pub async fn get_profile(
        &self,
        call: &InboundCall,
        req: GetProfileRequest,
    ) -> Result<ProfileView, Status> {
        self.run(call, "get_profile", OperationKind::Query, |ctx| async move {
            let user_id = resolve_acting_user(req.user_id.as_deref(), ctx.metadata())?;
            let profile = self
                .collaborators
                .profile_reader
                .get_profile(&ctx, user_id)
                .await?;
            let etag = etag_for(profile.version);
            Ok(ProfileView { profile, etag })
        })
        .await
    }

    /// Applies a masked, optionally conditional profile update.
    pub async fn update_profile(
        &self,
        call: &InboundCall,
        req: UpdateProfileRequest,
    ) -> Result<ProfileView, Status> {
        self.run(call, "update_profile", OperationKind::Command, |ctx| async move {
            let metadata = ctx.metadata();
            let user_id = resolve_acting_user(req.user_id.as_deref(), metadata)?;
            let mask = UpdateMask::from_paths(&req.update_mask, &PROFILE_MASK_PATHS)?;
            let precondition = ConditionalWrite::from_request(req.expected_version, metadata)?;

            let update = ProfileUpdate {
                user_id,
                display_name: mask.select("display_name", req.display_name),
                avatar_url: mask.select("avatar_url", req.avatar_url),
                bio: mask.select("bio", req.bio),
                precondition,
                idempotency_key: idempotency_key(&ctx),
            };

            let profile =
                mediate(self.collaborators.profile_writer.update_profile(&ctx, update)).await?;
            ctx.log().info(format_args!(
                "profile {} updated to version {}",
                profile.user_id, profile.version
            ));
            let etag = etag_for(profile.version);
            Ok(ProfileView { profile, etag })
        })
        .await
    }

    /// Profile deletion is not offered through this surface.
    pub async fn delete_profile(
        &self,
        call: &InboundCall,
        _req: DeleteProfileRequest,
    ) -> Result<(), Status> {
        self.run(call, "delete_profile", OperationKind::Command, |_ctx| async {
            Err(Status::unimplemented("delete_profile is not supported"))
        })
        .await
    }

    /// Records an engagement.
    pub async fn add_engagement(
        &self,
        call: &InboundCall,
        req: EngagementRequest,
    ) -> Result<EngagementResponse, Status> {
        self.run(call, "add_engagement", OperationKind::Command, |ctx| async move {
            let write = engagement_write(&ctx, &req)?;
            let engagement =
                mediate(self.collaborators.engagements.add_engagement(&ctx, write)).await?;
            Ok(EngagementResponse { engagement })
        })
        .await
    }

    /// Removes an engagement.
    pub async fn remove_engagement(
        &self,
        call: &InboundCall,
        req: EngagementRequest,
    ) -> Result<(), Status> {
        self.run(call, "remove_engagement", OperationKind::Command, |ctx| async move {
            let write = engagement_write(&ctx, &req)?;
            mediate(self.collaborators.engagements.remove_engagement(&ctx, write)).await
        })
        .await
    }

    /// Lists favorites joined with video projections and stats.
    pub async fn list_favorites(
        &self,
        call: &InboundCall,
        req: ListFavoritesRequest,
    ) -> Result<ListFavoritesResponse, Status> {
        self.run(call, "list_favorites", OperationKind::Query, |ctx| async move {
            let user_id = resolve_acting_user(req.user_id.as_deref(), ctx.metadata())?;
            let cursor = PageCursor::from_request(req.page_size, &req.page_token)?;

            let rows = self
                .collaborators
                .engagements
                .list_engagements(
                    &ctx,
                    user_id,
                    EngagementKind::Favorite,
                    cursor.offset(),
                    cursor.fetch_limit(),
                )
                .await?;
            let page = cursor.paginate(rows)?;

            let key = AggregationKey::from_refs(page.items.iter().map(|e| e.video_id));
            let (videos, stats) = tokio::try_join!(
                self.projections_for(&ctx, &key),
                self.stats_for(&ctx, &key)
            )?;

            let items = page
                .items
                .into_iter()
                .map(|engagement| FavoriteItem {
                    video: videos.attach(engagement.video_id),
                    stats: stats.attach(engagement.video_id),
                    engagement,
                })
                .collect();

            Ok(ListFavoritesResponse {
                items,
                next_page_token: page.next_page_token,
            })
        })
        .await
    }

    /// Lists watch history joined with video projections.
    pub async fn list_watch_history(
        &self,
        call: &InboundCall,
        req: ListWatchHistoryRequest,
    ) -> Result<ListWatchHistoryResponse, Status> {
        self.run(call, "list_watch_history", OperationKind::Query, |ctx| async move {
            let user_id = resolve_acting_user(req.user_id.as_deref(), ctx.metadata())?;
            let cursor = PageCursor::from_request(req.page_size, &req.page_token)?;

            let rows = self
                .collaborators
                .watch_history
                .list_watch_history(&ctx, user_id, cursor.offset(), cursor.fetch_limit())
                .await?;
            let page = cursor.paginate(rows)?;

            let key = AggregationKey::from_refs(page.items.iter().map(|e| e.video_id));
            let videos = self.projections_for(&ctx, &key).await?;

            let items = page
                .items
                .into_iter()
                .map(|entry| WatchHistoryItem {
                    video: videos.attach(entry.video_id),
                    entry,
                })
                .collect();

            Ok(ListWatchHistoryResponse {
                items,
                next_page_token: page.next_page_token,
            })
        })
        .await
    }

    /// Reports favorite state (and optionally stats) for a set of videos.
    pub async fn batch_get_favorites(
        &self,
        call: &InboundCall,
        req: BatchGetFavoritesRequest,
    ) -> Result<BatchGetFavoritesResponse, Status> {
        self.run(call, "batch_get_favorites", OperationKind::Query, |ctx| async move {
            let user_id = resolve_acting_user(req.user_id.as_deref(), ctx.metadata())?;
            let ordered = distinct_ids(&req.video_ids)?;
            let key = AggregationKey::from_refs(ordered.iter().copied());

            let engagements = &self.collaborators.engagements;
            let ctx_ref = &ctx;
            let favorites = bulk_lookup("favorites", &key, |ids| async move {
                engagements.favorited_among(ctx_ref, user_id, &ids).await
            });
            let stats = async {
                if req.include_stats {
                    self.stats_for(&ctx, &key).await.map(Some)
                } else {
                    Ok(None)
                }
            };
            let (favorites, stats): (LookupTable<Uuid>, Option<LookupTable<VideoStats>>) =
                tokio::try_join!(favorites, stats)?;

            let states = ordered
                .into_iter()
                .map(|video_id| FavoriteState {
                    video_id,
                    favorited: favorites.contains(&video_id),
                    stats: stats.as_ref().map(|table| table.attach(video_id)),
                })
                .collect();

            Ok(BatchGetFavoritesResponse { states })
        })
        .await
    }

    async fn projections_for(
        &self,
        ctx: &CallContext,
        key: &AggregationKey,
    ) -> Result<LookupTable<VideoProjection>, Status> {
        let projections = &self.collaborators.projections;
        bulk_lookup("projection", key, |ids| async move {
            projections.batch_projections(ctx, &ids).await
        })
        .await
    }

    async fn stats_for(
        &self,
        ctx: &CallContext,
        key: &AggregationKey,
    ) -> Result<LookupTable<VideoStats>, Status> {
        let stats = &self.collaborators.stats;
        bulk_lookup("stats", key, |ids| async move { stats.batch_stats(ctx, &ids).await }).await
    }

    /// Runs one operation inside its span under the propagated context.
    async fn run<T, F, Fut>(
        &self,
        call: &InboundCall,
        operation: &'static str,
        kind: OperationKind,
        op: F,
    ) -> Result<T, Status>
    where
        F: FnOnce(CallContext) -> Fut,
        Fut: Future<Output = Result<T, Status>>,
    {
        let span = tracing::info_span!(
            "rpc",
            request_id = %call.context.request_id(),
            operation,
            kind = kind.as_str(),
        );

        let result = self
            .propagator
            .call(&call.context, &call.metadata, kind, op)
            .instrument(span.clone())
            .await;

        if let Err(status) = &result {
            span.in_scope(|| call.context.log().debug(format_args!("call failed: {status}")));
        }
        result
    }
}

fn idempotency_key(ctx: &CallContext) -> Option<String> {
    ctx.metadata()
        .and_then(|m| m.idempotency_key())
        .map(str::to_owned)
}

fn engagement_write(ctx: &CallContext, req: &EngagementRequest) -> Result<EngagementWrite, Status> {
    Ok(EngagementWrite {
        user_id: resolve_acting_user(req.user_id.as_deref(), ctx.metadata())?,
        video_id: parse_id("video_id", &req.video_id)?,
        kind: req.kind.parse()?,
        idempotency_key: idempotency_key(ctx),
    })
}

/// Parses video ids, collapsing duplicates while keeping first-seen order.
fn distinct_ids(raw: &[String]) -> Result<Vec<Uuid>, Status> {
    let mut seen = HashSet::new();
    let mut ordered = Vec::new();
    for value in raw {
        let id = parse_id("video_ids", value)?;
        if seen.insert(id) {
            ordered.push(id);
        }
    }
    if ordered.len() > MAX_BATCH_IDS {
        return Err(Status::invalid_argument(format!(
            "video_ids accepts at most {MAX_BATCH_IDS} distinct ids"
        )));
    }
    Ok(ordered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Code;

    #[test]
    fn distinct_ids_keeps_first_seen_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let raw = vec![b.to_string(), a.to_string(), b.to_string()];
        assert_eq!(distinct_ids(&raw).unwrap(), vec![b, a]);
    }

    #[test]
    fn distinct_ids_rejects_malformed_entries() {
        let raw = vec![Uuid::new_v4().to_string(), "nope".to_string()];
        assert_eq!(distinct_ids(&raw).unwrap_err().code, Code::InvalidArgument);
    }

    #[test]
    fn distinct_ids_caps_batch_size() {
        let raw: Vec<String> = (0..=MAX_BATCH_IDS).map(|_| Uuid::new_v4().to_string()).collect();
        assert_eq!(distinct_ids(&raw).unwrap_err().code, Code::InvalidArgument);
    }
}

//! Fan-out aggregation over secondary read models.
//!
//! A listing reads a primary page (engagements, watch-log entries), collects
//! the distinct entity ids it references into an [`AggregationKey`], issues
//! one bulk lookup per secondary source with the whole key, and joins the
//! results back by id.
//!
//! A secondary source answering "not found" for the batch contributes no
//! data. Any other secondary failure fails the whole request; partially
//! enriched pages are never returned.

use std::collections::{BTreeSet, HashMap};
use std::future::Future;

use uuid::Uuid;

use crate::error::Status;
use crate::model::{VideoProjection, VideoStats};
use crate::service::{ServiceError, ServiceErrorKind};

/// A record addressable by entity id.
pub trait Keyed {
    /// The id this record is joined on.
    fn key(&self) -> Uuid;
}

/// A secondary record with a well-defined empty rendering.
pub trait Attachment: Keyed + Clone {
    /// The value rendered when the source has no record for `key`.
    fn empty(key: Uuid) -> Self;
}

impl Keyed for Uuid {
    fn key(&self) -> Uuid {
        *self
    }
}

impl Keyed for VideoProjection {
    fn key(&self) -> Uuid {
        self.video_id
    }
}

impl Attachment for VideoProjection {
    fn empty(key: Uuid) -> Self {
        VideoProjection::empty(key)
    }
}

impl Keyed for VideoStats {
    fn key(&self) -> Uuid {
        self.video_id
    }
}

impl Attachment for VideoStats {
    fn empty(key: Uuid) -> Self {
        VideoStats::zero(key)
    }
}

/// Distinct entity ids referenced by one primary page.
///
/// Built fresh for every request; order-independent.
///
/// # Examples
///
/// ```
/// use catalog_boundary::AggregationKey;
/// use uuid::Uuid;
///
/// let a = Uuid::new_v4();
/// let b = Uuid::new_v4();
/// let key = AggregationKey::from_refs([a, b, a]);
/// assert_eq!(key.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregationKey {
    ids: BTreeSet<Uuid>,
}

impl AggregationKey {
    /// Collects ids, collapsing duplicates.
    pub fn from_refs<I: IntoIterator<Item = Uuid>>(refs: I) -> Self {
        Self {
            ids: refs.into_iter().collect(),
        }
    }

    /// Number of distinct ids.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the primary page referenced nothing.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Whether `id` is part of the key.
    pub fn contains(&self, id: &Uuid) -> bool {
        self.ids.contains(id)
    }

    /// The ids in ascending order, for a bulk request.
    pub fn to_vec(&self) -> Vec<Uuid> {
        self.ids.iter().copied().collect()
    }
}

/// Secondary records indexed by id.
#[derive(Debug, Clone)]
pub struct LookupTable<V> {
    rows: HashMap<Uuid, V>,
}

impl<V> LookupTable<V> {
    /// A table with no rows.
    pub fn empty() -> Self {
        Self {
            rows: HashMap::new(),
        }
    }

    /// Returns the row for `id`, if the source had one.
    pub fn get(&self, id: &Uuid) -> Option<&V> {
        self.rows.get(id)
    }

    /// Whether the source had a row for `id`.
    pub fn contains(&self, id: &Uuid) -> bool {
        self.rows.contains_key(id)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the source returned nothing.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<V: Keyed> FromIterator<V> for LookupTable<V> {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().map(|row| (row.key(), row)).collect(),
        }
    }
}

impl<V: Attachment> LookupTable<V> {
    /// Returns the attachment for `id`, or its empty rendering.
    pub fn attach(&self, id: Uuid) -> V {
        self.rows.get(&id).cloned().unwrap_or_else(|| V::empty(id))
    }
}

/// Performs one bulk lookup against a secondary source.
///
/// `fetch` receives every id in `key` at once and is not called at all when
/// the key is empty. `source` names the read model in logs and errors.
pub async fn bulk_lookup<V, F, Fut>(
    source: &'static str,
    key: &AggregationKey,
    fetch: F,
) -> Result<LookupTable<V>, Status>
where
    V: Keyed,
    F: FnOnce(Vec<Uuid>) -> Fut,
    Fut: Future<Output = Result<Vec<V>, ServiceError>>,
{
    if key.is_empty() {
        return Ok(LookupTable::empty());
    }

    match fetch(key.to_vec()).await {
        Ok(rows) => Ok(rows.into_iter().collect()),
        Err(err) => match err.kind {
            ServiceErrorKind::NotFound => {
                tracing::debug!(source, ids = key.len(), "secondary source has no data for batch");
                Ok(LookupTable::empty())
            }
            ServiceErrorKind::VersionConflict
            | ServiceErrorKind::UnsupportedInput
            | ServiceErrorKind::Internal => {
                tracing::error!(source, kind = %err.kind, detail = %err.message, "secondary lookup failed");
                Err(Status::internal(format!("{source} lookup failed")))
            }
        },
    }
}

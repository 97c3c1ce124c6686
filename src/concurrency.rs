//! Optimistic-concurrency preconditions and update masks.
//!
//! Write requests may carry an expected version, either as a payload field or
//! as an `If-Match` ETag. [`ConditionalWrite`] is the resolved precondition
//! handed to the collaborator; the collaborator rejects a mismatching write
//! with a version-conflict error, which the translator in [`crate::error`]
//! surfaces as `Aborted`.

use std::collections::BTreeSet;
use std::future::Future;

use crate::error::Status;
use crate::metadata::RequestMetadata;
use crate::service::ServiceError;

/// Optional expected-version precondition of one write.
///
/// # Examples
///
/// ```
/// use catalog_boundary::ConditionalWrite;
///
/// let write = ConditionalWrite::expecting(5);
/// assert!(write.check(5).is_ok());
/// assert!(write.check(7).is_err());
/// assert!(ConditionalWrite::unconditional().check(7).is_ok());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConditionalWrite {
    expected_version: Option<i64>,
}

impl ConditionalWrite {
    /// A write with no precondition.
    pub fn unconditional() -> Self {
        Self::default()
    }

    /// A write accepted only when the stored version equals `version`.
    pub fn expecting(version: i64) -> Self {
        Self {
            expected_version: Some(version),
        }
    }

    /// Resolves the precondition of a write request.
    ///
    /// The payload's `expected_version` takes precedence; otherwise the
    /// `If-Match` header from `metadata` is parsed as an ETag.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a negative version or a malformed `If-Match`.
    pub fn from_request(
        expected_version: Option<i64>,
        metadata: Option<&RequestMetadata>,
    ) -> Result<Self, Status> {
        if let Some(version) = expected_version {
            if version < 0 {
                return Err(Status::invalid_argument("expected_version must be >= 0"));
            }
            return Ok(Self::expecting(version));
        }

        match metadata.and_then(RequestMetadata::if_match) {
            Some(etag) => Ok(Self {
                expected_version: parse_etag(etag)?,
            }),
            None => Ok(Self::unconditional()),
        }
    }

    /// Returns the expected version, if any.
    pub fn expected_version(&self) -> Option<i64> {
        self.expected_version
    }

    /// Whether the write carries no precondition.
    pub fn is_unconditional(&self) -> bool {
        self.expected_version.is_none()
    }

    /// Checks the precondition against the currently stored version.
    ///
    /// Collaborators call this at write time, under their own consistency
    /// discipline.
    pub fn check(&self, current_version: i64) -> Result<(), ServiceError> {
        match self.expected_version {
            Some(expected) if expected != current_version => {
                Err(ServiceError::version_conflict(expected, current_version))
            }
            _ => Ok(()),
        }
    }
}

/// Parses an `If-Match` value into an expected version.
///
/// Accepts `"<n>"`, `W/"<n>"` and bare `<n>`. `*` matches any version and
/// yields `None`.
pub fn parse_etag(raw: &str) -> Result<Option<i64>, Status> {
    let raw = raw.trim();
    if raw == "*" {
        return Ok(None);
    }

    let unweak = raw.strip_prefix("W/").unwrap_or(raw);
    let unquoted = unweak
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(unweak);

    if unquoted.is_empty() || !unquoted.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Status::invalid_argument(format!("malformed If-Match: {raw:?}")));
    }

    unquoted
        .parse::<i64>()
        .map(Some)
        .map_err(|_| Status::invalid_argument(format!("malformed If-Match: {raw:?}")))
}

/// Renders a version as a strong ETag.
pub fn etag_for(version: i64) -> String {
    format!("\"{version}\"")
}

/// Awaits a conditional write and classifies its failure.
///
/// Not-found stays `NotFound`, a version conflict becomes `Aborted`, and
/// every other collaborator failure is translated by the same closed mapping
/// as the rest of the boundary. The write is never retried here.
pub async fn mediate<T, Fut>(write: Fut) -> Result<T, Status>
where
    Fut: Future<Output = Result<T, ServiceError>>,
{
    write.await.map_err(Status::from)
}

/// The set of field paths a partial update may touch.
///
/// An empty mask means full-update semantics: every provided field applies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateMask {
    paths: BTreeSet<String>,
}

impl UpdateMask {
    /// Builds a mask, rejecting paths outside `allowed`.
    ///
    /// # Examples
    ///
    /// ```
    /// use catalog_boundary::UpdateMask;
    ///
    /// let mask = UpdateMask::from_paths(["display_name"], &["display_name", "bio"]).unwrap();
    /// assert!(mask.applies("display_name"));
    /// assert!(!mask.applies("bio"));
    /// assert!(UpdateMask::from_paths(["owner"], &["bio"]).is_err());
    /// ```
    pub fn from_paths<I, S>(paths: I, allowed: &[&str]) -> Result<Self, Status>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = BTreeSet::new();
        for path in paths {
            let path = path.as_ref().trim();
            if path.is_empty() {
                continue;
            }
            if !allowed.contains(&path) {
                return Err(Status::invalid_argument(format!(
                    "unsupported update_mask path: {path}"
                )));
            }
            set.insert(path.to_owned());
        }
        Ok(Self { paths: set })
    }

    /// Whether the mask is empty (full update).
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Whether `field` may be written.
    pub fn applies(&self, field: &str) -> bool {
        self.paths.is_empty() || self.paths.contains(field)
    }

    /// Keeps `value` only when `field` is in scope.
    pub fn select<T>(&self, field: &str, value: Option<T>) -> Option<T> {
        if self.applies(field) {
            value
        } else {
            None
        }
    }
}

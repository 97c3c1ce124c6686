//! Acting-user resolution.
//!
//! Profile-scoped operations accept identity from two places. The request
//! payload wins when it names a user; otherwise the caller resolved from the
//! identity header is used. Whichever source supplies the value, it must be a
//! well-formed UUID.

use uuid::Uuid;

use crate::error::Status;
use crate::metadata::RequestMetadata;

/// Parses a client-supplied identifier.
///
/// `field` names the offending input in the error message.
///
/// # Examples
///
/// ```
/// use catalog_boundary::identity::parse_id;
///
/// assert!(parse_id("video_id", "67e55044-10b1-426f-9247-bb680e5fe0c8").is_ok());
/// assert!(parse_id("video_id", "not-a-uuid").is_err());
/// ```
pub fn parse_id(field: &str, raw: &str) -> Result<Uuid, Status> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| Status::invalid_argument(format!("{field} must be a valid UUID")))
}

/// Resolves the acting user.
///
/// Precedence: non-blank payload `user_id`, then the caller id from
/// `metadata`, else `InvalidArgument`.
pub fn resolve_acting_user(
    payload_user_id: Option<&str>,
    metadata: Option<&RequestMetadata>,
) -> Result<Uuid, Status> {
    if let Some(raw) = payload_user_id.filter(|raw| !raw.trim().is_empty()) {
        return parse_id("user_id", raw);
    }

    match metadata {
        Some(meta) => match meta.caller_id() {
            Some(caller) => parse_id("caller identity", caller),
            None if meta.identity_invalid() => Err(Status::invalid_argument(
                "identity required: supplied identity token is unusable",
            )),
            None => Err(Status::invalid_argument("identity required")),
        },
        None => Err(Status::invalid_argument("identity required")),
    }
}

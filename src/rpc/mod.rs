//! RPC surface of the profile/engagement service.
//!
//! This module is transport-neutral. A transport integration:
//! 1. Collects the call's headers into [`Headers`] (or implements
//!    [`ExtractMetadata`] for its own request type)
//! 2. Calls [`extract_call`] once to get an [`InboundCall`], optionally
//!    bounding it by a transport deadline
//! 3. Deserializes the payload into one of the [`messages`] request types
//! 4. Invokes the matching [`ProfileHandler`] operation and maps the returned
//!    [`Status`](crate::Status) onto its own status codes
//!
//! # Example Flow
//!
//! ```ignore
//! let call = extract_call(&headers);
//! let req: ListFavoritesRequest = serde_json::from_slice(&body)?;
//! let page = handler.list_favorites(&call, req).await?;
//! ```

mod extract;
mod handler;
pub(crate) mod headers;
pub mod messages;

pub use extract::{extract_call, ExtractMetadata, InboundCall};
pub use handler::{Collaborators, ProfileHandler, MAX_BATCH_IDS, PROFILE_MASK_PATHS};
pub use headers::{
    Headers, IDEMPOTENCY_KEY_HEADER, IDENTITY_HEADER, IF_MATCH_HEADER, IF_NONE_MATCH_HEADER,
    REQUEST_ID_HEADER,
};
pub use messages::*;

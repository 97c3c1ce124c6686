//! Request boundary for a video-catalog profile and engagement service.
//!
//! This crate sits between a transport and the collaborator services that own
//! profiles, engagements, watch history, stats and video metadata. It turns
//! loosely-typed inbound calls into validated, deadline-bounded collaborator
//! calls:
//! - **Metadata**: headers are resolved once into an immutable
//!   [`RequestMetadata`], including the caller decoded from an identity token
//! - **Context**: a [`CallContext`] carries request id, metadata and deadline
//!   through every collaborator call; [`Propagator`] applies per-kind timeouts
//! - **Identity**: payload user id wins over the caller from metadata
//! - **Concurrency**: [`ConditionalWrite`] and [`UpdateMask`] express
//!   preconditions and partial updates; conflicts surface as `Aborted`
//! - **Pagination**: opaque offset tokens with one-row over-fetch
//! - **Fan-out**: one bulk lookup per secondary source, joined by id
//!
//! Collaborator failures are a closed set ([`ServiceErrorKind`]) translated
//! exhaustively into outbound [`Status`] codes.
//!
//! # Core Types
//!
//! - [`rpc::ProfileHandler`]: The operations, composed from collaborator traits
//! - [`CallContext`]: Explicit per-call context
//! - [`Status`]: Outbound result code and message
//! - [`Secret<T>`]: Wrapper that redacts sensitive values in logs/output
//!
//! # Examples
//!
//! ```
//! use catalog_boundary::rpc::{extract_call, Headers};
//! use catalog_boundary::{OperationKind, Propagator, Status};
//!
//! # tokio_test_block(async {
//! let headers: Headers = [("x-request-id", "req-123"), ("idempotency-key", "k-1")]
//!     .into_iter()
//!     .collect();
//! let call = extract_call(&headers);
//!
//! let propagator = Propagator::default();
//! let key = propagator
//!     .call(&call.context, &call.metadata, OperationKind::Command, |ctx| async move {
//!         Ok::<_, Status>(ctx.metadata().and_then(|m| m.idempotency_key()).map(str::to_owned))
//!     })
//!     .await
//!     .unwrap();
//! assert_eq!(key.as_deref(), Some("k-1"));
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(f)
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod concurrency;
pub mod config;
pub mod context;
pub mod error;
pub mod fanout;
pub mod identity;
pub mod logging;
pub mod metadata;
pub mod model;
pub mod pagination;
pub mod rpc;
mod secret;
pub mod service;

pub use concurrency::{ConditionalWrite, UpdateMask};
pub use config::{BoundaryConfig, ConfigError, ConfigErrorKind};
pub use context::{CallContext, OperationKind, Propagator, TimeoutPolicy};
pub use error::{Code, Status};
pub use fanout::{AggregationKey, LookupTable};
pub use logging::CallLog;
pub use metadata::RequestMetadata;
pub use model::{
    Engagement, EngagementKind, Profile, VideoProjection, VideoStats, WatchLogEntry,
};
pub use pagination::{Page, PageCursor};
pub use secret::Secret;
pub use service::{ServiceError, ServiceErrorKind};

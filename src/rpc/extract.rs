//! Extraction boundary between transport requests and call contexts.

use std::sync::Arc;

use tokio::time::Instant;

use crate::context::CallContext;
use crate::metadata::RequestMetadata;

use super::headers::{Headers, REQUEST_ID_HEADER};

/// Extracts request metadata from a transport-specific request.
///
/// Transport integrations implement this for their own request type. The
/// trait only maps headers to values; it never rejects a call.
///
/// # Examples
///
/// ```
/// use catalog_boundary::rpc::{ExtractMetadata, Headers};
/// use catalog_boundary::RequestMetadata;
///
/// struct MyRequest {
///     headers: Headers,
/// }
///
/// impl ExtractMetadata for MyRequest {
///     fn extract_metadata(&self) -> RequestMetadata {
///         self.headers.extract_metadata()
///     }
///
///     fn request_id(&self) -> Option<String> {
///         self.headers.request_id()
///     }
/// }
/// ```
pub trait ExtractMetadata {
    /// Resolves the request-scoped metadata.
    fn extract_metadata(&self) -> RequestMetadata;

    /// Returns the client-supplied correlation id, if any.
    fn request_id(&self) -> Option<String>;
}

impl ExtractMetadata for Headers {
    fn extract_metadata(&self) -> RequestMetadata {
        RequestMetadata::resolve(self)
    }

    fn request_id(&self) -> Option<String> {
        self.get_trimmed(REQUEST_ID_HEADER).map(str::to_owned)
    }
}

/// The resolved parts of one inbound call.
///
/// Metadata resolution happens exactly once, here; handlers pass both parts
/// to the [`Propagator`](crate::Propagator) before any collaborator runs.
#[derive(Debug, Clone)]
pub struct InboundCall {
    /// Root context: request id and any inherited deadline
    pub context: CallContext,
    /// Metadata resolved from the call's headers
    pub metadata: Arc<RequestMetadata>,
}

impl InboundCall {
    /// Bounds the call by a deadline imposed by the transport.
    pub fn with_deadline(self, deadline: Instant) -> Self {
        Self {
            context: self.context.with_deadline(deadline),
            metadata: self.metadata,
        }
    }
}

/// Builds an [`InboundCall`] from a transport request.
///
/// The request id is the client's `x-request-id` when present, otherwise a
/// fresh UUID.
///
/// # Examples
///
/// ```
/// use catalog_boundary::rpc::{extract_call, Headers};
///
/// let headers: Headers = [("x-request-id", "req-7")].into_iter().collect();
/// let call = extract_call(&headers);
/// assert_eq!(call.context.request_id(), "req-7");
/// ```
pub fn extract_call<R: ExtractMetadata + ?Sized>(request: &R) -> InboundCall {
    let context = match request.request_id() {
        Some(id) => CallContext::new(id),
        None => CallContext::generated(),
    };

    InboundCall {
        context,
        metadata: Arc::new(request.extract_metadata()),
    }
}

//! Outbound status taxonomy and the collaborator-error translator.
//!
//! Every failure that leaves this layer is a [`Status`] carrying one of a
//! small, stable set of [`Code`]s. Collaborator failures arrive as
//! [`ServiceError`] values and are translated exactly once, at the boundary,
//! by the exhaustive match in `From<ServiceError> for Status`.

use std::fmt;

use crate::service::{ServiceError, ServiceErrorKind};

/// An externally visible outcome of a failed call.
///
/// # Examples
///
/// ```
/// use catalog_boundary::{Code, Status};
///
/// let status = Status::invalid_argument("invalid page_token");
/// assert_eq!(status.code, Code::InvalidArgument);
/// assert_eq!(status.to_string(), "InvalidArgument: invalid page_token");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    /// The stable outcome class
    pub code: Code,
    /// Human-readable message; never contains collaborator internals
    pub message: String,
}

impl Status {
    /// Creates a status with an explicit code.
    pub fn new(code: Code, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Malformed identifier, page token, enum value, or missing identity.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(Code::InvalidArgument, message)
    }

    /// The addressed entity does not exist.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(Code::NotFound, message)
    }

    /// A conditional write lost against a concurrent writer.
    pub fn aborted(message: impl Into<String>) -> Self {
        Self::new(Code::Aborted, message)
    }

    /// Any failure not matching a known kind.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(Code::Internal, message)
    }

    /// The operation is intentionally not supported.
    pub fn unimplemented(message: impl Into<String>) -> Self {
        Self::new(Code::Unimplemented, message)
    }

    /// The call deadline elapsed before the collaborator answered.
    pub fn deadline_exceeded(message: impl Into<String>) -> Self {
        Self::new(Code::DeadlineExceeded, message)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for Status {}

/// Outbound status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Code {
    /// Client input could not be parsed or is missing
    InvalidArgument,
    /// Entity absent
    NotFound,
    /// Version conflict; re-read and retry
    Aborted,
    /// Collaborator or internal failure
    Internal,
    /// Operation not supported yet
    Unimplemented,
    /// Call deadline elapsed
    DeadlineExceeded,
}

impl Code {
    /// Returns the wire name of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Code::InvalidArgument => "InvalidArgument",
            Code::NotFound => "NotFound",
            Code::Aborted => "Aborted",
            Code::Internal => "Internal",
            Code::Unimplemented => "Unimplemented",
            Code::DeadlineExceeded => "DeadlineExceeded",
        }
    }

    /// Whether a caller may retry after re-reading state.
    ///
    /// This layer never retries on its own.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Code::Aborted | Code::DeadlineExceeded)
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ServiceError> for Status {
    fn from(err: ServiceError) -> Self {
        match err.kind {
            ServiceErrorKind::NotFound => Status::not_found(err.message),
            ServiceErrorKind::VersionConflict => {
                tracing::warn!(detail = %err.message, "conditional write rejected");
                Status::aborted("version conflict: re-read the resource and retry")
            }
            ServiceErrorKind::UnsupportedInput => Status::invalid_argument(err.message),
            ServiceErrorKind::Internal => {
                tracing::error!(detail = %err.message, "collaborator failure");
                Status::internal("internal error")
            }
        }
    }
}

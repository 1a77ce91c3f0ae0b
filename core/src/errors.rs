//! Unified error types for the tether core crate.
//!
//! Boundary failures are never swallowed: a [`RemoteError`] produced by a
//! [`RemoteClient`](crate::remote::RemoteClient) implementation surfaces to
//! the caller unchanged through [`SyncError::Remote`]. Retry and backoff, if
//! any, belong to the boundary implementation, not to this crate.

use thiserror::Error;

/// Errors returned by syncable entities and the monitor controller.
#[derive(Error, Debug)]
pub enum SyncError {
    /// A required argument was missing or malformed.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The operation requires a live remote backing that is absent.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The operation is not valid for this kind of entity
    /// (e.g. a byte-stream write to a directory).
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// The entity is required to exist but does not.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// An error surfaced unchanged from the remote client boundary.
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Errors produced by remote client boundary implementations.
///
/// Opaque to this crate beyond the variant split; transport details
/// (HTTP status codes, connection state) stay inside the boundary.
#[derive(Error, Debug)]
pub enum RemoteError {
    /// The remote path or handle no longer resolves to anything.
    #[error("Remote path not found: {0}")]
    NotFound(String),

    /// The remote server rejected the operation.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// A remote operation failed (protocol error, server failure, etc.).
    #[error("Remote operation failed: {0}")]
    OperationFailed(String),

    /// A low-level I/O error while talking to the remote server.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

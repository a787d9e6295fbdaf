//! Contains the error type reported by the server surface.

use thiserror::Error;

/// The error returned when a [`Server`](crate::Server) cannot be built
/// or started.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The control listener could not be bound.
    #[error("failed to bind control listener: {0}")]
    Bind(#[source] std::io::Error),
    /// The storage back-end could not be opened.
    #[error("failed to open storage back-end: {0}")]
    Storage(#[source] std::io::Error),
    /// No authenticator was configured on the builder.
    #[error("no authenticator configured, supply credentials")]
    NoCredentials,
}

//! Error types for session operations.

use thiserror::Error;

/// Result type alias using the session [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by a [`Session`](crate::Session).
///
/// Partial writes are not errors: they are queued and drained later.
/// Only a closing session and genuine transport failures end up here.
#[derive(Debug, Error)]
pub enum Error {
    /// The session is closing or closed and no longer accepts writes.
    #[error("connection closed")]
    Closed,

    /// The underlying transport reported an I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

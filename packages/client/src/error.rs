//! Client error types.

use thiserror::Error;

/// Errors that end or prevent a client session.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The stream or a request/response call failed.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The server refused a request (e.g. invalid message).
    #[error("Server rejected the request: {0}")]
    Rejected(String),
}

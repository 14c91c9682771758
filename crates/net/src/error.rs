//! Network error types

use std::io;

/// Network result type
pub type Result<T> = std::result::Result<T, Error>;

/// Network errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Server full")]
    ServerFull,

    #[error("Store error: {0}")]
    Store(#[from] lobby_core::Error),
}

/// The feed treats every transport failure alike
impl From<Error> for lobby_core::Error {
    fn from(e: Error) -> Self {
        lobby_core::Error::Backend(e.to_string())
    }
}

//! Error types for Mailbridge
//!
//! These cover the serving loop only. Failures of an individual send are a
//! tool *result*, not an error, and live in [`crate::mailer::SendFailure`].

use thiserror::Error;

/// Result type alias for Mailbridge operations
pub type Result<T> = std::result::Result<T, ServerError>;

/// Main error type for the Mailbridge server
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

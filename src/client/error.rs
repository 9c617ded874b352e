//! Error types for the relay client

use thiserror::Error;

/// Client errors
#[derive(Error, Debug)]
pub enum ClientError {
    /// Nothing answered at the relay address
    #[error("The server at {0} does not appear to be up!")]
    ServerDown(String),

    /// The relay is up but could not reach TensorBoard
    #[error("Something went wrong ({status}): {message}. TensorBoard may be the problem.")]
    Backend { status: u16, message: String },

    /// Relay rejected a request
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Payload rejected before sending
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

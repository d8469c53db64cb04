//! Error types for the nicovideo client
//!
//! Provides one error enum covering transport failures, the login
//! lifecycle, and the mylist error codes returned by the remote API.

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Error type for all nicovideo operations
///
/// Implements Display for human-readable messages and Serialize
/// so errors can be handed to a JSON frontend as plain strings.
#[derive(Error, Debug)]
pub enum NicovideoError {
    /// HTTP request failed after every retry attempt
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Operation requires a logged-in session
    #[error("not logged in")]
    NotLoggedIn,

    /// Credentials were rejected by the login page
    #[error("login incorrect")]
    LoginFailed,

    /// Video is already registered in the mylist
    #[error("already registered: {0}")]
    AlreadyExists(String),

    /// Mylist reached its registration upper limit
    #[error("registration upper limit: {0}")]
    MylistFull(String),

    /// Entry is not present in the collection or mylist
    #[error("not found: {0}")]
    NotFound(String),

    /// A hidden value could not be scraped from a page
    #[error("token not found: {0}")]
    TokenNotFound(String),

    /// Remote API answered with a shape we do not recognise
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Video has been deleted or is otherwise unavailable
    #[error("video unavailable: {0}")]
    Deleted(String),

    /// Failed to parse a response body
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Invalid video ID provided
    #[error("Invalid video ID: {0}")]
    InvalidId(String),
}

impl Serialize for NicovideoError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Result type alias for nicovideo operations
pub type Result<T> = std::result::Result<T, NicovideoError>;

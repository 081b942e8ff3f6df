//! Error types for ciwalk operations.

use std::io;
use thiserror::Error;

/// The error type for ciwalk operations.
///
/// Only [`Error::Validation`], [`Error::NotFound`] and [`Error::Cancelled`]
/// ever abort a traversal. [`Error::Remote`] failures raised while expanding
/// a node are absorbed by the engine and degrade that node to "no further
/// relationships".
#[derive(Debug, Error)]
pub enum Error {
    /// The request was malformed (e.g. both or neither root selectors given).
    #[error("Invalid request: {0}")]
    Validation(String),

    /// The root configuration item could not be resolved.
    #[error("Configuration item not found: {0}")]
    NotFound(String),

    /// A call to the remote record store failed.
    #[error("Remote query failed on {table}: {message}")]
    Remote {
        /// The table the call was addressed to.
        table: String,
        /// Description of the failure.
        message: String,
    },

    /// The traversal was cancelled before completion.
    #[error("Traversal cancelled")]
    Cancelled,

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Build a [`Error::Remote`] for the given table.
    pub fn remote(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Remote {
            table: table.into(),
            message: message.into(),
        }
    }
}

/// A specialized Result type for ciwalk operations.
pub type Result<T> = std::result::Result<T, Error>;

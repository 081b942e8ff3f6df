//! Error types for the ciwalk MCP server.

use rmcp::ErrorData as McpError;
use thiserror::Error;

/// Errors that can occur in the ciwalk MCP server.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid argument value provided.
    #[error("Invalid {field}: '{value}'. Valid values: {valid_values}")]
    InvalidArgument {
        /// The field name that had an invalid value.
        field: &'static str,
        /// The invalid value that was provided.
        value: String,
        /// Description of valid values.
        valid_values: &'static str,
    },

    /// An error from the traversal engine or its record store.
    #[error(transparent)]
    Traversal(#[from] ciwalk::Error),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// MCP protocol error.
    #[error("MCP error: {0}")]
    Mcp(String),
}

impl Error {
    /// Whether the caller can fix this error by changing the arguments.
    #[must_use]
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument { .. }
                | Self::Traversal(ciwalk::Error::Validation(_) | ciwalk::Error::NotFound(_))
        )
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        if err.is_caller_error() {
            Self::invalid_params(err.to_string(), None)
        } else {
            Self::internal_error(err.to_string(), None)
        }
    }
}

/// Result type for ciwalk MCP operations.
pub type Result<T> = std::result::Result<T, Error>;

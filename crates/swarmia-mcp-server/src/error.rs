//! Error types shared by the client, the dispatcher and the MCP transport.

use thiserror::Error;

/// Failures of a single tool invocation.
///
/// The dispatcher converts every variant into an error `ToolCallResult`,
/// so none of these ever escape a `tools/call` request.
#[derive(Error, Debug)]
pub enum ReportError {
    /// Local argument problem (unknown tool, missing or malformed field).
    /// Never reaches the network.
    #[error("{0}")]
    Validation(String),

    /// The API answered with a non-success status.
    #[error("API request failed with status {status}: {body}")]
    Remote { status: u16, body: String },

    /// The request could not be completed (DNS, connect, TLS, timeout).
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ReportError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether the failure happened before any request was sent.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

pub type ReportResult<T> = std::result::Result<T, ReportError>;

/// Errors of the JSON-RPC layer itself.
#[derive(Error, Debug)]
pub enum McpError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid params: {0}")]
    InvalidParams(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_error_carries_status_and_body() {
        let err = ReportError::Remote {
            status: 500,
            body: "internal error".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "API request failed with status 500: internal error"
        );
        assert!(!err.is_local());
    }

    #[test]
    fn validation_error_is_local() {
        let err = ReportError::validation("Unknown tool: nope");
        assert_eq!(err.to_string(), "Unknown tool: nope");
        assert!(err.is_local());
    }
}

//! The error taxonomy for ChatArbor.
//!
//! One `thiserror` enum per bounded context, folded into a top-level
//! `Error` so the orchestrator boundary can catch everything in one match.

use thiserror::Error;

/// Top-level error for all ChatArbor operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("provider: {0}")]
    Provider(#[from] ProviderError),

    #[error("tool: {0}")]
    Tool(#[from] ToolError),

    #[error("document store: {0}")]
    Store(#[from] StoreError),

    #[error("session: {0}")]
    Session(#[from] SessionError),

    #[error("configuration: {message}")]
    Config { message: String },

    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failures of the chat-completion backend.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("backend returned status {status_code}: {message}")]
    ApiError { status_code: u16, message: String },

    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("authentication rejected: {0}")]
    AuthenticationFailed(String),

    #[error("stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("provider not configured: {0}")]
    NotConfigured(String),

    #[error("network failure: {0}")]
    Network(String),
}

/// Failures of a single tool invocation; always captured per call, never
/// escalated past the execution bridge.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("no tool named '{0}' is registered")]
    NotFound(String),

    #[error("{tool_name} failed: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("bad arguments: {0}")]
    InvalidArguments(String),
}

/// Failures of the knowledge document store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("no document with id '{0}'")]
    NotFound(String),

    #[error("document rejected: {0}")]
    InvalidDocument(String),
}

/// Per-session turn admission failures, raised before any state mutation.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("message must not be empty")]
    EmptyMessage,

    #[error("session {0} is already processing a turn")]
    Busy(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_status_surfaces_in_display() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 429,
            message: "too many requests".into(),
        });
        let text = err.to_string();
        assert!(text.contains("429"));
        assert!(text.contains("too many requests"));
    }

    #[test]
    fn tool_failure_names_the_tool() {
        let err = Error::Tool(ToolError::ExecutionFailed {
            tool_name: "job_search".into(),
            reason: "upstream unreachable".into(),
        });
        assert!(err.to_string().contains("job_search"));
        assert!(err.to_string().contains("upstream unreachable"));
    }

    #[test]
    fn busy_session_names_the_session() {
        let err = Error::Session(SessionError::Busy("sess-42".into()));
        assert!(err.to_string().contains("sess-42"));
    }

    #[test]
    fn serde_errors_convert() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{nope").unwrap_err();
        let err: Error = parse_err.into();
        assert!(matches!(err, Error::Serialization(_)));
    }
}

//! Error types for the digest-search crate.
//!
//! All errors carry stable string messages suitable for the per-source
//! `error` field of a report. Credentials never appear in messages.

/// Errors that can occur while retrieving or assembling results.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DigestError {
    /// The transport failed: connection error, non-success status, or a
    /// transport-level timeout.
    #[error("network error: {0}")]
    Network(String),

    /// A response body could not be parsed (malformed XML/JSON or an
    /// unexpected schema shape).
    #[error("parse error: {0}")]
    Parse(String),

    /// A source task exceeded its per-task deadline.
    #[error("timed out: {0}")]
    Timeout(String),

    /// Invalid pipeline configuration or source descriptor.
    #[error("config error: {0}")]
    Config(String),
}

impl DigestError {
    /// Whether this error is a configuration error, the only kind that is
    /// allowed to abort a pipeline run.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

impl From<serde_json::Error> for DigestError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(format!("invalid JSON: {err}"))
    }
}

/// Convenience type alias for digest-search results.
pub type Result<T> = std::result::Result<T, DigestError>;

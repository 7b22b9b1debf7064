//! Error types for the feed-digest host.

use digest_search::DigestError;

/// Top-level error type for the digest command line.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Invalid or incomplete configuration.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error raised by the retrieval pipeline.
    #[error(transparent)]
    Search(#[from] DigestError),

    /// The report could not be written.
    #[error("output error: {0}")]
    Output(String),
}

impl AppError {
    /// Whether this error comes from configuration rather than I/O.
    pub fn is_config(&self) -> bool {
        match self {
            Self::Config(_) => true,
            Self::Search(err) => err.is_config(),
            Self::Io(_) | Self::Output(_) => false,
        }
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_config_errors_count_as_config() {
        let err = AppError::from(DigestError::Config("no sources configured".into()));
        assert!(err.is_config());
        assert_eq!(err.to_string(), "config error: no sources configured");
    }

    #[test]
    fn io_errors_are_not_config() {
        let err = AppError::from(std::io::Error::other("disk"));
        assert!(!err.is_config());
        assert!(err.to_string().starts_with("I/O error"));
    }
}

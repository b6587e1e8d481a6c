//! Error types for jobfeed

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for jobfeed operations
pub type Result<T> = std::result::Result<T, JobfeedError>;

/// Main error type for jobfeed
///
/// `MalformedPage` and `CorruptState` are recovered where they are detected
/// (zero records, empty state) and never reach a run report.
#[derive(Error, Debug)]
pub enum JobfeedError {
    /// A required setting, usually the API key, is absent or invalid.
    /// Raised before any network call is attempted.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Upstream rejected the credential (HTTP 401/403).
    #[error("Authentication failed on page {page} (HTTP {status}). Check or rotate the API key.")]
    Authentication { page: u32, status: u16 },

    /// Any other network or HTTP failure while fetching a page.
    #[error("Page {page} failed: {message}")]
    Transport { page: u32, message: String },

    #[error("Malformed page: {0}")]
    MalformedPage(String),

    #[error("Persisted state at {} is unreadable: {reason}", path.display())]
    CorruptState { path: PathBuf, reason: String },

    #[error("Raw payload log not found at {}. Fetch pages first.", .0.display())]
    MissingRawLog(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl JobfeedError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a transport error for the given page
    pub fn transport(page: u32, msg: impl Into<String>) -> Self {
        Self::Transport {
            page,
            message: msg.into(),
        }
    }

    /// Page at which fetching failed, if this error came from a fetch.
    pub fn failed_page(&self) -> Option<u32> {
        match self {
            Self::Authentication { page, .. } | Self::Transport { page, .. } => Some(*page),
            _ => None,
        }
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_page() {
        assert_eq!(JobfeedError::transport(3, "boom").failed_page(), Some(3));
        assert_eq!(
            JobfeedError::Authentication {
                page: 1,
                status: 403
            }
            .failed_page(),
            Some(1)
        );
        assert_eq!(JobfeedError::config("missing key").failed_page(), None);
    }

    #[test]
    fn test_messages_name_the_page() {
        let err = JobfeedError::transport(4, "HTTP 500");
        assert_eq!(err.to_string(), "Page 4 failed: HTTP 500");

        let err = JobfeedError::Authentication {
            page: 2,
            status: 401,
        };
        assert!(err.to_string().contains("page 2"));
        assert!(err.is_authentication());
    }
}

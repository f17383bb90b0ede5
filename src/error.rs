//! Error types for deployment operations.
//!
//! Fatal errors abort the calling operation. Best-effort failures (a single
//! runtime dependency, a staging cleanup) are downgraded to
//! [`Warning`](crate::deployer::Warning)s by the callers and never surface here.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for deployment operations
pub type Result<T> = std::result::Result<T, DeployerError>;

/// Main error type for all deployment operations
#[derive(Error, Debug)]
pub enum DeployerError {
    /// No repository yielded the artifact
    #[error("Artifact {coordinate} not found in repositories [{}]", .repositories.join(", "))]
    ArtifactNotFound {
        /// Coordinate that was requested
        coordinate: String,
        /// Every repository that was tried, in priority order
        repositories: Vec<String>,
    },

    /// Coordinate is not in `group:artifact:version` form
    #[error("Invalid artifact name '{name}': expected group:artifact:version")]
    ArtifactFormatInvalid {
        /// Offending name
        name: String,
    },

    /// Extracted config bundle has no configuration root
    #[error("Invalid configuration bundle {config}: {reason}")]
    ConfigurationInvalid {
        /// Config set name
        config: String,
        /// Reason for the error
        reason: String,
    },

    /// Network/RPC failure talking to the coordinator
    #[error("Coordinator unavailable during {operation}: {reason}")]
    CoordinatorUnavailable {
        /// Operation that failed
        operation: String,
        /// Reason for the error
        reason: String,
    },

    /// Coordinator answered but rejected the request
    #[error("Request {operation} failed{}: {reason}", .status.map(|s| format!(" with status {s}")).unwrap_or_default())]
    RequestFailed {
        /// Operation that failed
        operation: String,
        /// HTTP or response-header status, when one was returned
        status: Option<u16>,
        /// Reason for the error
        reason: String,
    },

    /// Collection is not known to the coordinator
    #[error("Collection {collection} not found")]
    CollectionNotFound {
        /// Collection name
        collection: String,
    },

    /// Cluster status for the collection could not be obtained
    #[error("Unable to get current status of collection {collection}: {reason}")]
    StatusUnavailable {
        /// Collection name
        collection: String,
        /// Reason for the error
        reason: String,
    },

    /// Coordinator refused to create the collection
    #[error("Cannot create collection {collection}: {reason}")]
    CollectionCreateFailed {
        /// Collection name
        collection: String,
        /// Reason for the error
        reason: String,
    },

    /// Collection could not be reloaded after a config switch
    #[error("Unable to reload collection {collection}: {reason}")]
    ReloadFailed {
        /// Collection name
        collection: String,
        /// Reason for the error
        reason: String,
    },

    /// Staging directory could not be removed
    #[error("Failed to clean up {}: {reason}", .path.display())]
    CleanupFailed {
        /// Directory that was left behind
        path: PathBuf,
        /// Reason for the error
        reason: String,
    },

    /// Invalid settings or command line input
    #[error("Invalid settings: {reason}")]
    InvalidSettings {
        /// Reason for the error
        reason: String,
    },

    /// Operation was cancelled by the caller
    #[error("Operation cancelled")]
    Cancelled,

    /// A network call exceeded its deadline
    #[error("Timed out during {operation}")]
    Timeout {
        /// Operation that timed out
        operation: String,
    },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// IO errors with the path that caused them
    #[error("IO error while {action} {}: {source}", .path.display())]
    Fs {
        /// What was being done
        action: String,
        /// Path involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Zip archive errors
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Directory traversal errors
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl DeployerError {
    /// Check if this error is recoverable
    ///
    /// Cancellation is never recoverable; everything else may succeed on a
    /// later attempt or against another repository.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            DeployerError::Cancelled
                | DeployerError::ArtifactFormatInvalid { .. }
                | DeployerError::InvalidSettings { .. }
        )
    }

    /// Whether the caller asked for the operation to stop.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DeployerError::Cancelled)
    }

    /// Maps a transport error from reqwest into the coordinator taxonomy.
    pub(crate) fn coordinator(operation: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DeployerError::Timeout {
                operation: operation.to_string(),
            }
        } else {
            DeployerError::CoordinatorUnavailable {
                operation: operation.to_string(),
                reason: err.to_string(),
            }
        }
    }
}

/// Attaches filesystem context to I/O results.
pub trait ErrorExt<T> {
    /// Wraps the error with the action and path that produced it.
    fn fs_context(self, action: &str, path: &Path) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, std::io::Error> {
    fn fs_context(self, action: &str, path: &Path) -> Result<T> {
        self.map_err(|source| DeployerError::Fs {
            action: action.to_string(),
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_not_found_names_every_repository() {
        let err = DeployerError::ArtifactNotFound {
            coordinate: "org.acme:conf:1.0".to_string(),
            repositories: vec!["/srv/m2".to_string(), "https://repo.example/".to_string()],
        };
        let message = err.to_string();
        assert!(message.contains("org.acme:conf:1.0"));
        assert!(message.contains("/srv/m2, https://repo.example/"));
    }

    #[test]
    fn request_failed_includes_status_when_known() {
        let err = DeployerError::RequestFailed {
            operation: "RELOAD".to_string(),
            status: Some(500),
            reason: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "Request RELOAD failed with status 500: boom");
    }

    #[test]
    fn cancellation_is_not_recoverable() {
        assert!(!DeployerError::Cancelled.is_recoverable());
        assert!(
            DeployerError::CollectionNotFound {
                collection: "c".into()
            }
            .is_recoverable()
        );
    }
}

//! Error types for KOUKKU discovery

use std::path::PathBuf;
use thiserror::Error;

// Re-export the probe-level error from koukku-core
pub use koukku_core::SidecarError;

/// Result type alias for manager operations
pub type Result<T> = std::result::Result<T, ManagerError>;

/// Errors surfaced by the discovery engine
///
/// Per-sidecar probe failures never appear here; they are absorbed and
/// retried inside the collection loop. A whole discovery cycle fails in
/// exactly two ways: the socket directory is unusable, or the deadline
/// elapsed before enough sidecars answered.
#[derive(Error, Debug)]
pub enum ManagerError {
    /// Socket directory missing or unreadable
    ///
    /// The directory is provisioned by the surrounding orchestration layer
    /// before discovery starts, so this indicates an external failure and is
    /// never retried.
    #[error("failed to read socket directory {path}: {source}")]
    SocketDir {
        /// The directory that could not be read
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Deadline elapsed before the expected number of sidecars answered
    ///
    /// The registry built so far remains inspectable on the manager, but it
    /// must not be treated as complete.
    #[error("hook sidecar discovery timed out: found {found} of {expected} sidecars")]
    CollectTimeout {
        /// Distinct sidecars successfully probed before the deadline
        found: usize,
        /// The caller's readiness target
        expected: usize,
    },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_timeout_display() {
        let err = ManagerError::CollectTimeout {
            found: 1,
            expected: 3,
        };
        assert_eq!(
            err.to_string(),
            "hook sidecar discovery timed out: found 1 of 3 sidecars"
        );
    }

    #[test]
    fn test_socket_dir_display_includes_path() {
        let err = ManagerError::SocketDir {
            path: PathBuf::from("/nonexistent/sockets"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert!(err.to_string().contains("/nonexistent/sockets"));
    }
}

//! Socket scanner - lists candidate sidecar endpoints
//!
//! Every entry in the socket directory is treated as an addressable
//! endpoint. Non-socket files are tolerated here and rejected at connect
//! time by the probe, which keeps the scanner a plain directory listing.

use crate::error::{ManagerError, Result};
use std::path::{Path, PathBuf};

/// List every entry in the socket directory.
///
/// The directory must already exist; it is provisioned by the orchestration
/// layer before discovery begins, so a read failure is fatal rather than
/// retried.
pub fn scan(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|source| ManagerError::SocketDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut sockets = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ManagerError::SocketDir {
            path: dir.to_path_buf(),
            source,
        })?;
        sockets.push(entry.path());
    }

    Ok(sockets)
}

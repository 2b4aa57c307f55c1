//! Custom error types for snapshot operations.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Path not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Access error on {}: {source}", path.display())]
    Access {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Snapshot already exists: {}", path.display())]
    Collision { path: PathBuf },

    /// The source tree was moved aside but the restored tree could not be put
    /// in its place, and moving the original back failed too.
    #[error(
        "Partial restore of {}: previous content preserved at {} ({reason})",
        source_dir.display(),
        preserved_at.display()
    )]
    PartialRestore {
        source_dir: PathBuf,
        preserved_at: PathBuf,
        reason: String,
    },

    #[error("Restore from {} refused: destructive restore was not confirmed", snapshot.display())]
    RestoreNotConfirmed { snapshot: PathBuf },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SnapshotError {
    /// Classify an I/O failure on `path`. A missing path becomes `NotFound`,
    /// everything else is an access error carrying the original cause.
    pub fn from_io(path: &Path, err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            SnapshotError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            SnapshotError::Access {
                path: path.to_path_buf(),
                source: err,
            }
        }
    }

    /// Like [`SnapshotError::from_io`] but never reports `NotFound`. Used for
    /// paths that were just discovered by a walk, where disappearing is an
    /// access failure rather than a missing input.
    pub fn access(path: &Path, err: io::Error) -> Self {
        SnapshotError::Access {
            path: path.to_path_buf(),
            source: err,
        }
    }
}

impl From<walkdir::Error> for SnapshotError {
    fn from(err: walkdir::Error) -> Self {
        let path = err.path().map(Path::to_path_buf).unwrap_or_default();
        let io_err = err
            .into_io_error()
            .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "filesystem loop detected"));
        SnapshotError::from_io(&path, io_err)
    }
}

pub type Result<T> = std::result::Result<T, SnapshotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        let err = SnapshotError::from_io(
            Path::new("/missing"),
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, SnapshotError::NotFound { .. }));
    }

    #[test]
    fn test_permission_denied_is_access_error() {
        let err = SnapshotError::from_io(
            Path::new("/locked"),
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, SnapshotError::Access { .. }));
        assert!(err.to_string().contains("/locked"));
    }
}

//! Whole-tree filesystem operations: copy, remove, existence checks.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::fs::metadata::FileMetadata;
use crate::fs::walker::ensure_directory;
use crate::utils::errors::{Result, SnapshotError};

/// Counters reported by [`copy_tree`]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CopyStats {
    pub files: usize,
    pub directories: usize,
    pub symlinks: usize,
    pub bytes: u64,
}

/// Does anything (file, directory or dangling symlink) exist at `path`?
pub fn exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Recursively copy the contents of `src` into `dst`.
///
/// `dst` is created if missing. File contents are copied byte-for-byte, and
/// permissions and modification times are carried over. Symlinks are recreated
/// as symlinks on Unix and never followed. Special files (sockets, FIFOs,
/// devices) are skipped with a warning.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<CopyStats> {
    ensure_directory(src)?;
    fs::create_dir_all(dst).map_err(|e| SnapshotError::access(dst, e))?;

    let mut stats = CopyStats::default();
    // Directory metadata is applied after their contents are written, deepest
    // first, so a read-only directory does not block its own population.
    let mut directories: Vec<(PathBuf, FileMetadata)> = Vec::new();

    let walker = WalkDir::new(src)
        .follow_links(false)
        .min_depth(1)
        .sort_by_file_name();

    for entry in walker {
        let entry = entry?;
        let source_path = entry.path();
        let relative = source_path.strip_prefix(src).unwrap_or(source_path);
        let target = dst.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir(&target).map_err(|e| SnapshotError::access(&target, e))?;
            let metadata = FileMetadata::from_path(source_path)
                .map_err(|e| SnapshotError::access(source_path, e))?;
            directories.push((target, metadata));
            stats.directories += 1;
        } else if file_type.is_file() {
            let bytes = copy_file(source_path, &target)?;
            stats.files += 1;
            stats.bytes += bytes;
        } else if file_type.is_symlink() {
            if copy_symlink(source_path, &target)? {
                stats.symlinks += 1;
            }
        } else {
            warn!("Skipping special file {}", source_path.display());
        }
    }

    for (path, metadata) in directories.iter().rev() {
        metadata
            .apply_to_path(path)
            .map_err(|e| SnapshotError::access(path, e))?;
    }

    // The walk starts below the root, so the root's own mode is copied here.
    // A symlinked root is resolved first, matching the walk.
    let root_metadata = fs::canonicalize(src)
        .and_then(|root| FileMetadata::from_path(&root))
        .map_err(|e| SnapshotError::access(src, e))?;
    root_metadata
        .apply_to_path(dst)
        .map_err(|e| SnapshotError::access(dst, e))?;

    debug!(
        "Copied {} -> {} ({} files, {} dirs, {} symlinks, {} bytes)",
        src.display(),
        dst.display(),
        stats.files,
        stats.directories,
        stats.symlinks,
        stats.bytes
    );

    Ok(stats)
}

fn copy_file(source_path: &Path, target: &Path) -> Result<u64> {
    let bytes = fs::copy(source_path, target).map_err(|e| SnapshotError::access(source_path, e))?;
    let metadata =
        FileMetadata::from_path(source_path).map_err(|e| SnapshotError::access(source_path, e))?;
    metadata
        .apply_to_path(target)
        .map_err(|e| SnapshotError::access(target, e))?;
    Ok(bytes)
}

#[cfg(unix)]
fn copy_symlink(source_path: &Path, target: &Path) -> Result<bool> {
    let link_target = fs::read_link(source_path).map_err(|e| SnapshotError::access(source_path, e))?;
    std::os::unix::fs::symlink(&link_target, target).map_err(|e| SnapshotError::access(target, e))?;
    Ok(true)
}

#[cfg(not(unix))]
fn copy_symlink(source_path: &Path, _target: &Path) -> Result<bool> {
    warn!("Skipping symlink {} (unsupported on this platform)", source_path.display());
    Ok(false)
}

/// Remove a directory tree. A missing path is `NotFound`.
pub fn remove_tree(path: &Path) -> Result<()> {
    ensure_directory(path)?;
    fs::remove_dir_all(path).map_err(|e| SnapshotError::access(path, e))?;
    debug!("Removed {}", path.display());
    Ok(())
}

//! Atomic replacement of a directory tree with a snapshot copy.
//!
//! The snapshot is first copied into a staging directory created next to the
//! target, so the final step is a pair of same-filesystem renames rather than
//! a remove followed by a long copy. The target is only touched once the full
//! copy exists on disk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::fs::tree::{copy_tree, exists, CopyStats};
use crate::utils::errors::{Result, SnapshotError};

const STAGING_PREFIX: &str = ".restore-";

/// Directory that will hold the staging area for `target`
fn staging_parent(target: &Path) -> PathBuf {
    match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Replace `target` with a copy of `snapshot`.
///
/// On a copy failure `target` is untouched. If the copy cannot be moved into
/// place the previous content is moved back; only if that also fails is
/// `PartialRestore` returned, naming where the previous content now lives.
/// A missing `target` is not an error: the copy is moved into place.
pub fn replace_tree(snapshot: &Path, target: &Path) -> Result<CopyStats> {
    replace_tree_with(snapshot, target, |from, to| fs::rename(from, to))
}

/// [`replace_tree`] with the rename step supplied by the caller
fn replace_tree_with<R>(snapshot: &Path, target: &Path, mut rename: R) -> Result<CopyStats>
where
    R: FnMut(&Path, &Path) -> io::Result<()>,
{
    let parent = staging_parent(target);
    fs::create_dir_all(&parent).map_err(|e| SnapshotError::access(&parent, e))?;

    let staging = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempdir_in(&parent)
        .map_err(|e| SnapshotError::access(&parent, e))?;
    debug!("Staging restore in {}", staging.path().display());

    // Dropping `staging` on any early return discards the partial copy
    let staged_tree = staging.path().join("tree");
    let stats = copy_tree(snapshot, &staged_tree)?;

    let displaced = staging.path().join("previous");
    let had_target = exists(target);
    if had_target {
        rename(target, &displaced).map_err(|e| SnapshotError::access(target, e))?;
    }

    if let Err(swap_err) = rename(&staged_tree, target) {
        if had_target {
            if let Err(rollback_err) = rename(&displaced, target) {
                let kept = staging.keep();
                return Err(SnapshotError::PartialRestore {
                    source_dir: target.to_path_buf(),
                    preserved_at: kept.join("previous"),
                    reason: format!("{swap_err}; rollback failed: {rollback_err}"),
                });
            }
            warn!("Restore of {} rolled back: {}", target.display(), swap_err);
        }
        return Err(SnapshotError::access(target, swap_err));
    }

    let staging_path = staging.path().to_path_buf();
    if let Err(e) = staging.close() {
        warn!(
            "Restore succeeded but previous content could not be removed from {}: {}",
            staging_path.display(),
            e
        );
    }

    Ok(stats)
}

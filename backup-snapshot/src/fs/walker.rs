//! Directory traversal for fingerprinting.
//!
//! Only regular files are reported. Symbolic links are never followed and
//! never reported, so a link cycle cannot trap the walk and a link pointing
//! outside the tree cannot pull foreign content into a fingerprint.

use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::utils::errors::{Result, SnapshotError};

/// Information about a regular file discovered during walking
#[derive(Debug, Clone)]
pub struct FileInfo {
    /// Full path to the file
    pub path: PathBuf,

    /// Path relative to the walk root, `/`-separated on every platform
    pub relative_path: String,

    /// File size in bytes
    pub size: u64,
}

impl FileInfo {
    fn from_entry(entry: &DirEntry, root: &Path) -> Result<Self> {
        let path = entry.path().to_path_buf();
        let metadata = entry.metadata()?;
        let relative = path.strip_prefix(root).unwrap_or(&path);

        Ok(Self {
            relative_path: relative_key(relative),
            size: metadata.len(),
            path,
        })
    }
}

/// Render a root-relative path as a fingerprint key.
///
/// Non-UTF-8 components are converted lossily.
pub fn relative_key(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Fail with `NotFound` unless `root` is an existing directory. A symlink
/// root is followed.
pub fn ensure_directory(root: &Path) -> Result<()> {
    match std::fs::metadata(root) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(SnapshotError::NotFound {
            path: root.to_path_buf(),
        }),
        Err(e) => Err(SnapshotError::from_io(root, e)),
    }
}

/// Walk a directory tree and collect every regular file, in file-name order.
///
/// # Example
/// ```no_run
/// use backup_snapshot::fs::walker::walk_files;
/// use std::path::Path;
///
/// let files = walk_files(Path::new("/data")).unwrap();
/// println!("Found {} files", files.len());
/// ```
pub fn walk_files(root: &Path) -> Result<Vec<FileInfo>> {
    let mut files = Vec::new();
    walk_files_with_callback(root, |file| files.push(file.clone()))?;
    Ok(files)
}

/// Walk a directory tree with a callback for each regular file.
///
/// The first unreadable directory aborts the walk.
pub fn walk_files_with_callback<F>(root: &Path, mut callback: F) -> Result<()>
where
    F: FnMut(&FileInfo),
{
    ensure_directory(root)?;

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name();

    for entry in walker {
        let entry = entry?;

        // Directories and symlinks are not recorded
        if !entry.file_type().is_file() {
            continue;
        }

        let file_info = FileInfo::from_entry(&entry, root)?;
        callback(&file_info);
    }

    Ok(())
}

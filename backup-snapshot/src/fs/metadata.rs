//! File metadata carried across snapshot copies.
//!
//! Content is what integrity verification compares; permissions and
//! modification times are preserved as well so that a restored tree looks
//! like the one that was backed up.

use std::fs;
use std::path::Path;
use std::time::SystemTime;

/// Metadata preserved by `copy_tree`
#[derive(Debug, Clone)]
pub struct FileMetadata {
    /// Last modified time, when the platform reports one
    pub modified: Option<SystemTime>,

    /// File permissions (Unix mode bits)
    pub permissions: Option<u32>,

    /// Is this a directory?
    pub is_dir: bool,
}

impl FileMetadata {
    /// Extract metadata from a path without following a final symlink
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let metadata = fs::symlink_metadata(path)?;

        #[cfg(unix)]
        let permissions = {
            use std::os::unix::fs::PermissionsExt;
            Some(metadata.permissions().mode())
        };

        #[cfg(not(unix))]
        let permissions = None;

        Ok(Self {
            modified: metadata.modified().ok(),
            permissions,
            is_dir: metadata.is_dir(),
        })
    }

    /// Apply permissions and, for files, the modification time
    #[cfg(unix)]
    pub fn apply_to_path(&self, path: &Path) -> std::io::Result<()> {
        use std::os::unix::fs::PermissionsExt;

        if !self.is_dir {
            self.apply_modified(path)?;
        }

        // Permissions last: a read-only mode would block set_modified
        if let Some(mode) = self.permissions {
            fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
        }

        Ok(())
    }

    #[cfg(not(unix))]
    pub fn apply_to_path(&self, path: &Path) -> std::io::Result<()> {
        if !self.is_dir {
            self.apply_modified(path)?;
        }
        Ok(())
    }

    fn apply_modified(&self, path: &Path) -> std::io::Result<()> {
        if let Some(modified) = self.modified {
            // fs::copy has already applied the mode, which may be read-only;
            // the owner can still set times through a read handle on Unix.
            #[cfg(unix)]
            let file = fs::File::open(path)?;
            #[cfg(not(unix))]
            let file = fs::File::options().write(true).open(path)?;

            file.set_modified(modified)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_extract_metadata() -> std::io::Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        temp_file.write_all(b"test content")?;
        temp_file.flush()?;

        let metadata = FileMetadata::from_path(temp_file.path())?;

        assert!(!metadata.is_dir);
        assert!(metadata.modified.is_some());

        Ok(())
    }

    #[test]
    fn test_modified_time_is_applied() -> std::io::Result<()> {
        let temp_dir = TempDir::new()?;
        let original = temp_dir.path().join("a.txt");
        let copy = temp_dir.path().join("b.txt");
        fs::write(&original, b"a")?;
        fs::write(&copy, b"a")?;

        let past = SystemTime::UNIX_EPOCH + Duration::from_secs(1_600_000_000);
        fs::File::options().write(true).open(&original)?.set_modified(past)?;

        FileMetadata::from_path(&original)?.apply_to_path(&copy)?;

        assert_eq!(fs::metadata(&copy)?.modified()?, past);
        Ok(())
    }

    #[test]
    #[cfg(unix)]
    fn test_permissions_preservation() -> std::io::Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new()?;
        let original = temp_dir.path().join("script.sh");
        let copy = temp_dir.path().join("copy.sh");
        fs::write(&original, b"#!/bin/sh\n")?;
        fs::write(&copy, b"#!/bin/sh\n")?;
        fs::set_permissions(&original, fs::Permissions::from_mode(0o750))?;

        FileMetadata::from_path(&original)?.apply_to_path(&copy)?;

        let mode = fs::metadata(&copy)?.permissions().mode() & 0o777;
        assert_eq!(mode, 0o750);

        Ok(())
    }
}

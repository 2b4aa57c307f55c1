//! Tree fingerprints: root-relative path → content digest.
//!
//! Keys are relative to the walked root, so fingerprints of a source tree and
//! of its snapshot are directly comparable even though the roots differ.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use crate::fs::walker::walk_files;
use crate::integrity::hasher::{hash_file, Digest};
use crate::utils::errors::Result;

/// Digest of every regular file in a tree, keyed by `/`-separated relative path
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    pub files: BTreeMap<String, Digest>,

    /// Total size of all fingerprinted files in bytes
    pub total_bytes: u64,
}

impl Fingerprint {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn get(&self, relative_path: &str) -> Option<&Digest> {
        self.files.get(relative_path)
    }
}

/// Fingerprint every regular file under `root`.
///
/// Fails with `NotFound` if `root` is missing and `Access` on the first file or
/// directory that cannot be read; a partial fingerprint is never returned.
pub fn fingerprint(root: &Path) -> Result<Fingerprint> {
    let result = fingerprint_with_progress(root, |_, _| {})?;

    debug!(
        "Fingerprinted {} ({} files, {} bytes)",
        root.display(),
        result.len(),
        result.total_bytes
    );

    Ok(result)
}

/// Fingerprint a tree with a progress callback `(current_file, total_files)`.
///
/// The tree is listed once up front so the total is known before hashing.
pub fn fingerprint_with_progress<F>(root: &Path, mut progress: F) -> Result<Fingerprint>
where
    F: FnMut(usize, usize),
{
    let files_list = walk_files(root)?;
    let total_files = files_list.len();
    let mut result = Fingerprint::default();

    for (idx, file_info) in files_list.iter().enumerate() {
        progress(idx + 1, total_files);

        let digest = hash_file(&file_info.path)?;
        result.total_bytes += file_info.size;
        result.files.insert(file_info.relative_path.clone(), digest);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrity::hasher::hash_bytes;
    use crate::utils::errors::SnapshotError;
    use std::fs;
    use tempfile::TempDir;

    fn sample_tree(root: &Path) -> std::io::Result<()> {
        fs::create_dir_all(root.join("b"))?;
        fs::write(root.join("a.txt"), b"hello")?;
        fs::write(root.join("b/c.txt"), b"world")?;
        Ok(())
    }

    #[test]
    fn test_keys_are_root_relative() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        sample_tree(temp_dir.path()).unwrap();

        let fp = fingerprint(temp_dir.path())?;

        assert_eq!(fp.len(), 2);
        assert_eq!(fp.get("a.txt"), Some(&hash_bytes(b"hello")));
        assert_eq!(fp.get("b/c.txt"), Some(&hash_bytes(b"world")));
        assert_eq!(fp.total_bytes, 10);
        Ok(())
    }

    #[test]
    fn test_fingerprint_is_deterministic() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        sample_tree(temp_dir.path()).unwrap();

        assert_eq!(fingerprint(temp_dir.path())?, fingerprint(temp_dir.path())?);
        Ok(())
    }

    #[test]
    fn test_different_roots_same_content_compare_equal() -> Result<()> {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        sample_tree(first.path()).unwrap();
        sample_tree(second.path()).unwrap();

        assert_eq!(fingerprint(first.path())?, fingerprint(second.path())?);
        Ok(())
    }

    #[test]
    fn test_directories_are_not_recorded() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("only/dirs/here")).unwrap();

        assert!(fingerprint(temp_dir.path())?.is_empty());
        Ok(())
    }

    #[test]
    fn test_missing_root_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let result = fingerprint(&temp_dir.path().join("absent"));
        assert!(matches!(result, Err(SnapshotError::NotFound { .. })));
    }

    #[test]
    fn test_progress_reports_every_file() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        sample_tree(temp_dir.path()).unwrap();

        let mut calls = Vec::new();
        let fp = fingerprint_with_progress(temp_dir.path(), |current, total| {
            calls.push((current, total));
        })?;

        assert_eq!(calls, vec![(1, 2), (2, 2)]);
        assert_eq!(fp, fingerprint(temp_dir.path())?);
        Ok(())
    }

    #[test]
    fn test_file_vanishing_mid_walk_is_access_error() {
        let temp_dir = TempDir::new().unwrap();
        sample_tree(temp_dir.path()).unwrap();
        let doomed = temp_dir.path().join("b/c.txt");

        // Files are listed first, then hashed in order: drop the second one
        // after listing but before it is read.
        let result = fingerprint_with_progress(temp_dir.path(), |current, _| {
            if current == 2 {
                fs::remove_file(&doomed).unwrap();
            }
        });

        match result {
            Err(SnapshotError::Access { path, .. }) => assert_eq!(path, doomed),
            other => panic!("expected access error, got {other:?}"),
        }
    }

    #[test]
    fn test_serializes_as_hex_map() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.txt"), b"hello").unwrap();

        let fp = fingerprint(temp_dir.path())?;
        let json = serde_json::to_value(&fp).unwrap();
        assert_eq!(
            json["files"]["a.txt"],
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        Ok(())
    }
}

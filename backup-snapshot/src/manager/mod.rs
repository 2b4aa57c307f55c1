//! Snapshot lifecycle orchestration.
//!
//! `BackupManager` ties the filesystem collaborators and the integrity
//! components together:
//! - create: copy the source tree into `<backup_root>/backup_YYYYMMDD_HHMMSS`
//! - verify: fingerprint source and snapshot, classify the pair
//! - restore: replace the source tree with a snapshot copy
//!
//! Restore is destructive. The current source content is gone afterwards
//! unless another backup of it exists, which is why it needs an explicit
//! [`RestoreConfirmation::Confirmed`].

pub mod restore;

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::clock::{snapshot_name, Clock, SystemClock};
use crate::config::Config;
use crate::fs::tree::{copy_tree, remove_tree};
use crate::fs::walker::ensure_directory;
use crate::integrity::fingerprint::{fingerprint_with_progress, Fingerprint};
use crate::integrity::{compare, VerificationResult};
use crate::utils::errors::{Result, SnapshotError};

/// Lifecycle position of a snapshot, as observed by one manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotState {
    NotCreated,
    Created,
    VerifiedIdentical,
    VerifiedDiverged,
    RestoredFrom,
}

/// Caller's acknowledgement that restore discards the current source tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreConfirmation {
    Confirmed,
    Unconfirmed,
}

impl From<bool> for RestoreConfirmation {
    fn from(confirmed: bool) -> Self {
        if confirmed {
            RestoreConfirmation::Confirmed
        } else {
            RestoreConfirmation::Unconfirmed
        }
    }
}

/// Hashing progress is logged every this many files
const PROGRESS_LOG_INTERVAL: usize = 1000;

pub struct BackupManager<C: Clock = SystemClock> {
    source: PathBuf,
    backup_root: PathBuf,
    clock: C,
    states: BTreeMap<PathBuf, SnapshotState>,
}

impl BackupManager<SystemClock> {
    pub fn new(source: impl Into<PathBuf>, backup_root: impl Into<PathBuf>) -> Self {
        Self::with_clock(source, backup_root, SystemClock)
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.paths.source.clone(), config.paths.backup_root.clone())
    }
}

impl<C: Clock> BackupManager<C> {
    pub fn with_clock(source: impl Into<PathBuf>, backup_root: impl Into<PathBuf>, clock: C) -> Self {
        Self {
            source: source.into(),
            backup_root: backup_root.into(),
            clock,
            states: BTreeMap::new(),
        }
    }

    /// Last known lifecycle state of `snapshot`
    pub fn state_of(&self, snapshot: &Path) -> SnapshotState {
        self.states
            .get(snapshot)
            .copied()
            .unwrap_or(SnapshotState::NotCreated)
    }

    /// Copy the source tree into a new timestamped snapshot and return its path.
    ///
    /// Creates the backup root on first use. A snapshot with the same name
    /// (a second call within the same second) is never overwritten: the call
    /// fails with `Collision`. A failed copy removes the partial snapshot.
    pub fn create_backup(&mut self) -> Result<PathBuf> {
        ensure_directory(&self.source)?;
        self.reject_root_inside_source()?;

        fs::create_dir_all(&self.backup_root)
            .map_err(|e| SnapshotError::access(&self.backup_root, e))?;

        let snapshot = self.backup_root.join(snapshot_name(self.clock.now()));

        // create_dir is the atomic claim on the name
        match fs::create_dir(&snapshot) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                warn!("Snapshot {} already exists, refusing to overwrite", snapshot.display());
                return Err(SnapshotError::Collision { path: snapshot });
            }
            Err(e) => return Err(SnapshotError::access(&snapshot, e)),
        }

        let stats = match copy_tree(&self.source, &snapshot) {
            Ok(stats) => stats,
            Err(e) => {
                error!("Backup of {} failed: {}", self.source.display(), e);
                if let Err(cleanup) = remove_tree(&snapshot) {
                    warn!(
                        "Failed to remove partial snapshot {}: {}",
                        snapshot.display(),
                        cleanup
                    );
                }
                return Err(e);
            }
        };

        self.states.insert(snapshot.clone(), SnapshotState::Created);
        info!(
            "Backup created at {} ({} files, {} bytes)",
            snapshot.display(),
            stats.files,
            stats.bytes
        );

        Ok(snapshot)
    }

    /// Replace the entire source tree with the content of `snapshot`.
    ///
    /// This is irreversible without another backup of the current source.
    /// Without `RestoreConfirmation::Confirmed` nothing is touched. A missing
    /// snapshot fails with `NotFound` and leaves the source as it was.
    pub fn restore_backup(
        &mut self,
        snapshot: &Path,
        confirmation: RestoreConfirmation,
    ) -> Result<()> {
        if confirmation != RestoreConfirmation::Confirmed {
            warn!("Restore from {} not confirmed, source left untouched", snapshot.display());
            return Err(SnapshotError::RestoreNotConfirmed {
                snapshot: snapshot.to_path_buf(),
            });
        }

        if let Err(e) = ensure_directory(snapshot) {
            error!("Backup path does not exist: {}", snapshot.display());
            return Err(e);
        }

        let snapshot_abs = resolve(snapshot);
        let source_abs = resolve(&self.source);
        if snapshot_abs.starts_with(&source_abs) || source_abs.starts_with(&snapshot_abs) {
            return Err(SnapshotError::Config(format!(
                "snapshot {} and source {} overlap",
                snapshot.display(),
                self.source.display()
            )));
        }

        // A symlinked source is restored at the directory it points to, the
        // same tree that create and verify read through the link
        let target = match fs::symlink_metadata(&self.source) {
            Ok(meta) if meta.file_type().is_symlink() => fs::canonicalize(&self.source)
                .map_err(|e| SnapshotError::from_io(&self.source, e))?,
            _ => self.source.clone(),
        };

        match restore::replace_tree(snapshot, &target) {
            Ok(stats) => {
                self.states
                    .insert(snapshot.to_path_buf(), SnapshotState::RestoredFrom);
                info!(
                    "Backup restored from {} ({} files, {} bytes)",
                    snapshot.display(),
                    stats.files,
                    stats.bytes
                );
                Ok(())
            }
            Err(e) => {
                error!("Restore from {} failed: {}", snapshot.display(), e);
                Err(e)
            }
        }
    }

    /// Fingerprint the source and `snapshot` and classify the pair.
    ///
    /// Any unreadable file aborts verification with an error instead of a
    /// result computed from a partial fingerprint.
    pub fn verify_integrity(&mut self, snapshot: &Path) -> Result<VerificationResult> {
        let source_fp = fingerprint_logged("source", &self.source)?;
        let snapshot_fp = fingerprint_logged("snapshot", snapshot)?;

        let result = compare(&source_fp, &snapshot_fp);

        let state = if result.is_identical() {
            info!(
                "Backup integrity verified for {}: {} files identical",
                snapshot.display(),
                source_fp.len()
            );
            SnapshotState::VerifiedIdentical
        } else {
            warn!(
                "Backup integrity failed for {}: {} difference(s)",
                snapshot.display(),
                result.divergence_count()
            );
            SnapshotState::VerifiedDiverged
        };
        self.states.insert(snapshot.to_path_buf(), state);

        Ok(result)
    }

    fn reject_root_inside_source(&self) -> Result<()> {
        let source_abs = resolve(&self.source);
        if resolve(&self.backup_root).starts_with(&source_abs) {
            return Err(SnapshotError::Config(format!(
                "backup root {} is inside source {}",
                self.backup_root.display(),
                self.source.display()
            )));
        }
        Ok(())
    }
}

fn fingerprint_logged(label: &str, root: &Path) -> Result<Fingerprint> {
    fingerprint_with_progress(root, |current, total| {
        if current == total || current % PROGRESS_LOG_INTERVAL == 0 {
            debug!("Hashing {} {}: {}/{} files", label, root.display(), current, total);
        }
    })
}

/// Canonicalize the deepest existing ancestor of `path` and re-append the
/// components that do not exist yet, so symlinks are resolved even for a
/// directory that is about to be created.
fn resolve(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut existing = absolute.as_path();
    let mut pending = Vec::new();

    loop {
        if let Ok(canonical) = fs::canonicalize(existing) {
            return pending
                .iter()
                .rev()
                .fold(canonical, |acc: PathBuf, name| acc.join(name));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                pending.push(name.to_os_string());
                existing = parent;
            }
            _ => return absolute,
        }
    }
}

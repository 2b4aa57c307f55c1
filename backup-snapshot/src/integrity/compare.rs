//! Classification of two tree fingerprints.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::integrity::fingerprint::Fingerprint;

/// Outcome of comparing a source fingerprint with a snapshot fingerprint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerificationResult {
    /// Same key sets and the same digest for every key
    Identical,

    Diverged {
        /// In the source, absent from the snapshot
        missing_in_snapshot: BTreeSet<String>,

        /// In the snapshot, absent from the source
        missing_in_source: BTreeSet<String>,

        /// Present in both with differing digests
        changed: BTreeSet<String>,
    },
}

impl VerificationResult {
    pub fn is_identical(&self) -> bool {
        matches!(self, VerificationResult::Identical)
    }

    /// Total number of diverging paths
    pub fn divergence_count(&self) -> usize {
        match self {
            VerificationResult::Identical => 0,
            VerificationResult::Diverged {
                missing_in_snapshot,
                missing_in_source,
                changed,
            } => missing_in_snapshot.len() + missing_in_source.len() + changed.len(),
        }
    }
}

impl fmt::Display for VerificationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerificationResult::Identical => {
                write!(f, "Backup integrity verified: data is identical.")
            }
            VerificationResult::Diverged {
                missing_in_snapshot,
                missing_in_source,
                changed,
            } => {
                write!(
                    f,
                    "Backup integrity failed: {} difference(s) detected.",
                    self.divergence_count()
                )?;
                write_section(f, "Changed", changed)?;
                write_section(f, "Missing in snapshot", missing_in_snapshot)?;
                write_section(f, "Missing in source", missing_in_source)
            }
        }
    }
}

fn write_section(f: &mut fmt::Formatter<'_>, title: &str, paths: &BTreeSet<String>) -> fmt::Result {
    if paths.is_empty() {
        return Ok(());
    }
    write!(f, "\n{} ({}):", title, paths.len())?;
    for path in paths {
        write!(f, "\n  {path}")?;
    }
    Ok(())
}

/// Compare a source fingerprint against a snapshot fingerprint.
///
/// Pure and deterministic: no I/O, inputs are not modified.
pub fn compare(source: &Fingerprint, snapshot: &Fingerprint) -> VerificationResult {
    let mut missing_in_snapshot = BTreeSet::new();
    let mut changed = BTreeSet::new();

    for (path, digest) in &source.files {
        match snapshot.files.get(path) {
            None => {
                missing_in_snapshot.insert(path.clone());
            }
            Some(other) if other != digest => {
                changed.insert(path.clone());
            }
            Some(_) => {}
        }
    }

    let missing_in_source: BTreeSet<String> = snapshot
        .files
        .keys()
        .filter(|path| !source.files.contains_key(*path))
        .cloned()
        .collect();

    if missing_in_snapshot.is_empty() && missing_in_source.is_empty() && changed.is_empty() {
        VerificationResult::Identical
    } else {
        VerificationResult::Diverged {
            missing_in_snapshot,
            missing_in_source,
            changed,
        }
    }
}

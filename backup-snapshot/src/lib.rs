//! Backup Snapshot Library
//!
//! Point-in-time directory snapshots with SHA-256 integrity verification
//! and atomic restore.

pub mod clock;
pub mod config;
pub mod fs;
pub mod integrity;
pub mod manager;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use integrity::{Fingerprint, VerificationResult};
pub use manager::{BackupManager, RestoreConfirmation, SnapshotState};
pub use utils::errors::SnapshotError;
pub type Result<T> = std::result::Result<T, SnapshotError>;

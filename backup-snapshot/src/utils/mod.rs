//! Utility modules for snapshot management.

pub mod errors;
pub mod logger;

pub use errors::{Result, SnapshotError};

//! Filesystem collaborators: tree walking, copying and removal.

pub mod metadata;
pub mod tree;
pub mod walker;

pub use tree::{copy_tree, exists, remove_tree, CopyStats};
pub use walker::{walk_files, FileInfo};

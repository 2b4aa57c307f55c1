//! Content fingerprinting and snapshot integrity classification.
//!
//! - `hasher`: SHA-256 digest of one file
//! - `fingerprint`: digest of every regular file in a tree, by relative path
//! - `compare`: identical / diverged classification of two fingerprints

pub mod compare;
pub mod fingerprint;
pub mod hasher;

pub use compare::{compare, VerificationResult};
pub use fingerprint::{fingerprint, Fingerprint};
pub use hasher::{hash_bytes, hash_file, Digest};

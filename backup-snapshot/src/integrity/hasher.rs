//! SHA-256 content digests for single files.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest as _, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::str::FromStr;

use crate::utils::errors::{Result, SnapshotError};

/// Read buffer size for streaming file content into the hasher (64KB)
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// A 256-bit content digest. Displays and serializes as 64 lowercase hex
/// characters.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest([u8; 32]);

impl Digest {
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

impl FromStr for Digest {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Digest(bytes))
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Hash an in-memory buffer
pub fn hash_bytes(data: &[u8]) -> Digest {
    Digest(Sha256::digest(data).into())
}

/// Hash everything a reader yields, in fixed-size chunks.
///
/// Produces the same digest as [`hash_bytes`] over the concatenated content.
pub fn hash_reader<R: Read>(mut reader: R) -> io::Result<Digest> {
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];

    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..n]);
    }

    Ok(Digest(hasher.finalize().into()))
}

/// Hash the full content of the file at `path`.
///
/// Any failure to open or read the file is an `Access` error; unreadable files
/// are never silently skipped.
pub fn hash_file(path: &Path) -> Result<Digest> {
    let file = File::open(path).map_err(|e| SnapshotError::access(path, e))?;
    hash_reader(file).map_err(|e| SnapshotError::access(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    // sha256("hello")
    const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    #[test]
    fn test_known_digest() {
        let digest = hash_bytes(b"hello");
        assert_eq!(digest.to_hex(), HELLO_SHA256);
        assert_eq!(digest.to_string().len(), 64);
    }

    #[test]
    fn test_file_digest_matches_bytes_digest() -> Result<()> {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"hello").unwrap();
        temp_file.flush().unwrap();

        assert_eq!(hash_file(temp_file.path())?, hash_bytes(b"hello"));
        Ok(())
    }

    #[test]
    fn test_streaming_matches_whole_buffer_for_large_input() -> io::Result<()> {
        // Spans several read buffers and ends mid-buffer
        let data: Vec<u8> = (0..(READ_BUFFER_SIZE * 3 + 17)).map(|i| (i % 251) as u8).collect();
        let streamed = hash_reader(io::Cursor::new(&data))?;
        assert_eq!(streamed, hash_bytes(&data));
        Ok(())
    }

    #[test]
    fn test_single_byte_change_changes_digest() {
        assert_ne!(hash_bytes(b"hello"), hash_bytes(b"hellO"));
    }

    #[test]
    fn test_missing_file_is_access_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = hash_file(&temp_dir.path().join("gone.txt"));
        assert!(matches!(result, Err(SnapshotError::Access { .. })));
    }

    #[test]
    fn test_digest_hex_round_trip_and_serde() {
        let digest: Digest = HELLO_SHA256.parse().unwrap();
        assert_eq!(digest, hash_bytes(b"hello"));

        let json = serde_json::to_string(&digest).unwrap();
        assert_eq!(json, format!("\"{HELLO_SHA256}\""));
        let back: Digest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, digest);

        assert!("abc".parse::<Digest>().is_err());
    }
}

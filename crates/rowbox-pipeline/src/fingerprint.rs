//! File identity fingerprinting
//!
//! Computes a cheap identity fingerprint over a file's metadata so the
//! transport layer can detect and short-circuit duplicate transmissions.
//!
//! This is a metadata identity, not a content hash: two distinct files that
//! happen to share name, size, and modification time are indistinguishable,
//! and a true duplicate re-saved with a new mtime is not detected. A content
//! hash (e.g. SHA-256 over the bytes) is the known fix; the metadata triple
//! is kept because it is what the duplicate-suppression contract with the
//! server is keyed on.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Compute the fingerprint for a (name, size, mtime) triple.
///
/// Identical triples always yield identical fingerprints. The digest is
/// hex-encoded SHA-256 over a canonical encoding of the triple, so the
/// result is opaque and fixed-width regardless of filename length.
pub fn fingerprint(filename: &str, size_bytes: u64, modified_at: DateTime<Utc>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(filename.as_bytes());
    hasher.update([0u8]);
    hasher.update(size_bytes.to_le_bytes());
    hasher.update(modified_at.timestamp_millis().to_le_bytes());
    hex::encode(hasher.finalize())
}

/// Compute the fingerprint for a file on disk from its filesystem metadata.
pub fn fingerprint_path(path: &Path) -> std::io::Result<String> {
    let metadata = std::fs::metadata(path)?;
    let modified: DateTime<Utc> = metadata.modified()?.into();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(fingerprint(&name, metadata.len(), modified))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn mtime() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_identical_triples_yield_identical_fingerprints() {
        let a = fingerprint("sales.csv", 1024, mtime());
        let b = fingerprint("sales.csv", 1024, mtime());
        assert_eq!(a, b);
    }

    #[test]
    fn test_any_component_changes_the_fingerprint() {
        let base = fingerprint("sales.csv", 1024, mtime());
        assert_ne!(base, fingerprint("sales2.csv", 1024, mtime()));
        assert_ne!(base, fingerprint("sales.csv", 1025, mtime()));
        assert_ne!(
            base,
            fingerprint("sales.csv", 1024, mtime() + chrono::Duration::seconds(1))
        );
    }

    #[test]
    fn test_fingerprint_is_fixed_width_hex() {
        let fp = fingerprint("a-very-long-filename-with-unicode-ßöü.xlsx", 9, mtime());
        assert_eq!(fp.len(), 64);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_name_length_ambiguity_is_separated() {
        // The separator byte keeps (name, size) pairs from colliding when the
        // name happens to end in digits.
        let a = fingerprint("file1", 0, mtime());
        let b = fingerprint("file", 10, mtime());
        assert_ne!(a, b);
    }
}

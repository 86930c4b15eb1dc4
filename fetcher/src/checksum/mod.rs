//! Archive verification against a downloaded checksum manifest.
//!
//! # Sub-modules
//!
//! - [`digest`] - SHA-256 computation (`Sha256Digest`).
//! - [`manifest`] - Checksum manifest parsing (`ChecksumManifest`).

pub mod digest;
pub mod manifest;

use crate::error::{FetchError, Result};
use digest::Sha256Digest;
use manifest::ChecksumManifest;
use std::path::Path;

/// Outcome of comparing an archive against its manifest entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumVerdict {
    /// Base name of the archive that was looked up.
    pub file: String,
    /// Digest recorded in the manifest.
    pub expected: String,
    /// Digest computed from the archive.
    pub actual: Sha256Digest,
}

impl ChecksumVerdict {
    /// Whether the computed digest equals the recorded one.
    #[must_use]
    pub fn is_match(&self) -> bool {
        self.actual.matches(&self.expected)
    }

    /// Convert a mismatch into [`FetchError::ChecksumMismatch`].
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::ChecksumMismatch`] when the digests differ.
    pub fn into_result(self) -> Result<()> {
        if self.is_match() {
            return Ok(());
        }
        Err(FetchError::ChecksumMismatch {
            file: self.file,
            expected: self.expected,
            actual: self.actual.to_string(),
        })
    }
}

/// Report whether the archive's SHA-256 digest matches its manifest entry.
///
/// # Errors
///
/// Returns [`FetchError::ChecksumEntryNotFound`] if the manifest has no
/// line naming the archive's base file name, and [`FetchError::Io`] if
/// either file cannot be read.
pub fn verify_checksum(archive_path: &Path, manifest_path: &Path) -> Result<bool> {
    Ok(compare(archive_path, manifest_path)?.is_match())
}

/// Compute the archive digest and look up its manifest entry.
///
/// # Errors
///
/// As for [`verify_checksum`].
pub fn compare(archive_path: &Path, manifest_path: &Path) -> Result<ChecksumVerdict> {
    let file = archive_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let text = std::fs::read_to_string(manifest_path)
        .map_err(|e| FetchError::io(manifest_path, e))?;
    let manifest = ChecksumManifest::parse(&text);
    let expected = manifest
        .digest_for(&file)
        .ok_or_else(|| FetchError::ChecksumEntryNotFound {
            file: file.clone(),
            manifest: manifest_path.to_path_buf(),
        })?
        .to_owned();

    let actual =
        Sha256Digest::of_file(archive_path).map_err(|e| FetchError::io(archive_path, e))?;
    Ok(ChecksumVerdict {
        file,
        expected,
        actual,
    })
}

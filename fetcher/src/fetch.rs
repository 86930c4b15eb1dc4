//! Verified release fetch orchestrator.
//!
//! Resolves a kit release, downloads its platform archive and checksum
//! manifest into a temporary directory, verifies the archive's SHA-256
//! digest, and only then extracts it into the destination directory. The
//! first failing step aborts the fetch; an archive that failed or skipped
//! verification is never extracted.

use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use std::io::Write;
use std::time::Duration;

use crate::checksum;
use crate::error::{FetchError, Result};
use crate::extraction::{ArchiveExtractor, TarGzExtractor};
use crate::output::write_stderr_line;
use crate::release::assets::{AssetNames, select_assets};
use crate::release::client::{HttpReleaseClient, ReleaseClient, ReleaseEndpoint};
use crate::release::model::VersionSelector;

/// File name the checksum manifest is stored under while verifying.
const MANIFEST_FILE_NAME: &str = "checksums.txt";

/// Inputs for one fetch.
#[derive(Debug, Clone)]
pub struct FetchRequest<'a> {
    /// Which release to resolve.
    pub selector: VersionSelector,
    /// Names used to select the archive and checksum assets.
    pub assets: AssetNames,
    /// Name of the binary that must be present after extraction.
    pub binary_name: &'a str,
    /// Directory the archive is extracted into.
    pub destination: &'a Utf8Path,
    /// When true, suppress progress output.
    pub quiet: bool,
}

/// A verified and extracted release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedRelease {
    /// Tag of the resolved release.
    pub tag: String,
    /// Directory holding the extracted tree.
    pub destination: Utf8PathBuf,
    /// Path of the extracted binary.
    pub binary: Utf8PathBuf,
    /// Number of regular files written.
    pub files: usize,
}

/// Fetch a release using the production HTTP client and extractor.
///
/// # Errors
///
/// Returns the [`FetchError`] of the first step that fails.
pub fn fetch_release(
    request: &FetchRequest<'_>,
    endpoint: ReleaseEndpoint,
    timeout: Duration,
    stderr: &mut dyn Write,
) -> Result<FetchedRelease> {
    let client = HttpReleaseClient::with_timeout(endpoint, timeout);
    fetch_release_with(request, &client, &TarGzExtractor, stderr)
}

/// Testable inner function with injected dependencies.
///
/// The production entry point [`fetch_release`] delegates here with real
/// implementations; tests inject mocks.
///
/// # Errors
///
/// Returns the [`FetchError`] of the first step that fails.
pub fn fetch_release_with(
    request: &FetchRequest<'_>,
    client: &dyn ReleaseClient,
    extractor: &dyn ArchiveExtractor,
    stderr: &mut dyn Write,
) -> Result<FetchedRelease> {
    let progress = |stderr: &mut dyn Write, message: String| {
        if !request.quiet {
            write_stderr_line(stderr, message);
        }
    };

    // Step 1: Resolve release metadata.
    progress(stderr, format!("Resolving kit release {}...", request.selector));
    let release = client.fetch_release(&request.selector)?;
    debug!(
        "resolved {} to {} with {} assets",
        request.selector,
        release.tag_name,
        release.assets.len()
    );

    // Step 2: Select assets before any download.
    let selected = select_assets(&release, &request.assets)?;

    // Step 3: Download archive and manifest into a scratch directory.
    let scratch = tempfile::tempdir().map_err(|e| FetchError::io(std::env::temp_dir(), e))?;
    let archive_path = scratch.path().join(&request.assets.archive);
    let manifest_path = scratch.path().join(MANIFEST_FILE_NAME);

    progress(stderr, format!("Downloading {}...", request.assets.archive));
    client.download(&selected.archive_url, &archive_path)?;
    client.download(&selected.checksum_url, &manifest_path)?;

    // Step 4: Verify.
    checksum::compare(&archive_path, &manifest_path)?.into_result()?;
    info!("checksum verified for {}", request.assets.archive);
    progress(stderr, "Checksum verified.".to_owned());

    // Step 5: Extract.
    std::fs::create_dir_all(request.destination)
        .map_err(|e| FetchError::io(request.destination, e))?;
    let files = extractor.extract(&archive_path, request.destination.as_std_path())?;
    debug!("extracted {} files to {}", files.len(), request.destination);

    let binary = request.destination.join(request.binary_name);
    if !binary.is_file() {
        return Err(FetchError::BinaryMissing {
            tag: release.tag_name,
            binary: binary.into_std_path_buf(),
        });
    }

    Ok(FetchedRelease {
        tag: release.tag_name,
        destination: request.destination.to_owned(),
        binary,
        files: files.len(),
    })
}

#[cfg(test)]
#[path = "fetch_tests.rs"]
mod tests;

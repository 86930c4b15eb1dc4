//! Error types for the verified release fetcher and kit invocations.
//!
//! Every variant carries the URL, file, or tag needed to diagnose the
//! failure without re-running the fetch.

use crate::config::ConfigError;
use crate::extraction::ExtractionError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while resolving, downloading, verifying, or
/// extracting a release.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The network request could not be completed.
    #[error("request to {url} failed: {reason}")]
    Transport {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// An asset download returned a non-success status.
    #[error("download of {url} returned HTTP {status}")]
    HttpStatus {
        /// The URL that was requested.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The release-metadata endpoint returned a non-success status.
    #[error("release {selector} not found (HTTP {status} from {url})")]
    ReleaseNotFound {
        /// The version selector that was resolved.
        selector: String,
        /// The metadata URL that was queried.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The release-metadata body did not have the expected shape.
    #[error("could not decode release metadata from {url}: {reason}")]
    Decode {
        /// The metadata URL that was queried.
        url: String,
        /// Description of the decoding failure.
        reason: String,
    },

    /// The release lacks an artefact required for this platform.
    #[error("release {tag} has no {missing} asset")]
    AssetNotFound {
        /// The tag of the resolved release.
        tag: String,
        /// Which artefact was missing (archive name or checksum suffix).
        missing: String,
    },

    /// The checksum manifest has no line naming the archive.
    #[error("checksum manifest {manifest} has no entry for {file}")]
    ChecksumEntryNotFound {
        /// Base name of the archive that was looked up.
        file: String,
        /// Path of the downloaded manifest.
        manifest: PathBuf,
    },

    /// The manifest names the archive but the digests differ.
    #[error("checksum mismatch for {file}: expected {expected}, computed {actual}")]
    ChecksumMismatch {
        /// Base name of the archive.
        file: String,
        /// Digest recorded in the manifest.
        expected: String,
        /// Digest computed from the downloaded bytes.
        actual: String,
    },

    /// A local file system operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// The path being read or written.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The verified archive could not be extracted.
    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    /// Extraction succeeded but the expected binary is absent.
    #[error("release {tag} did not contain {binary}")]
    BinaryMissing {
        /// The tag of the resolved release.
        tag: String,
        /// The expected binary path inside the destination.
        binary: PathBuf,
    },

    /// The version selector string is unusable.
    #[error("invalid version selector \"{value}\": {reason}")]
    InvalidVersion {
        /// The rejected selector.
        value: String,
        /// Description of the validation failure.
        reason: String,
    },
}

impl FetchError {
    /// Wrap an I/O error with the path it concerns.
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors that can occur while running the kit CLI.
#[derive(Debug, Error)]
pub enum KitError {
    /// Fetching the kit binary failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// `login` was requested without a registry.
    #[error("no registry configured; pass --registry or set `registry` in the config file")]
    MissingRegistry,

    /// An unpack filter outside the accepted set was supplied.
    #[error("{filter} is not a valid filter; expected one of: {expected}")]
    InvalidFilter {
        /// The rejected filter.
        filter: String,
        /// Comma-separated list of accepted filters.
        expected: String,
    },

    /// The kit process exited unsuccessfully.
    #[error("kit {command} failed ({status}): {stderr}")]
    CommandFailed {
        /// The kit subcommand that was run.
        command: String,
        /// Rendered exit status.
        status: String,
        /// Trimmed standard error of the process.
        stderr: String,
    },

    /// The kit process could not be spawned or fed input.
    #[error("could not run kit: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors reported by the `kit-fetcher` binary.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Fetching the release failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Running kit failed.
    #[error(transparent)]
    Kit(#[from] KitError),

    /// No destination was given and the platform has no data directory.
    #[error("no destination directory; pass --dest or set `destination` in the config file")]
    NoDestination,

    /// `login` was requested without a password in the environment.
    #[error("{variable} is not set; login reads the registry password from it")]
    MissingPassword {
        /// Name of the environment variable.
        variable: &'static str,
    },

    /// Writing output or reading the working directory failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias using [`FetchError`].
pub type Result<T> = std::result::Result<T, FetchError>;

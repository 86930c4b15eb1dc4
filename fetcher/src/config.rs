//! Fetcher configuration.
//!
//! Settings come from an optional `kit-fetcher.toml` file and are then
//! overridden by command-line flags. Every key has a default, so an empty
//! file (or no file at all) yields a working configuration.

use crate::kit::RegistryOptions;
use crate::release::assets::{AssetNames, DEFAULT_ARCHIVE_NAME, DEFAULT_CHECKSUM_SUFFIX};
use crate::release::client::{
    DEFAULT_API_BASE, DEFAULT_REPOSITORY, DEFAULT_TIMEOUT, ReleaseEndpoint,
};
use crate::release::model::LATEST;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "kit-fetcher.toml";

/// Default name of the binary inside the release archive.
pub const DEFAULT_BINARY_NAME: &str = "kit";

/// Errors arising from loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("could not read {path}: {source}")]
    Read {
        /// Path of the configuration file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML or has unknown keys.
    #[error("invalid configuration in {path}: {reason}")]
    Parse {
        /// Path of the configuration file.
        path: Utf8PathBuf,
        /// Description of the parse error.
        reason: String,
    },
}

/// Complete fetcher configuration.
///
/// # Examples
///
/// ```
/// use kit_fetcher::config::FetcherConfig;
///
/// let config = FetcherConfig::from_toml_str("version = \"v1.2.3\"\nplain_http = true\n").unwrap();
/// assert_eq!(config.version, "v1.2.3");
/// assert!(config.plain_http);
/// assert_eq!(config.binary_name, "kit");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetcherConfig {
    /// GitHub REST API base URL.
    pub api_base: String,
    /// Repository publishing releases, in `owner/name` form.
    pub repository: String,
    /// Exact name of the platform archive asset.
    pub archive_name: String,
    /// Suffix identifying the checksum manifest asset.
    pub checksum_suffix: String,
    /// Name of the binary expected inside the archive.
    pub binary_name: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Version selector: a tag or `latest`.
    pub version: String,
    /// Registry used by `login`.
    pub registry: Option<String>,
    /// Whether registry traffic uses plain HTTP.
    pub plain_http: bool,
    /// Where the archive is extracted.
    pub destination: Option<Utf8PathBuf>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_owned(),
            repository: DEFAULT_REPOSITORY.to_owned(),
            archive_name: DEFAULT_ARCHIVE_NAME.to_owned(),
            checksum_suffix: DEFAULT_CHECKSUM_SUFFIX.to_owned(),
            binary_name: DEFAULT_BINARY_NAME.to_owned(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            version: LATEST.to_owned(),
            registry: None,
            plain_http: false,
            destination: None,
        }
    }
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    /// Version selector override.
    pub version: Option<String>,
    /// Registry override.
    pub registry: Option<String>,
    /// Forces plain HTTP on when set.
    pub plain_http: bool,
    /// Destination directory override.
    pub destination: Option<Utf8PathBuf>,
}

impl FetcherConfig {
    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed TOML, unknown keys, or a
    /// zero timeout.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        parse(contents, Utf8PathBuf::from("<inline>"))
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, `kit-fetcher.toml` in
    /// `working_dir` is used when present, otherwise defaults apply.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it is invalid.
    pub fn load(explicit: Option<&Utf8Path>, working_dir: &Utf8Path) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => path.to_owned(),
            None => {
                let candidate = working_dir.join(CONFIG_FILE_NAME);
                if !candidate.is_file() {
                    return Ok(Self::default());
                }
                candidate
            }
        };

        let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        parse(&contents, path)
    }

    /// Apply command-line overrides.
    #[must_use]
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(version) = overrides.version {
            self.version = version;
        }
        if overrides.registry.is_some() {
            self.registry = overrides.registry;
        }
        if overrides.destination.is_some() {
            self.destination = overrides.destination;
        }
        self.plain_http |= overrides.plain_http;
        self
    }

    /// Endpoint for release metadata.
    #[must_use]
    pub fn endpoint(&self) -> ReleaseEndpoint {
        ReleaseEndpoint {
            api_base: self.api_base.clone(),
            repository: self.repository.clone(),
        }
    }

    /// Names used to select release assets.
    #[must_use]
    pub fn asset_names(&self) -> AssetNames {
        AssetNames {
            archive: self.archive_name.clone(),
            checksum_suffix: self.checksum_suffix.clone(),
        }
    }

    /// Registry settings for kit sessions.
    #[must_use]
    pub fn registry_options(&self) -> RegistryOptions {
        RegistryOptions {
            registry: self.registry.clone(),
            plain_http: self.plain_http,
        }
    }

    /// Request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Destination directory, falling back to the platform data directory.
    #[must_use]
    pub fn destination_dir(&self) -> Option<Utf8PathBuf> {
        self.destination.clone().or_else(default_destination_dir)
    }
}

fn parse(contents: &str, path: Utf8PathBuf) -> Result<FetcherConfig, ConfigError> {
    let config: FetcherConfig = match toml::from_str(contents) {
        Ok(config) => config,
        Err(e) => {
            return Err(ConfigError::Parse {
                path,
                reason: e.to_string(),
            });
        }
    };
    // ureq treats a zero global timeout as already expired.
    if config.timeout_secs == 0 {
        return Err(ConfigError::Parse {
            path,
            reason: "timeout_secs must be at least 1".to_owned(),
        });
    }
    Ok(config)
}

/// Platform default extraction directory,
/// `<data_local_dir>/kit-fetcher/bin`.
#[must_use]
pub fn default_destination_dir() -> Option<Utf8PathBuf> {
    directories_next::BaseDirs::new()
        .and_then(|dirs| Utf8PathBuf::try_from(dirs.data_local_dir().to_path_buf()).ok())
        .map(|p| p.join("kit-fetcher").join("bin"))
}

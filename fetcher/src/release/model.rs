//! Release metadata as returned by the GitHub releases API.
//!
//! Only the fields the fetcher consumes are modelled; unknown fields in
//! the response body are ignored during deserialization.

use crate::error::{FetchError, Result};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Selector string that resolves to the most recent release.
pub const LATEST: &str = "latest";

/// A published, tagged version with its downloadable assets.
///
/// # Examples
///
/// ```
/// use kit_fetcher::release::model::Release;
///
/// let json = r#"{"tag_name":"v1.2.3","assets":[
///     {"name":"kitops-linux-x86_64.tar.gz","browser_download_url":"https://example.test/a"}
/// ]}"#;
/// let release: Release = serde_json::from_str(json).unwrap();
/// assert_eq!(release.tag_name, "v1.2.3");
/// assert_eq!(release.assets.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Release {
    /// The tag the release was published under.
    pub tag_name: String,
    /// Assets attached to the release, in API order.
    #[serde(default)]
    pub assets: Vec<Asset>,
}

/// One file attached to a [`Release`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Asset {
    /// Display name, matched against expected file names.
    pub name: String,
    /// Browser-facing download URL.
    pub browser_download_url: String,
}

impl Asset {
    /// Construct an asset from its name and download URL.
    #[must_use]
    pub fn new(name: impl Into<String>, browser_download_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            browser_download_url: browser_download_url.into(),
        }
    }
}

/// Which release to resolve.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum VersionSelector {
    /// The most recent published release.
    #[default]
    Latest,
    /// The release published under this exact tag.
    Tag(String),
}

impl FromStr for VersionSelector {
    type Err = FetchError;

    fn from_str(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(FetchError::InvalidVersion {
                value: value.to_owned(),
                reason: "version must not be empty".to_owned(),
            });
        }
        if trimmed.chars().any(|c| c.is_whitespace() || c == '/') {
            return Err(FetchError::InvalidVersion {
                value: value.to_owned(),
                reason: "version must not contain whitespace or '/'".to_owned(),
            });
        }
        if trimmed == LATEST {
            Ok(Self::Latest)
        } else {
            Ok(Self::Tag(trimmed.to_owned()))
        }
    }
}

impl fmt::Display for VersionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => f.write_str(LATEST),
            Self::Tag(tag) => f.write_str(tag),
        }
    }
}

//! Release metadata resolution and asset download over HTTP.
//!
//! Provides a trait-based abstraction so the fetch pipeline can be driven
//! by mocks in tests and by a `ureq` agent in production.

use super::model::{Release, VersionSelector};
use crate::error::{FetchError, Result};
use log::debug;
use std::path::Path;
use std::time::Duration;

/// Default GitHub REST API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Default `owner/name` of the repository publishing kit releases.
pub const DEFAULT_REPOSITORY: &str = "jozu-ai/kitops";

/// Default network timeout applied to every request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const GITHUB_ACCEPT: &str = "application/vnd.github+json";

/// Trait for resolving releases and downloading their assets.
///
/// # Examples
///
/// ```
/// use kit_fetcher::release::client::{HttpReleaseClient, ReleaseEndpoint};
///
/// let client = HttpReleaseClient::new(ReleaseEndpoint::default());
/// // Use client.fetch_release(&VersionSelector::Latest) in production
/// # let _ = client;
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait ReleaseClient {
    /// Resolve the release identified by `selector`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Transport`] if the request cannot be completed,
    /// [`FetchError::ReleaseNotFound`] on a non-success status, and
    /// [`FetchError::Decode`] if the body is not a release document.
    fn fetch_release(&self, selector: &VersionSelector) -> Result<Release>;

    /// Download `url` into `dest`, creating or truncating the file.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Transport`], [`FetchError::HttpStatus`], or
    /// [`FetchError::Io`] when writing fails. A partially written file is
    /// left in place.
    fn download(&self, url: &str, dest: &Path) -> Result<()>;
}

/// Where release metadata is served from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseEndpoint {
    /// API base URL without a trailing slash.
    pub api_base: String,
    /// Repository in `owner/name` form.
    pub repository: String,
}

impl Default for ReleaseEndpoint {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_owned(),
            repository: DEFAULT_REPOSITORY.to_owned(),
        }
    }
}

impl ReleaseEndpoint {
    /// Construct the metadata URL for `selector`.
    ///
    /// # Examples
    ///
    /// ```
    /// use kit_fetcher::release::client::ReleaseEndpoint;
    /// use kit_fetcher::release::model::VersionSelector;
    ///
    /// let endpoint = ReleaseEndpoint::default();
    /// assert_eq!(
    ///     endpoint.release_url(&VersionSelector::Latest),
    ///     "https://api.github.com/repos/jozu-ai/kitops/releases/latest",
    /// );
    /// ```
    #[must_use]
    pub fn release_url(&self, selector: &VersionSelector) -> String {
        let base = self.api_base.trim_end_matches('/');
        let repo = &self.repository;
        match selector {
            VersionSelector::Latest => format!("{base}/repos/{repo}/releases/latest"),
            VersionSelector::Tag(tag) => format!("{base}/repos/{repo}/releases/tags/{tag}"),
        }
    }
}

/// HTTP-based client using `ureq`.
///
/// Each client owns its agent; nothing is shared between instances.
pub struct HttpReleaseClient {
    endpoint: ReleaseEndpoint,
    agent: ureq::Agent,
}

impl HttpReleaseClient {
    /// Create a client with the default request timeout.
    #[must_use]
    pub fn new(endpoint: ReleaseEndpoint) -> Self {
        Self::with_timeout(endpoint, DEFAULT_TIMEOUT)
    }

    /// Create a client whose requests fail after `timeout`.
    #[must_use]
    pub fn with_timeout(endpoint: ReleaseEndpoint, timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Self {
            endpoint,
            agent: ureq::Agent::new_with_config(config),
        }
    }

    /// The endpoint this client resolves releases against.
    #[must_use]
    pub fn endpoint(&self) -> &ReleaseEndpoint {
        &self.endpoint
    }
}

impl ReleaseClient for HttpReleaseClient {
    fn fetch_release(&self, selector: &VersionSelector) -> Result<Release> {
        let url = self.endpoint.release_url(selector);
        debug!("resolving release {selector} via {url}");

        let response = self
            .agent
            .get(&url)
            .header("Accept", GITHUB_ACCEPT)
            .call()
            .map_err(|e| match e {
                ureq::Error::StatusCode(status) => FetchError::ReleaseNotFound {
                    selector: selector.to_string(),
                    url: url.clone(),
                    status,
                },
                other => transport_error(&url, &other),
            })?;

        let body = response
            .into_body()
            .read_to_string()
            .map_err(|e| transport_error(&url, &e))?;
        serde_json::from_str(&body).map_err(|e| FetchError::Decode {
            url,
            reason: e.to_string(),
        })
    }

    fn download(&self, url: &str, dest: &Path) -> Result<()> {
        debug!("downloading {url} to {}", dest.display());
        let response = self.agent.get(url).call().map_err(|e| map_ureq_error(url, &e))?;
        let mut file = std::fs::File::create(dest).map_err(|e| FetchError::io(dest, e))?;
        std::io::copy(&mut response.into_body().as_reader(), &mut file)
            .map_err(|e| FetchError::io(dest, e))?;
        Ok(())
    }
}

/// Map a ureq error from an asset download to a [`FetchError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> FetchError {
    match err {
        ureq::Error::StatusCode(status) => FetchError::HttpStatus {
            url: url.to_owned(),
            status: *status,
        },
        other => transport_error(url, other),
    }
}

fn transport_error(url: &str, err: &ureq::Error) -> FetchError {
    FetchError::Transport {
        url: url.to_owned(),
        reason: err.to_string(),
    }
}

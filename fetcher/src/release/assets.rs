//! Selection of the platform archive and checksum manifest from a release.

use super::model::Release;
use crate::error::{FetchError, Result};

/// Default name of the linux/x86_64 archive published with each release.
pub const DEFAULT_ARCHIVE_NAME: &str = "kitops-linux-x86_64.tar.gz";

/// Default suffix of the checksum manifest asset.
pub const DEFAULT_CHECKSUM_SUFFIX: &str = "checksums.txt";

/// Names used to pick assets out of a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetNames {
    /// Exact file name of the platform archive.
    pub archive: String,
    /// Suffix identifying the checksum manifest.
    pub checksum_suffix: String,
}

impl Default for AssetNames {
    fn default() -> Self {
        Self {
            archive: DEFAULT_ARCHIVE_NAME.to_owned(),
            checksum_suffix: DEFAULT_CHECKSUM_SUFFIX.to_owned(),
        }
    }
}

/// Download URLs of the two assets the fetcher needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedAssets {
    /// URL of the platform archive.
    pub archive_url: String,
    /// URL of the checksum manifest.
    pub checksum_url: String,
}

/// Pick the archive and checksum manifest out of `release`.
///
/// The archive must match `names.archive` exactly; the manifest is the
/// asset whose name ends with `names.checksum_suffix`. When several assets
/// qualify the last one in API order wins.
///
/// # Errors
///
/// Returns [`FetchError::AssetNotFound`] naming the first artefact that is
/// missing.
///
/// # Examples
///
/// ```
/// use kit_fetcher::release::assets::{AssetNames, select_assets};
/// use kit_fetcher::release::model::{Asset, Release};
///
/// let release = Release {
///     tag_name: "v1.2.3".to_owned(),
///     assets: vec![
///         Asset::new("kitops-linux-x86_64.tar.gz", "https://example.test/a"),
///         Asset::new("kitops_1.2.3_checksums.txt", "https://example.test/c"),
///     ],
/// };
/// let selected = select_assets(&release, &AssetNames::default()).unwrap();
/// assert_eq!(selected.archive_url, "https://example.test/a");
/// ```
pub fn select_assets(release: &Release, names: &AssetNames) -> Result<SelectedAssets> {
    let mut archive_url = None;
    let mut checksum_url = None;

    for asset in &release.assets {
        if asset.name == names.archive {
            archive_url = Some(asset.browser_download_url.as_str());
        } else if asset.name.ends_with(&names.checksum_suffix) {
            checksum_url = Some(asset.browser_download_url.as_str());
        }
    }

    let archive_url = non_empty(archive_url).ok_or_else(|| FetchError::AssetNotFound {
        tag: release.tag_name.clone(),
        missing: names.archive.clone(),
    })?;
    let checksum_url = non_empty(checksum_url).ok_or_else(|| FetchError::AssetNotFound {
        tag: release.tag_name.clone(),
        missing: format!("*{}", names.checksum_suffix),
    })?;

    Ok(SelectedAssets {
        archive_url: archive_url.to_owned(),
        checksum_url: checksum_url.to_owned(),
    })
}

fn non_empty(url: Option<&str>) -> Option<&str> {
    url.filter(|u| !u.is_empty())
}

//! Checksum manifest parsing.
//!
//! A manifest is UTF-8 text with one `<hex digest> <file name>` record per
//! line, as published alongside release archives.

/// One record of a checksum manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumEntry {
    /// Hex digest exactly as written in the manifest.
    pub digest: String,
    /// File name the digest applies to.
    pub file_name: String,
}

/// Parsed checksum manifest.
///
/// # Examples
///
/// ```
/// use kit_fetcher::checksum::manifest::ChecksumManifest;
///
/// let manifest = ChecksumManifest::parse("abc123  kit.tar.gz\n\n");
/// assert_eq!(manifest.digest_for("kit.tar.gz"), Some("abc123"));
/// assert_eq!(manifest.digest_for("other.tar.gz"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChecksumManifest {
    entries: Vec<ChecksumEntry>,
}

impl ChecksumManifest {
    /// Parse manifest text.
    ///
    /// Lines that do not split into exactly two whitespace-separated
    /// fields are ignored, which covers blank lines.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let entries = text.lines().filter_map(parse_line).collect();
        Self { entries }
    }

    /// Return the digest recorded for `file_name`, if any.
    ///
    /// The first matching line wins.
    #[must_use]
    pub fn digest_for(&self, file_name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.file_name == file_name)
            .map(|entry| entry.digest.as_str())
    }

    /// All parsed records in manifest order.
    #[must_use]
    pub fn entries(&self) -> &[ChecksumEntry] {
        &self.entries
    }
}

fn parse_line(line: &str) -> Option<ChecksumEntry> {
    let mut fields = line.split_whitespace();
    let digest = fields.next()?;
    let file_name = fields.next()?;
    if fields.next().is_some() {
        return None;
    }
    Some(ChecksumEntry {
        digest: digest.to_owned(),
        file_name: file_name.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const MANIFEST: &str = concat!(
        "1111111111111111111111111111111111111111111111111111111111111111  kitops-darwin-arm64.tar.gz\n",
        "\n",
        "2222222222222222222222222222222222222222222222222222222222222222  kitops-linux-x86_64.tar.gz\n",
        "   \n",
        "3333333333333333333333333333333333333333333333333333333333333333\tkitops-windows-x86_64.zip\r\n",
    );

    #[test]
    fn parses_records_and_skips_blank_lines() {
        let manifest = ChecksumManifest::parse(MANIFEST);
        assert_eq!(manifest.entries().len(), 3);
    }

    #[rstest]
    #[case::linux("kitops-linux-x86_64.tar.gz", Some('2'))]
    #[case::tab_separated_crlf("kitops-windows-x86_64.zip", Some('3'))]
    #[case::absent("kitops-linux-arm64.tar.gz", None)]
    #[case::prefix_only("kitops-linux", None)]
    fn looks_up_by_exact_file_name(#[case] file: &str, #[case] digit: Option<char>) {
        let manifest = ChecksumManifest::parse(MANIFEST);
        let expected = digit.map(|d| d.to_string().repeat(64));
        assert_eq!(manifest.digest_for(file), expected.as_deref());
    }

    #[rstest]
    #[case::single_field("deadbeef")]
    #[case::three_fields("deadbeef kit.tar.gz extra")]
    fn malformed_lines_are_ignored(#[case] line: &str) {
        let manifest = ChecksumManifest::parse(line);
        assert!(manifest.entries().is_empty());
    }

    #[test]
    fn first_matching_line_wins() {
        let manifest = ChecksumManifest::parse("aaaa kit.tar.gz\nbbbb kit.tar.gz\n");
        assert_eq!(manifest.digest_for("kit.tar.gz"), Some("aaaa"));
    }
}

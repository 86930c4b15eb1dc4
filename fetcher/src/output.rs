//! User-facing progress output.

use crate::fetch::FetchedRelease;
use std::io::Write;

/// Write one line to `stderr`, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort progress output; ignore write failures.
    }
}

/// Format the summary printed after a successful fetch.
///
/// # Example
///
/// ```
/// use camino::Utf8PathBuf;
/// use kit_fetcher::fetch::FetchedRelease;
/// use kit_fetcher::output::success_message;
///
/// let fetched = FetchedRelease {
///     tag: "v1.2.3".to_owned(),
///     destination: Utf8PathBuf::from("/opt/kit"),
///     binary: Utf8PathBuf::from("/opt/kit/kit"),
///     files: 3,
/// };
/// assert_eq!(
///     success_message(&fetched),
///     "Installed kit v1.2.3 (3 files) to /opt/kit",
/// );
/// ```
#[must_use]
pub fn success_message(fetched: &FetchedRelease) -> String {
    let plural = if fetched.files == 1 { "file" } else { "files" };
    format!(
        "Installed kit {} ({} {plural}) to {}",
        fetched.tag, fetched.files, fetched.destination
    )
}

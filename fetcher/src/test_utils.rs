//! Shared test utilities for the fetcher crate.
//!
//! Builds gzip-compressed tar archives, checksum manifests, and release
//! documents on disk, and provides a recording stand-in for the kit
//! process executor.

use crate::kit::executor::{CommandExecutor, Invocation};
use flate2::Compression;
use flate2::write::GzEncoder;
use sha2::{Digest, Sha256};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::io;
use std::path::Path;
use std::process::{ExitStatus, Output};

/// Return the lowercase hex SHA-256 digest of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Kind of entry to place in a test archive.
#[derive(Debug, Clone, Copy)]
pub enum TarEntryKind<'a> {
    /// A directory marker.
    Dir,
    /// A regular file with the given content.
    File(&'a [u8]),
    /// A symbolic link pointing at the given target.
    Symlink(&'a str),
}

/// One entry of a test archive.
#[derive(Debug, Clone, Copy)]
pub struct TarEntry<'a> {
    /// Relative path inside the archive.
    pub path: &'a str,
    /// Entry kind and payload.
    pub kind: TarEntryKind<'a>,
    /// Recorded permission bits.
    pub mode: u32,
}

impl<'a> TarEntry<'a> {
    /// A directory entry.
    #[must_use]
    pub fn dir(path: &'a str, mode: u32) -> Self {
        Self {
            path,
            kind: TarEntryKind::Dir,
            mode,
        }
    }

    /// A regular file entry.
    #[must_use]
    pub fn file(path: &'a str, content: &'a [u8], mode: u32) -> Self {
        Self {
            path,
            kind: TarEntryKind::File(content),
            mode,
        }
    }

    /// A symbolic link entry.
    #[must_use]
    pub fn symlink(path: &'a str, target: &'a str) -> Self {
        Self {
            path,
            kind: TarEntryKind::Symlink(target),
            mode: 0o777,
        }
    }
}

/// Write `entries` as a gzip-compressed tar archive at `path`.
///
/// Headers carry a fixed modification time so repeated calls produce
/// identical bytes.
///
/// # Errors
///
/// Returns any I/O error raised while writing the archive.
pub fn write_tar_gz(path: &Path, entries: &[TarEntry<'_>]) -> io::Result<()> {
    let file = fs::File::create(path)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for entry in entries {
        let mut header = tar::Header::new_gnu();
        header.set_mode(entry.mode);
        header.set_mtime(0);
        match entry.kind {
            TarEntryKind::Dir => {
                header.set_entry_type(tar::EntryType::Directory);
                header.set_size(0);
                builder.append_data(&mut header, entry.path, io::empty())?;
            }
            TarEntryKind::File(content) => {
                header.set_entry_type(tar::EntryType::Regular);
                header.set_size(content.len() as u64);
                builder.append_data(&mut header, entry.path, content)?;
            }
            TarEntryKind::Symlink(target) => {
                header.set_entry_type(tar::EntryType::Symlink);
                header.set_size(0);
                builder.append_link(&mut header, entry.path, target)?;
            }
        }
    }

    builder.into_inner()?.finish()?;
    Ok(())
}

/// Render a checksum manifest line for `file_name` with `digest`.
#[must_use]
pub fn checksum_line(digest: &str, file_name: &str) -> String {
    format!("{digest}  {file_name}\n")
}

/// Render a GitHub release document with the given tag and assets.
#[must_use]
pub fn release_json(tag: &str, assets: &[(&str, &str)]) -> String {
    let assets: Vec<serde_json::Value> = assets
        .iter()
        .map(|(name, url)| serde_json::json!({ "name": name, "browser_download_url": url }))
        .collect();
    serde_json::json!({ "tag_name": tag, "assets": assets }).to_string()
}

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code as u32)
}

/// Creates a command `Output` with the given exit code and stderr.
#[must_use]
pub fn output(code: i32, stderr: &str) -> Output {
    Output {
        status: exit_status(code),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// Records kit invocations and replays canned outputs.
///
/// When the queue of outputs is exhausted every further call succeeds
/// with empty output.
#[derive(Debug, Default)]
pub struct StubExecutor {
    outputs: RefCell<VecDeque<Output>>,
    calls: RefCell<Vec<Invocation>>,
}

impl StubExecutor {
    /// Create a stub that replays `outputs` in order.
    #[must_use]
    pub fn new(outputs: Vec<Output>) -> Self {
        Self {
            outputs: RefCell::new(outputs.into()),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Invocations received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.borrow().clone()
    }
}

impl CommandExecutor for StubExecutor {
    fn run(&self, invocation: &Invocation) -> io::Result<Output> {
        self.calls.borrow_mut().push(invocation.clone());
        Ok(self
            .outputs
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| output(0, "")))
    }
}

//! Archive extraction for verified release archives.
//!
//! Unpacks gzip-compressed tar streams into a destination directory.
//! Only directories and regular files are materialised; symlinks, hard
//! links, device nodes and other entry types are skipped. Entry paths are
//! validated before anything is written so an archive cannot escape the
//! destination.

use flate2::read::GzDecoder;
use log::{trace, warn};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Trait for extracting release archives, enabling test mocking.
///
/// # Examples
///
/// ```
/// use kit_fetcher::extraction::TarGzExtractor;
///
/// let extractor = TarGzExtractor;
/// // Use extractor.extract(archive_path, dest_dir) in production
/// # let _ = extractor;
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait ArchiveExtractor {
    /// Extract the archive at `archive_path` into `dest_dir`.
    ///
    /// Returns the relative paths of the regular files written, in
    /// archive order.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::PathTraversal`] if any entry attempts to
    /// escape the destination directory and [`ExtractionError::Io`] on
    /// read, write, or decompression failures. Files written before the
    /// failure are left in place.
    fn extract(&self, archive_path: &Path, dest_dir: &Path)
    -> Result<Vec<PathBuf>, ExtractionError>;
}

/// Errors arising from archive extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// I/O or decompression error during extraction.
    #[error("extraction I/O error: {0}")]
    Io(#[from] io::Error),

    /// A path in the archive attempts to traverse outside the destination.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The offending path from the archive entry.
        path: String,
    },
}

/// Default extractor using the `tar` and `flate2` crates.
#[derive(Debug, Clone, Copy, Default)]
pub struct TarGzExtractor;

impl ArchiveExtractor for TarGzExtractor {
    fn extract(
        &self,
        archive_path: &Path,
        dest_dir: &Path,
    ) -> Result<Vec<PathBuf>, ExtractionError> {
        let file = fs::File::open(archive_path)?;
        let mut archive = tar::Archive::new(GzDecoder::new(file));
        let mut extracted = Vec::new();

        for entry_result in archive.entries()? {
            let mut entry = entry_result?;
            let entry_path = entry.path()?.into_owned();
            validate_entry_path(&entry_path)?;

            let entry_type = entry.header().entry_type();
            let mode = entry.header().mode()?;
            let dest_path = dest_dir.join(&entry_path);

            if entry_type.is_dir() {
                trace!("creating directory {}", dest_path.display());
                fs::create_dir_all(&dest_path)?;
                set_mode(&dest_path, mode)?;
            } else if entry_type.is_file() {
                trace!("writing file {}", dest_path.display());
                if let Some(parent) = dest_path.parent() {
                    fs::create_dir_all(parent)?;
                }
                let mut output = create_file(&dest_path, mode)?;
                io::copy(&mut entry, &mut output)?;
                set_mode(&dest_path, mode)?;
                extracted.push(entry_path);
            } else {
                warn!(
                    "skipping unsupported archive entry {} ({entry_type:?})",
                    entry_path.display()
                );
            }
        }

        Ok(extracted)
    }
}

/// Validate that a tar entry path does not escape the destination
/// directory via `..` components or absolute paths.
fn validate_entry_path(path: &Path) -> Result<(), ExtractionError> {
    let escapes = path.components().any(|component| {
        matches!(
            component,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if escapes {
        return Err(ExtractionError::PathTraversal {
            path: path.display().to_string(),
        });
    }
    Ok(())
}

#[cfg(unix)]
fn create_file(path: &Path, mode: u32) -> io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;

    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(mode & 0o7777)
        .open(path)
}

#[cfg(not(unix))]
fn create_file(path: &Path, _mode: u32) -> io::Result<fs::File> {
    fs::File::create(path)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{TarEntry, write_tar_gz};
    use rstest::rstest;
    use std::collections::{BTreeMap, BTreeSet};

    fn extract_into(entries: &[TarEntry<'_>]) -> (tempfile::TempDir, PathBuf, Vec<PathBuf>) {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let archive_path = temp_dir.path().join("test.tar.gz");
        write_tar_gz(&archive_path, entries).expect("write archive");
        let dest_dir = temp_dir.path().join("out");
        fs::create_dir_all(&dest_dir).expect("create dest");

        let files = TarGzExtractor
            .extract(&archive_path, &dest_dir)
            .expect("extract");
        (temp_dir, dest_dir, files)
    }

    #[test]
    fn extracts_directories_and_files() {
        let (_temp, dest, files) = extract_into(&[
            TarEntry::dir("docs", 0o755),
            TarEntry::file("docs/README.md", b"# kit", 0o644),
            TarEntry::file("kit", b"\x7fELF", 0o755),
        ]);

        assert_eq!(
            files,
            vec![PathBuf::from("docs/README.md"), PathBuf::from("kit")]
        );
        assert!(dest.join("docs").is_dir());
        assert_eq!(fs::read(dest.join("kit")).expect("read kit"), b"\x7fELF");
    }

    /// Directories and file contents under `root`, keyed by relative path.
    fn tree_of(root: &Path) -> (BTreeSet<PathBuf>, BTreeMap<PathBuf, Vec<u8>>) {
        fn walk(
            root: &Path,
            dir: &Path,
            dirs: &mut BTreeSet<PathBuf>,
            files: &mut BTreeMap<PathBuf, Vec<u8>>,
        ) {
            for entry in fs::read_dir(dir).expect("read dir") {
                let path = entry.expect("dir entry").path();
                let relative = path.strip_prefix(root).expect("under root").to_path_buf();
                if path.is_dir() {
                    dirs.insert(relative);
                    walk(root, &path, dirs, files);
                } else {
                    files.insert(relative, fs::read(&path).expect("read file"));
                }
            }
        }
        let mut dirs = BTreeSet::new();
        let mut files = BTreeMap::new();
        walk(root, root, &mut dirs, &mut files);
        (dirs, files)
    }

    #[test]
    fn packed_tree_extracts_to_identical_tree() {
        use flate2::Compression;
        use flate2::write::GzEncoder;

        let temp_dir = tempfile::tempdir().expect("temp dir");
        let source = temp_dir.path().join("source");
        fs::create_dir_all(source.join("docs/guides")).expect("create docs");
        fs::create_dir_all(source.join("models/empty")).expect("create empty dir");
        fs::write(source.join("kit"), b"\x7fELF\x02\x01binary").expect("write kit");
        fs::write(source.join("docs/README.md"), b"# kit\n").expect("write readme");
        fs::write(source.join("docs/guides/pack.md"), b"kit pack .\n").expect("write guide");
        fs::write(source.join("models/weights.bin"), vec![0_u8, 255, 7, 42]).expect("write weights");

        let archive_path = temp_dir.path().join("tree.tar.gz");
        let file = fs::File::create(&archive_path).expect("create archive");
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
        builder.append_dir_all("tree", &source).expect("append tree");
        builder
            .into_inner()
            .and_then(GzEncoder::finish)
            .expect("finish archive");

        let dest = temp_dir.path().join("out");
        fs::create_dir_all(&dest).expect("create dest");
        TarGzExtractor
            .extract(&archive_path, &dest)
            .expect("extract");

        let (source_dirs, source_files) = tree_of(&source);
        let (extracted_dirs, extracted_files) = tree_of(&dest.join("tree"));
        assert_eq!(extracted_dirs, source_dirs);
        assert_eq!(extracted_files, source_files);
        assert!(source_dirs.contains(Path::new("models/empty")));
        assert_eq!(source_files.len(), 4);
    }

    #[cfg(unix)]
    #[test]
    fn preserves_recorded_permission_bits() {
        use std::os::unix::fs::PermissionsExt;

        let (_temp, dest, _files) = extract_into(&[
            TarEntry::file("kit", b"binary", 0o755),
            TarEntry::file("LICENSE", b"text", 0o600),
        ]);

        let kit_mode = fs::metadata(dest.join("kit")).expect("stat").permissions().mode();
        let licence_mode = fs::metadata(dest.join("LICENSE"))
            .expect("stat")
            .permissions()
            .mode();
        assert_eq!(kit_mode & 0o777, 0o755);
        assert_eq!(licence_mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn skips_symlinks() {
        let (_temp, dest, files) = extract_into(&[
            TarEntry::file("kit", b"binary", 0o755),
            TarEntry::symlink("kit-link", "kit"),
        ]);

        assert_eq!(files, vec![PathBuf::from("kit")]);
        assert!(fs::symlink_metadata(dest.join("kit-link")).is_err());
    }

    #[test]
    fn files_without_directory_entries_get_parents() {
        let (_temp, dest, _files) =
            extract_into(&[TarEntry::file("nested/deeper/kit", b"binary", 0o755)]);
        assert!(dest.join("nested/deeper/kit").is_file());
    }

    #[test]
    fn existing_files_are_truncated() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let dest = temp_dir.path().join("out");
        fs::create_dir_all(&dest).expect("create dest");
        fs::write(dest.join("kit"), b"a much longer previous binary").expect("seed");

        let archive_path = temp_dir.path().join("test.tar.gz");
        write_tar_gz(&archive_path, &[TarEntry::file("kit", b"new", 0o755)]).expect("archive");
        TarGzExtractor
            .extract(&archive_path, &dest)
            .expect("extract");

        assert_eq!(fs::read(dest.join("kit")).expect("read"), b"new");
    }

    #[test]
    fn empty_archive_extracts_nothing() {
        let (_temp, dest, files) = extract_into(&[]);
        assert!(files.is_empty());
        assert_eq!(fs::read_dir(dest).expect("read dir").count(), 0);
    }

    #[test]
    fn corrupt_stream_is_io_error() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let archive_path = temp_dir.path().join("broken.tar.gz");
        fs::write(&archive_path, b"definitely not gzip").expect("write");

        let result = TarGzExtractor.extract(&archive_path, temp_dir.path());
        assert!(matches!(result, Err(ExtractionError::Io(_))));
    }

    #[rstest]
    #[case::parent_dir("../escape.txt")]
    #[case::nested_parent("foo/../../escape.txt")]
    #[case::absolute("/etc/passwd")]
    fn rejects_path_traversal(#[case] bad_path: &str) {
        let result = validate_entry_path(Path::new(bad_path));
        assert!(
            matches!(result, Err(ExtractionError::PathTraversal { .. })),
            "expected PathTraversal for {bad_path}"
        );
    }

    #[rstest]
    #[case::plain("kit")]
    #[case::nested("lib/libfoo.so")]
    #[case::current_dir("./kit")]
    fn accepts_relative_paths(#[case] path: &str) {
        assert!(validate_entry_path(Path::new(path)).is_ok());
    }
}

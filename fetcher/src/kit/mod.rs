//! Invocation of the fetched `kit` binary.
//!
//! A [`KitSession`] binds one fetched binary to the registry settings of a
//! single operation. Sessions hold no state between calls; construct one
//! per operation.
//!
//! # Sub-modules
//!
//! - [`executor`] - Command line assembly and process execution.

pub mod executor;

use crate::error::KitError;
use camino::{Utf8Path, Utf8PathBuf};
use executor::{CommandExecutor, Invocation};
use log::debug;

/// Flag appended when the registry speaks plain HTTP.
pub const PLAIN_HTTP_FLAG: &str = "--plain-http";

/// Filters accepted by `kit unpack`.
pub const UNPACK_FILTERS: &[&str] = &["--docs", "--code", "--model", "--datasets", "--kitfile"];

/// Registry settings for a kit session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryOptions {
    /// Registry host used by `login`.
    pub registry: Option<String>,
    /// Whether to talk to the registry over plain HTTP.
    pub plain_http: bool,
}

/// A fetched kit binary plus the registry settings to run it with.
pub struct KitSession<'a> {
    binary: Utf8PathBuf,
    options: RegistryOptions,
    executor: &'a dyn CommandExecutor,
}

impl<'a> KitSession<'a> {
    /// Create a session running `binary` through `executor`.
    #[must_use]
    pub fn new(
        binary: Utf8PathBuf,
        options: RegistryOptions,
        executor: &'a dyn CommandExecutor,
    ) -> Self {
        Self {
            binary,
            options,
            executor,
        }
    }

    /// Path of the kit binary this session runs.
    #[must_use]
    pub fn binary(&self) -> &Utf8Path {
        &self.binary
    }

    /// Log in to the configured registry.
    ///
    /// The password is written to the process's standard input rather than
    /// placed on the command line.
    ///
    /// # Errors
    ///
    /// Returns [`KitError::MissingRegistry`] when no registry is
    /// configured, or [`KitError::CommandFailed`] if kit rejects the login.
    pub fn login(&self, username: &str, password: &str) -> Result<(), KitError> {
        let registry = self
            .options
            .registry
            .as_deref()
            .ok_or(KitError::MissingRegistry)?;
        let invocation = self
            .command("login")
            .args(["-v", registry, "-u", username, "--password-stdin"])
            .stdin(password);
        self.run("login", self.with_plain_http(invocation))
    }

    /// Pack `directory` into a ModelKit tagged `reference`.
    ///
    /// Runs from inside `directory`; `kitfile` overrides the Kitfile kit
    /// would otherwise discover there. Relative paths are resolved against
    /// the caller's working directory before kit starts.
    ///
    /// # Errors
    ///
    /// Returns [`KitError::Io`] if a path cannot be made absolute, or
    /// [`KitError::CommandFailed`] if kit exits unsuccessfully.
    pub fn pack(
        &self,
        directory: &Utf8Path,
        reference: &str,
        kitfile: Option<&Utf8Path>,
    ) -> Result<(), KitError> {
        // kit starts inside `directory`, so every path it is given is absolute.
        let directory = absolute(directory)?;
        let mut invocation = Invocation::new(absolute(&self.binary)?.into_std_path_buf())
            .arg("pack")
            .args([directory.as_str(), "-t", reference])
            .current_dir(directory.as_std_path());
        if let Some(kitfile) = kitfile {
            let kitfile = absolute(kitfile)?;
            invocation = invocation.args(["-f", kitfile.as_str()]);
        }
        self.run("pack", invocation)
    }

    /// Unpack `reference` into `destination`, optionally limited by filters.
    ///
    /// Returns the destination directory.
    ///
    /// # Errors
    ///
    /// Returns [`KitError::InvalidFilter`] before running anything if a
    /// filter is not one of [`UNPACK_FILTERS`], or
    /// [`KitError::CommandFailed`] if kit exits unsuccessfully.
    pub fn unpack(
        &self,
        reference: &str,
        destination: &Utf8Path,
        filters: &[String],
    ) -> Result<Utf8PathBuf, KitError> {
        validate_filters(filters)?;
        let invocation = self
            .command("unpack")
            .args([reference, "-d", destination.as_str()])
            .args(filters.iter().map(String::as_str));
        self.run("unpack", self.with_plain_http(invocation))?;
        Ok(destination.to_owned())
    }

    /// Pull `reference` into the local kit store.
    ///
    /// # Errors
    ///
    /// Returns [`KitError::CommandFailed`] if kit exits unsuccessfully.
    pub fn pull(&self, reference: &str) -> Result<(), KitError> {
        let invocation = self.command("pull").arg(reference);
        self.run("pull", self.with_plain_http(invocation))
    }

    /// Push `reference` to its registry.
    ///
    /// # Errors
    ///
    /// Returns [`KitError::CommandFailed`] if kit exits unsuccessfully.
    pub fn push(&self, reference: &str) -> Result<(), KitError> {
        let invocation = self.command("push").arg(reference);
        self.run("push", self.with_plain_http(invocation))
    }

    /// Tag `current` as `new`.
    ///
    /// # Errors
    ///
    /// Returns [`KitError::CommandFailed`] if kit exits unsuccessfully.
    pub fn tag(&self, current: &str, new: &str) -> Result<(), KitError> {
        let invocation = self.command("tag").args([current, new]);
        self.run("tag", self.with_plain_http(invocation))
    }

    fn command(&self, subcommand: &str) -> Invocation {
        Invocation::new(self.binary.as_std_path()).arg(subcommand)
    }

    fn with_plain_http(&self, invocation: Invocation) -> Invocation {
        if self.options.plain_http {
            invocation.arg(PLAIN_HTTP_FLAG)
        } else {
            invocation
        }
    }

    fn run(&self, subcommand: &str, invocation: Invocation) -> Result<(), KitError> {
        debug!("running {} {}", self.binary, subcommand);
        let output = self.executor.run(&invocation)?;
        if output.status.success() {
            return Ok(());
        }
        Err(KitError::CommandFailed {
            command: subcommand.to_owned(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        })
    }
}

fn absolute(path: &Utf8Path) -> Result<Utf8PathBuf, KitError> {
    let path = std::path::absolute(path)?;
    Ok(Utf8PathBuf::try_from(path).map_err(camino::FromPathBufError::into_io_error)?)
}

/// Reject any filter outside [`UNPACK_FILTERS`].
///
/// # Errors
///
/// Returns [`KitError::InvalidFilter`] naming the first rejected filter.
///
/// # Examples
///
/// ```
/// use kit_fetcher::kit::validate_filters;
///
/// assert!(validate_filters(&["--model".to_owned()]).is_ok());
/// assert!(validate_filters(&["--weights".to_owned()]).is_err());
/// ```
pub fn validate_filters(filters: &[String]) -> Result<(), KitError> {
    match filters.iter().find(|f| !UNPACK_FILTERS.contains(&f.as_str())) {
        Some(filter) => Err(KitError::InvalidFilter {
            filter: filter.clone(),
            expected: UNPACK_FILTERS.join(", "),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests;

//! CLI argument definitions for the kit fetcher.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the main entrypoint to keep the binary small and focused on
//! orchestration.

use crate::config::ConfigOverrides;
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

/// Environment variable holding the registry password for `login`.
pub const PASSWORD_ENV: &str = "KIT_PASSWORD";

/// Download a verified KitOps release and drive the kit CLI.
#[derive(Parser, Debug)]
#[command(name = "kit-fetcher")]
#[command(version, about)]
#[command(long_about = concat!(
    "Download a verified KitOps release and drive the kit CLI.\n\n",
    "The fetcher resolves a release from the GitHub releases API, downloads the ",
    "platform archive and its checksum manifest, verifies the SHA-256 digest, ",
    "and only then extracts the archive. The kit subcommands run against the ",
    "fetched binary, fetching it first when it is not yet present.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Fetch the latest release into the default directory:\n",
    "    $ kit-fetcher fetch\n\n",
    "  Fetch a tagged release into ./bin:\n",
    "    $ kit-fetcher --kit-version v1.2.3 --dest ./bin fetch\n\n",
    "  Log in to a local registry (password from KIT_PASSWORD):\n",
    "    $ kit-fetcher --registry localhost:5000 --plain-http login -u jozu\n\n",
    "  Unpack only the model layer:\n",
    "    $ kit-fetcher unpack localhost:5000/m:v1 -d ./out --filter --model",
))]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Options accepted before or after any subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Configuration file [default: ./kit-fetcher.toml when present].
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<Utf8PathBuf>,

    /// Release to fetch: a tag such as v1.2.3, or "latest".
    #[arg(long, value_name = "VERSION", global = true)]
    pub kit_version: Option<String>,

    /// Registry host used by login.
    #[arg(long, value_name = "HOST", global = true)]
    pub registry: Option<String>,

    /// Talk to the registry over plain HTTP.
    #[arg(long, global = true)]
    pub plain_http: bool,

    /// Directory the release is extracted into [default: platform-specific].
    #[arg(long, value_name = "DIR", global = true)]
    pub dest: Option<Utf8PathBuf>,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet",
        global = true
    )]
    pub verbosity: u8,

    /// Suppress progress output (errors still shown).
    #[arg(short, long, conflicts_with = "verbosity", global = true)]
    pub quiet: bool,
}

impl GlobalArgs {
    /// Configuration values supplied on the command line.
    #[must_use]
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            version: self.kit_version.clone(),
            registry: self.registry.clone(),
            plain_http: self.plain_http,
            destination: self.dest.clone(),
        }
    }

    /// Default log filter for the chosen verbosity.
    ///
    /// # Examples
    ///
    /// ```
    /// use kit_fetcher::cli::GlobalArgs;
    ///
    /// let args = GlobalArgs { verbosity: 2, ..GlobalArgs::default() };
    /// assert_eq!(args.log_filter(), "debug");
    /// ```
    #[must_use]
    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Fetch, verify, and extract a kit release; print the binary path.
    Fetch,

    /// Log in to the configured registry.
    Login(LoginArgs),

    /// Pack a directory into a ModelKit.
    Pack(PackArgs),

    /// Unpack a ModelKit into a directory.
    Unpack(UnpackArgs),

    /// Pull a ModelKit into the local store.
    Pull(ReferenceArgs),

    /// Push a ModelKit to its registry.
    Push(ReferenceArgs),

    /// Tag a ModelKit with a new reference.
    Tag(TagArgs),
}

/// Arguments for the login command.
#[derive(Args, Debug, Clone)]
pub struct LoginArgs {
    /// Registry user name; the password is read from KIT_PASSWORD.
    #[arg(short, long, value_name = "USER")]
    pub username: String,
}

/// Arguments for the pack command.
#[derive(Args, Debug, Clone)]
pub struct PackArgs {
    /// Directory holding the Kitfile and its content.
    #[arg(value_name = "DIR")]
    pub directory: Utf8PathBuf,

    /// Reference to tag the packed ModelKit with.
    #[arg(short, long, value_name = "REF")]
    pub tag: String,

    /// Kitfile to use instead of the one in DIR.
    #[arg(short = 'f', long, value_name = "KITFILE")]
    pub kitfile: Option<Utf8PathBuf>,
}

/// Arguments for the unpack command.
#[derive(Args, Debug, Clone)]
pub struct UnpackArgs {
    /// ModelKit reference to unpack.
    #[arg(value_name = "REF")]
    pub reference: String,

    /// Destination directory.
    #[arg(short = 'd', long = "dir", value_name = "DIR")]
    pub directory: Utf8PathBuf,

    /// Limit unpacking to a layer (--docs, --code, --model, --datasets, --kitfile).
    #[arg(long = "filter", value_name = "FILTER", allow_hyphen_values = true)]
    pub filters: Vec<String>,
}

/// A single ModelKit reference.
#[derive(Args, Debug, Clone)]
pub struct ReferenceArgs {
    /// ModelKit reference.
    #[arg(value_name = "REF")]
    pub reference: String,
}

/// Arguments for the tag command.
#[derive(Args, Debug, Clone)]
pub struct TagArgs {
    /// Existing reference.
    #[arg(value_name = "CURRENT")]
    pub current: String,

    /// New reference.
    #[arg(value_name = "NEW")]
    pub new: String,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;

//! Kit fetcher CLI entrypoint.
//!
//! This binary fetches a verified KitOps release and runs the kit CLI
//! against it. `fetch` prints the path of the extracted binary on standard
//! output; progress and errors go to standard error.

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use kit_fetcher::cli::{Cli, Command, PASSWORD_ENV};
use kit_fetcher::config::FetcherConfig;
use kit_fetcher::error::{CliError, FetchError, KitError};
use kit_fetcher::fetch::{FetchRequest, FetchedRelease, fetch_release};
use kit_fetcher::kit::KitSession;
use kit_fetcher::kit::executor::SystemCommandExecutor;
use kit_fetcher::output::{success_message, write_stderr_line};
use kit_fetcher::release::model::VersionSelector;
use log::debug;
use std::io::Write;

struct RunContext<'a> {
    config: &'a FetcherConfig,
    destination: &'a Utf8Path,
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.global.log_filter());
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stdout, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

/// Initialise `env_logger`; `RUST_LOG` takes precedence over `default_filter`.
fn init_logging(default_filter: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn run(cli: &Cli, stdout: &mut dyn Write, stderr: &mut dyn Write) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let destination = config.destination_dir().ok_or(CliError::NoDestination)?;
    let context = RunContext {
        config: &config,
        destination: &destination,
        quiet: cli.global.quiet,
    };

    match &cli.command {
        Command::Fetch => {
            let fetched = fetch(&context, stderr)?;
            if !context.quiet {
                write_stderr_line(stderr, success_message(&fetched));
            }
            writeln!(stdout, "{}", fetched.binary)?;
        }
        Command::Login(args) => {
            let password = read_password()?;
            with_session(&context, stderr, |session| {
                session.login(&args.username, &password)
            })?;
        }
        Command::Pack(args) => with_session(&context, stderr, |session| {
            session.pack(&args.directory, &args.tag, args.kitfile.as_deref())
        })?,
        Command::Unpack(args) => {
            let unpacked = with_session(&context, stderr, |session| {
                session.unpack(&args.reference, &args.directory, &args.filters)
            })?;
            writeln!(stdout, "{unpacked}")?;
        }
        Command::Pull(args) => {
            with_session(&context, stderr, |session| session.pull(&args.reference))?;
        }
        Command::Push(args) => {
            with_session(&context, stderr, |session| session.push(&args.reference))?;
        }
        Command::Tag(args) => with_session(&context, stderr, |session| {
            session.tag(&args.current, &args.new)
        })?,
    }

    Ok(())
}

/// Load the configuration file and apply command-line overrides.
fn load_config(cli: &Cli) -> Result<FetcherConfig, CliError> {
    let cwd = Utf8PathBuf::try_from(std::env::current_dir()?)
        .map_err(camino::FromPathBufError::into_io_error)?;
    let config = FetcherConfig::load(cli.global.config.as_deref(), &cwd)?;
    Ok(config.with_overrides(cli.global.overrides()))
}

/// Fetch, verify, and extract the configured release.
fn fetch(context: &RunContext<'_>, stderr: &mut dyn Write) -> Result<FetchedRelease, FetchError> {
    let selector: VersionSelector = context.config.version.parse()?;
    let request = FetchRequest {
        selector,
        assets: context.config.asset_names(),
        binary_name: &context.config.binary_name,
        destination: context.destination,
        quiet: context.quiet,
    };
    fetch_release(
        &request,
        context.config.endpoint(),
        context.config.timeout(),
        stderr,
    )
}

/// Return the kit binary in the destination, fetching it when absent.
fn ensure_binary(
    context: &RunContext<'_>,
    stderr: &mut dyn Write,
) -> Result<Utf8PathBuf, FetchError> {
    let binary = context.destination.join(&context.config.binary_name);
    if binary.is_file() {
        debug!("using existing kit binary at {binary}");
        return Ok(binary);
    }
    Ok(fetch(context, stderr)?.binary)
}

/// Run `action` against a session bound to the kit binary.
fn with_session<T>(
    context: &RunContext<'_>,
    stderr: &mut dyn Write,
    action: impl FnOnce(&KitSession<'_>) -> Result<T, KitError>,
) -> Result<T, CliError> {
    let binary = ensure_binary(context, stderr)?;
    let executor = SystemCommandExecutor;
    let session = KitSession::new(binary, context.config.registry_options(), &executor);
    Ok(action(&session)?)
}

fn read_password() -> Result<String, CliError> {
    std::env::var(PASSWORD_ENV).map_err(|_| CliError::MissingPassword {
        variable: PASSWORD_ENV,
    })
}

fn exit_code_for_run_result(result: Result<(), CliError>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, format_args!("error: {err}"));
            1
        }
    }
}

//! Command-line front-end.

use std::path::PathBuf;

use clap::{ArgGroup, Parser};
use engine::CancellationFlag;
use thiserror::Error;
use tracing::trace;
use tracing_subscriber::EnvFilter;

use crate::directive::{DirectiveError, UpdateDirective};
use crate::updater::{UpdateError, Updater};

/// Updates an AppImage in place using the zsync delta protocol.
#[derive(Debug, Parser)]
#[command(
    name = "appimage-update",
    version,
    about = "Delta updater for AppImages using the zsync file format",
    group(ArgGroup::new("source").required(true).args(["update_information", "url"]))
)]
struct Args {
    /// AppImage to update (used as the delta seed).
    target: PathBuf,

    /// Update-information string, e.g. `zsync|https://.../app.AppImage.zsync`.
    #[arg(short = 'u', long = "update-information")]
    update_information: Option<String>,

    /// URL of the `.zsync` control file, bypassing update-information parsing.
    #[arg(long)]
    url: Option<String>,

    /// Only check whether an update is available; exit 0 if one is, 1 if the
    /// target is already current.
    #[arg(long)]
    check: bool,

    /// Increase log verbosity (repeatable).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Directive(#[from] DirectiveError),

    #[error("`{0}` updates require an external release resolver; pass --url with the resolved .zsync URL")]
    Unsupported(&'static str),

    #[error(transparent)]
    Update(#[from] UpdateError),
}

/// Entry point for the `appimage-update` binary; returns the process exit
/// code.
#[must_use]
pub fn run() -> i32 {
    let args = Args::parse();
    init_tracing(args.verbose);

    match try_run(&args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            1
        }
    }
}

fn try_run(args: &Args) -> Result<i32, CliError> {
    let control_url = match (&args.url, &args.update_information) {
        (Some(url), _) => url.clone(),
        (None, Some(info)) => match UpdateDirective::parse(info)? {
            UpdateDirective::Zsync { url } => url,
            other => return Err(CliError::Unsupported(other.method())),
        },
        // clap's arg group guarantees one of the two is present.
        (None, None) => unreachable!("clap enforces the source group"),
    };

    let target = args.target.display().to_string();
    let mut updater = Updater::new(control_url, args.target.clone());

    println!("Looking for updates of: {target}");
    let available = updater.lookup().map_err(CliError::Update)?;

    if args.check {
        if available {
            println!("Update available for: {target}");
            return Ok(0);
        }
        println!("No updates were found for: {target}");
        return Ok(1);
    }

    if !available {
        println!("No updates were found for: {target}");
        return Ok(0);
    }

    let cancel = CancellationFlag::new();
    let report = updater.update(&cancel, |event| trace!(?event, "progress"))?;

    println!(
        "Update downloaded to: {} ({} bytes reused, {} bytes fetched)",
        report.output.display(),
        report.summary.bytes_from_seed,
        report.summary.bytes_from_remote,
    );
    Ok(0)
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

//! Main entry point for the `metasniff` CLI application.
//!
//! `metasniff` extracts file metadata from a cloud drive hierarchy for
//! forensic review, producing id-sorted reports and a reproducible SHA-256
//! digest over the collected records.
//!
//! # Responsibilities
//! - Parses CLI arguments via [`clap`] using the [`Args`] struct
//! - Builds the directory client and the extraction session
//! - Runs the session on a worker thread while a spinner shows live progress
//! - Routes Ctrl-C and (with `--interactive`) stdin commands to the session
//! - Writes CSV/JSON reports and prints the run summary
//!
//! # Flags of Interest
//! - `--folder-id ID_OR_LINK`: Extract one folder instead of the whole account
//! - `--include-trashed`: Keep trashed files
//! - `--workers N`: Concurrent folder listings (1-4)
//! - `--format all|csv|json`: Which report files to write

use anyhow::{Context, Result, bail};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use metasniff::client::{RemoteDirectoryClient, SnapshotClient};
use metasniff::config::ExtractionConfig;
use metasniff::metrics::{PhaseTimer, print_profile_summary};
use metasniff::output;
use metasniff::session::{ExtractionReport, ExtractionSession, RunOutcome};
use metasniff::utils::format_optional_size;
use metasniff::Args;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("metasniff=debug,warn")
    } else {
        EnvFilter::new("metasniff=info,warn")
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or(filter);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    Ok(())
}

fn print_banner() {
    println!(
        r#"
------------------------------------------------------------------
     __  __      _                    _  __  __
    |  \/  | ___| |_ __ _ ___ _ __  (_)/ _|/ _|
    | |\/| |/ _ \ __/ _` / __| '_ \ | | |_| |_
    | |  | |  __/ || (_| \__ \ | | || |  _|  _|
    |_|  |_|\___|\__\__,_|___/_| |_||_|_| |_|
              Forensic drive metadata extractor
------------------------------------------------------------------
"#
    );
}

/// Reads `pause`, `resume` and `stop` lines from stdin until the session ends.
fn spawn_command_reader(session: Arc<ExtractionSession>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let result = match line.trim() {
                "p" | "pause" => session.request_pause(),
                "r" | "resume" => session.request_resume(),
                "s" | "stop" => session.request_stop(),
                "" => continue,
                other => {
                    warn!("Unknown command '{}' (use pause, resume or stop)", other);
                    continue;
                }
            };
            if let Err(e) = result {
                warn!("{}", e);
            }
            if session.state().is_terminal() {
                break;
            }
        }
    });
}

/// Runs the session on its own thread and shows a spinner fed from the
/// progress snapshot until it finishes.
fn run_with_spinner(session: Arc<ExtractionSession>) -> Result<RunOutcome> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
            .template("{spinner} [{elapsed}] {msg}")
            .context("Failed to set progress template")?,
    );
    pb.enable_steady_tick(Duration::from_millis(100));

    let worker = {
        let session = Arc::clone(&session);
        thread::Builder::new()
            .name("metasniff-session".into())
            .spawn(move || session.run())
            .context("Failed to spawn extraction thread")?
    };

    while !worker.is_finished() {
        let snap = session.get_progress();
        pb.set_message(format!(
            "{} | {} files ({:.1}/s) | {} folders | {} | {}",
            snap.state,
            snap.files_found,
            snap.files_per_second(),
            snap.folders_scanned,
            format_optional_size(Some(snap.bytes_processed)),
            snap.current_path.as_deref().unwrap_or("-"),
        ));
        thread::sleep(Duration::from_millis(100));
    }

    let outcome = match worker.join() {
        Ok(outcome) => outcome,
        Err(_) => bail!("Extraction thread panicked"),
    };
    pb.finish_and_clear();
    Ok(outcome?)
}

fn write_reports(args: &Args, report: &mut ExtractionReport) -> Result<()> {
    let base = PathBuf::from(
        args.output
            .clone()
            .unwrap_or_else(output::default_base_name),
    );

    let timer = PhaseTimer::new("Export");
    let written = output::export(report, &base, args.format)?;
    report.profile.add_phase(timer.finish());

    for path in written {
        println!("Report written to: {}", path.display());
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose)?;
    print_banner();

    let config = ExtractionConfig::try_from(&args).context("Invalid configuration")?;
    let client: Arc<dyn RemoteDirectoryClient> = Arc::new(
        SnapshotClient::from_path(&args.snapshot)?.with_page_size(args.page_size),
    );
    let session = Arc::new(ExtractionSession::new(client, config)?);
    info!(
        "Extracting {} with {} worker(s)",
        session.config().root_folder_id.as_deref().unwrap_or("the whole account"),
        session.config().worker_count
    );

    {
        let session = Arc::clone(&session);
        ctrlc::set_handler(move || {
            if session.request_stop().is_ok() {
                eprintln!("\nStop requested, discarding collected data...");
            }
        })
        .context("Failed to install Ctrl-C handler")?;
    }

    if args.interactive {
        println!("Commands: pause | resume | stop");
        spawn_command_reader(Arc::clone(&session));
    }

    match run_with_spinner(Arc::clone(&session))? {
        RunOutcome::Stopped => {
            println!("Extraction stopped. No report was written.");
            Ok(())
        }
        RunOutcome::Completed(mut report) => {
            write_reports(&args, &mut report)?;
            println!();
            output::render_terminal(&report, &mut io::stdout())?;
            if args.profile {
                print_profile_summary(&report.profile);
            }
            Ok(())
        }
    }
}

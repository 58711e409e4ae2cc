//! PlotMover CLI - moves finished plots to NAS storage
//!
//! Intended to be run unattended from a timer; each invocation
//! performs at most one transfer attempt.

use clap::Parser;
use plotmover::config::{CliArgs, Commands, Config};
use plotmover::core::{RunOutcome, ToolTransport, TransferCoordinator};
use plotmover::error::Result;
use plotmover::lock::JobLock;
use plotmover::plots::PlotSource;
use plotmover::remote::SshExecutor;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn main() {
    let args = CliArgs::parse();

    // Initialize logging; RUST_LOG overrides the -v/-q flags.
    let default_level = if args.quiet {
        "warn"
    } else if args.verbose >= 2 {
        "trace"
    } else if args.verbose == 1 {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: CliArgs) -> Result<()> {
    let config = Config::from_cli(&args)?;

    match &args.command {
        Some(Commands::Status) => cmd_status(&config),
        Some(Commands::Unlock) => cmd_unlock(&config),
        None => cmd_run(&config, args.quiet),
    }
}

fn cmd_run(config: &Config, quiet: bool) -> Result<()> {
    let remote = SshExecutor::new(config.remote.clone());
    let timeout = match config.transfer_timeout_secs {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    };
    let transport = ToolTransport::new(&config.transfer_tool, timeout);

    let mut coordinator = TransferCoordinator::new(config, &remote, &transport);
    let outcome = coordinator.run_once()?;

    if !quiet {
        print_outcome(&outcome);
    }

    // A rolled-back run ends this invocation with a failure status so
    // the operator (or monitoring) sees it; the next timer tick may
    // retry the same plot from scratch.
    if matches!(outcome, RunOutcome::RolledBack { .. }) {
        std::process::exit(1);
    }

    Ok(())
}

fn print_outcome(outcome: &RunOutcome) {
    match outcome {
        RunOutcome::NoCandidate => println!("No plots to process."),
        RunOutcome::AlreadyRunning => println!("A transfer is already in flight."),
        RunOutcome::DryRun { file_name } => println!("Dry run: would move {}", file_name),
        RunOutcome::Committed { file_name, size } => println!(
            "Moved {} ({})",
            file_name,
            humansize::format_size(*size, humansize::BINARY)
        ),
        RunOutcome::RolledBack { file_name, reason } => {
            println!("Transfer of {} rolled back: {:?}", file_name, reason)
        }
    }
}

fn cmd_status(config: &Config) -> Result<()> {
    let lock = JobLock::new(&config.lock_file, config.remote_lock_file.clone());
    println!("=== PlotMover Status ===");
    println!(
        "Transfer lock:   {}",
        if lock.is_held() {
            "held (transfer in flight)"
        } else {
            "free"
        }
    );

    let source = PlotSource::new(
        &config.plot_dir,
        config.plot_extension.clone(),
        config.min_plot_size,
    );
    match source.discover()? {
        Some(candidate) => println!(
            "Next candidate:  {} ({})",
            candidate.file_name,
            humansize::format_size(candidate.size, humansize::BINARY)
        ),
        None => println!("Next candidate:  none"),
    }

    Ok(())
}

fn cmd_unlock(config: &Config) -> Result<()> {
    let lock = JobLock::new(&config.lock_file, config.remote_lock_file.clone());
    if !lock.is_held() {
        println!("Lock is not held; nothing to do.");
        return Ok(());
    }

    let remote = SshExecutor::new(config.remote.clone());
    lock.release(&remote)?;
    println!("Transfer lock released.");
    Ok(())
}

//! # LOCKSWAP
//!
//! Runs the concurrent swap kernel once and prints the classic report:
//!
//! ```text
//! lockswap --threads 10 --size 10 --iterations 100 --delay 10
//! ```
//!
//! Per-run output goes to stdout, diagnostics go to stderr through `tracing`
//! (filter with `RUST_LOG`). `--log-output` sends the per-run output through
//! `tracing` as well.

mod cli;

use std::process::ExitCode;

use lockswap_core::{ConsoleReporter, Coordinator, Reporter, TracingReporter};
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, USAGE};

const DEFAULT_FILTER: &str = "lockswap=info,lockswap_core=info";

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
        )
        .init();

    let args = match cli::parse(std::env::args().skip(1)) {
        Ok(Command::Run(args)) => args,
        Ok(Command::Help) => {
            println!("{USAGE}");
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            eprintln!("lockswap: {err}");
            eprintln!();
            eprintln!("{USAGE}");
            return ExitCode::from(2);
        }
    };

    let coordinator = match args.to_config().and_then(Coordinator::new) {
        Ok(coordinator) => coordinator,
        Err(err) => {
            tracing::error!(error = %err, "invalid configuration");
            eprintln!("lockswap: {err}");
            return ExitCode::from(2);
        }
    };

    let reporter: Box<dyn Reporter> = if args.log_output {
        Box::new(TracingReporter)
    } else if args.quiet {
        Box::new(ConsoleReporter::stdout().without_swaps())
    } else {
        Box::new(ConsoleReporter::stdout())
    };
    if coordinator.config().audit_locks {
        tracing::info!("slot lock audit enabled");
    }

    match coordinator.run(reporter) {
        Ok(report) => {
            if !report.is_permutation() {
                tracing::warn!("final buffer is not a permutation of its slot indices");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "run failed");
            eprintln!("lockswap: {err}");
            ExitCode::FAILURE
        }
    }
}

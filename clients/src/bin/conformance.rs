//! `tmc-conformance` — Validates the projector algebra and generated kernels.
//!
//! Runs the conformance suite across:
//! - Projector algebra (rank, row relations, dagger symmetry)
//! - Freshly rendered kernels for every variant
//! - Kernel headers found in the artifacts directory
//!
//! **Usage:**
//! ```
//! tmc-conformance [--artifacts <path>] [--json <path>]
//! ```
//!
//! Exits non-zero if any conformance check fails.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use tmc_conformance::{run_all, Severity, WorkspacePaths};

/// Run the Dslash kernel conformance suite.
#[derive(Parser)]
#[command(
    name = "tmc-conformance",
    about = "Validate the projector algebra and generated Dslash kernels"
)]
struct Args {
    /// Directory holding generated kernel headers (default: dslash_core/).
    #[arg(long, default_value = "dslash_core")]
    artifacts: PathBuf,

    /// Also write the report as JSON to this path.
    #[arg(long)]
    json: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let paths = WorkspacePaths {
        artifacts: args.artifacts,
    };

    let report = run_all(&paths)?;

    println!("Dslash Kernel Conformance Report");
    println!("================================");
    println!();

    let mut passed = 0usize;
    let mut failed = 0usize;
    let mut warned = 0usize;

    for result in &report.results {
        match result.severity {
            Severity::Pass => passed += 1,
            Severity::Warning => warned += 1,
            Severity::Failure => failed += 1,
        }
        println!(
            "[{}] {} — {}",
            result.severity.tag(),
            result.validator,
            result.message
        );
        for detail in &result.details {
            println!("       {}", detail);
        }
    }

    println!();
    println!(
        "Summary: {} passed, {} warnings, {} failed",
        passed, warned, failed
    );

    if let Some(path) = &args.json {
        let json = serde_json::to_string_pretty(&report)
            .context("Failed to serialize conformance report")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    if failed > 0 {
        eprintln!("Conformance FAILED: {} check(s) did not pass.", failed);
        process::exit(1);
    }

    println!("Conformance PASSED.");
    Ok(())
}

//! `tmc-gen` — Generates the twisted-mass-clover Dslash kernel headers.
//!
//! Writes one `tmc_dslash[_dagger]_<arch>_core.h` per architecture and
//! adjoint to the output directory, and optionally a JSON manifest of what
//! was written.
//!
//! **Usage:**
//! ```
//! tmc-gen [--out <path>] [--arch <g80|gt200|fermi>]... [--manifest <path>]
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tmc_codegen::Arch;

/// Generate twisted-mass-clover Dslash kernel headers.
#[derive(Parser)]
#[command(
    name = "tmc-gen",
    about = "Generate twisted-mass-clover Dslash CUDA kernel headers"
)]
struct Args {
    /// Output directory for generated headers.
    #[arg(long, default_value = "dslash_core")]
    out: PathBuf,

    /// Architecture to generate for (repeatable; default: all).
    #[arg(long = "arch", value_name = "ARCH")]
    arches: Vec<Arch>,

    /// Write a JSON manifest of the generated files to this path.
    #[arg(long)]
    manifest: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let arches = if args.arches.is_empty() {
        Arch::ALL.to_vec()
    } else {
        args.arches
    };
    let labels: Vec<&str> = arches.iter().map(|a| a.label()).collect();
    println!(
        "Generating Dslash kernels for {} architecture(s): {}",
        arches.len(),
        labels.join(", ")
    );

    let report = tmc_codegen::generate(&args.out, &arches)?;

    println!(
        "Files written to {} ({}):",
        args.out.display(),
        report.files.len()
    );
    for file in &report.files {
        println!(
            "  {} ({} macros, {} lines)",
            file.name, file.define_count, file.line_count
        );
    }
    println!("Total: {} lines", report.total_lines());

    if let Some(path) = &args.manifest {
        let json = serde_json::to_string_pretty(&report)
            .context("Failed to serialize generation report")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Manifest: {}", path.display());
    }

    println!("Generation complete.");
    Ok(())
}

//! Conformance suite for the twisted-mass-clover Dslash generator.
//!
//! Validates the projector algebra the generator relies on and the kernel
//! text it produces, both freshly rendered in memory and as written to an
//! artifacts directory.
//!
//! # Conformance Scope
//!
//! | Component | Standard |
//! |-----------|----------|
//! | Projector algebra | identity ± gamma, rank 2, reducible rows, dagger symmetry |
//! | Kernel macros | every `#define` undefined exactly once, disjoint naming families |
//! | Kernel layout | shared-memory budget, stride, output placement, input staging |
//! | Kernel stencil | projector dumps match the algebra, spinor reads match support |
//!
//! # Entry Point
//!
//! ```no_run
//! use tmc_conformance::{run_all, WorkspacePaths};
//! use std::path::PathBuf;
//!
//! let paths = WorkspacePaths {
//!     artifacts: PathBuf::from("dslash_core"),
//! };
//! let report = run_all(&paths).expect("Failed to run conformance");
//! assert!(report.all_passed());
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

pub mod report;
pub mod validators;

pub use report::{ConformanceReport, Severity, TestResult};

/// Paths required by the conformance runner.
pub struct WorkspacePaths {
    /// Directory holding generated kernel headers (`tmc-gen --out`).
    pub artifacts: std::path::PathBuf,
}

/// Runs all conformance validators and returns the aggregated report.
///
/// Validators are run in this order:
/// 1. Projector algebra (live, no file I/O)
/// 2. Kernel sources: render every variant, then load the artifacts directory
/// 3. Macro hygiene
/// 4. Shared-memory layout
/// 5. Stencil structure
///
/// # Errors
///
/// Returns an error only if a file system operation fails.
pub fn run_all(paths: &WorkspacePaths) -> anyhow::Result<ConformanceReport> {
    let mut report = ConformanceReport::new();

    // 1. Projector algebra
    report.extend(validators::algebra::projectors::validate());

    // 2. Kernel sources
    let mut kernels = validators::kernel::rendered(&mut report);
    kernels.extend(validators::kernel::on_disk(&paths.artifacts, &mut report)?);

    // 3-5. Kernel text
    report.extend(validators::kernel::macros::validate(&kernels));
    report.extend(validators::kernel::layout::validate(&kernels));
    report.extend(validators::kernel::stencil::validate(&kernels));

    Ok(report)
}

#[cfg(test)]
mod tests_unit {
    use super::*;

    #[test]
    fn in_memory_suite_passes() {
        let paths = WorkspacePaths {
            artifacts: std::path::PathBuf::from("/nonexistent/tmc-artifacts"),
        };
        let report = run_all(&paths);
        assert!(report.is_ok());
        if let Ok(report) = report {
            let failures: Vec<_> = report.results.iter().filter(|r| r.is_failure()).collect();
            assert!(failures.is_empty(), "Conformance failures: {:#?}", failures);
            assert_eq!(report.warning_count(), 1);
        }
    }

    #[test]
    fn generated_artifacts_pass() {
        let dir = std::env::temp_dir().join(format!("tmc-conformance-{}", std::process::id()));
        let generated = tmc_codegen::generate(&dir, &tmc_codegen::Arch::ALL);
        assert!(generated.is_ok());

        let report = run_all(&WorkspacePaths {
            artifacts: dir.clone(),
        });
        let _ = std::fs::remove_dir_all(&dir);

        let report = report.map_err(|e| e.to_string());
        assert!(report.as_ref().is_ok_and(ConformanceReport::all_passed));
        // 6 rendered + 6 on disk, each checked by 4 kernel results.
        assert!(report.is_ok_and(|r| r.results.len() > 48));
    }
}

//! Kernel text validators.
//!
//! Each validator inspects the rendered text only, the way a downstream
//! compiler would see it, and never the fragment tree it came from.

pub mod layout;
pub mod macros;
pub mod stencil;

use std::path::Path;

use anyhow::{Context, Result};
use log::debug;
use tmc_codegen::{render_variant, Variant};
use walkdir::WalkDir;

use crate::report::{ConformanceReport, TestResult};

const VALIDATOR: &str = "kernel/sources";

/// One kernel under validation.
#[derive(Debug, Clone)]
pub struct KernelText {
    /// Where the text came from (`rendered:<file>` or a path).
    pub origin: String,
    /// The variant the file name identifies.
    pub variant: Variant,
    /// Full kernel text.
    pub text: String,
}

/// Renders every variant in memory. Variants that fail to render are
/// reported as failures and skipped.
pub fn rendered(report: &mut ConformanceReport) -> Vec<KernelText> {
    let mut kernels = Vec::new();
    for variant in Variant::all() {
        match render_variant(&variant) {
            Ok(text) => kernels.push(KernelText {
                origin: format!("rendered:{}", variant.file_name()),
                variant,
                text,
            }),
            Err(e) => report.push(TestResult::fail(
                VALIDATOR,
                format!("{} failed to render: {e}", variant.file_name()),
            )),
        }
    }
    if kernels.len() == Variant::all().len() {
        report.push(TestResult::pass(
            VALIDATOR,
            format!("All {} variants render", kernels.len()),
        ));
    }
    kernels
}

/// Reads every `tmc_dslash*_core.h` under `artifacts`.
///
/// A missing directory is a warning; a header whose name does not identify a
/// variant is a failure.
///
/// # Errors
///
/// Returns an error if a kernel file cannot be read.
pub fn on_disk(artifacts: &Path, report: &mut ConformanceReport) -> Result<Vec<KernelText>> {
    if !artifacts.is_dir() {
        report.push(TestResult::warn(
            VALIDATOR,
            format!(
                "{} not found; only in-memory kernels were checked",
                artifacts.display()
            ),
        ));
        return Ok(Vec::new());
    }

    let mut kernels = Vec::new();
    let mut unknown = Vec::new();
    for entry in WalkDir::new(artifacts)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|x| x == "h"))
    {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy();
        if !name.starts_with("tmc_dslash") {
            continue;
        }
        let variant = match Variant::from_file_name(&name) {
            Ok(v) => v,
            Err(e) => {
                unknown.push(format!("{}: {e}", path.display()));
                continue;
            }
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        debug!("loaded {}", path.display());
        kernels.push(KernelText {
            origin: path.display().to_string(),
            variant,
            text,
        });
    }

    if !unknown.is_empty() {
        report.push(TestResult::fail_with_details(
            VALIDATOR,
            "Kernel files with unrecognised names",
            unknown,
        ));
    } else if kernels.is_empty() {
        report.push(TestResult::warn(
            VALIDATOR,
            format!("No kernel files found in {}", artifacts.display()),
        ));
    } else {
        report.push(TestResult::pass(
            VALIDATOR,
            format!("Loaded {} kernel files from {}", kernels.len(), artifacts.display()),
        ));
    }
    Ok(kernels)
}

/// Lines of `text` that are `#<directive> <name>…`, yielding the name.
pub(crate) fn directive_names<'a>(text: &'a str, directive: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    text.lines().filter_map(move |l| {
        l.strip_prefix(directive)
            .and_then(|rest| rest.split_whitespace().next())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_variants_render() {
        let mut report = ConformanceReport::new();
        let kernels = rendered(&mut report);
        assert_eq!(kernels.len(), 6);
        assert!(report.all_passed());
    }

    #[test]
    fn missing_artifacts_only_warn() {
        let mut report = ConformanceReport::new();
        let kernels = on_disk(Path::new("/nonexistent/tmc-artifacts"), &mut report);
        assert!(kernels.is_ok_and(|k| k.is_empty()));
        assert_eq!(report.warning_count(), 1);
        assert!(report.all_passed());
    }

    #[test]
    fn directive_names_take_first_token() {
        let text = "#define A 1\n#define VOLATILE\n  x = 1;\n#undef A\n";
        let names: Vec<_> = directive_names(text, "#define ").collect();
        assert_eq!(names, ["A", "VOLATILE"]);
    }
}

//! Shared-memory layout validator.
//!
//! Checks, per kernel, that the shared-memory setup matches the target
//! architecture: the declared per-thread budget, the bank-conflict stride in
//! both precisions, how many outputs live in shared memory, and whether
//! input staging is present.

use std::sync::OnceLock;

use regex::Regex;
use tmc_codegen::naming::Precision;

use super::KernelText;
use crate::report::{ConformanceReport, TestResult};

const VALIDATOR: &str = "kernel/layout";

fn shared_output() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^#define o[0-3][0-2]_(re|im) s\[(\d+)\*SHARED_STRIDE\]$").ok())
        .as_ref()
}

fn define_value<'a>(text: &'a str, name: &str) -> Vec<&'a str> {
    let prefix = format!("#define {name} ");
    text.lines()
        .filter_map(|l| l.strip_prefix(prefix.as_str()))
        .map(|v| v.split_whitespace().next().unwrap_or(""))
        .collect()
}

/// Validates the shared-memory layout of every kernel.
pub fn validate(kernels: &[KernelText]) -> ConformanceReport {
    let mut report = ConformanceReport::new();
    for kernel in kernels {
        let mut issues = Vec::new();
        check_budget(kernel, &mut issues);
        check_stride(kernel, &mut issues);
        check_outputs(kernel, &mut issues);
        check_staging(kernel, &mut issues);
        report.push(TestResult::from_issues(
            VALIDATOR,
            format!(
                "{}: shared-memory layout matches {}",
                kernel.origin, kernel.variant.arch
            ),
            format!("{}: shared-memory layout mismatch", kernel.origin),
            issues,
        ));
    }
    report
}

fn check_budget(kernel: &KernelText, issues: &mut Vec<String>) {
    let expected = kernel.variant.arch.shared_floats().to_string();
    let found = define_value(&kernel.text, "DSLASH_SHARED_FLOATS_PER_THREAD");
    if found != [expected.as_str()] {
        issues.push(format!(
            "DSLASH_SHARED_FLOATS_PER_THREAD is {found:?}, expected {expected}"
        ));
    }
}

fn check_stride(kernel: &KernelText, issues: &mut Vec<String>) {
    let arch = kernel.variant.arch;
    let expected: Vec<String> = Precision::ALL
        .iter()
        .filter_map(|p| arch.shared_stride(*p))
        .map(|s| s.to_string())
        .collect();
    let found = define_value(&kernel.text, "SHARED_STRIDE");
    if found != expected {
        issues.push(format!(
            "SHARED_STRIDE (double, single) is {found:?}, expected {expected:?}"
        ));
    }
}

fn check_outputs(kernel: &KernelText, issues: &mut Vec<String>) {
    let Some(re) = shared_output() else {
        issues.push("shared-output pattern failed to compile".to_string());
        return;
    };
    let arch = kernel.variant.arch;
    let mut offsets: Vec<usize> = re
        .captures_iter(&kernel.text)
        .filter_map(|c| c.get(2)?.as_str().parse().ok())
        .collect();
    offsets.sort_unstable();

    let budget = if arch.stages_inputs() {
        0
    } else {
        arch.shared_floats().min(24)
    };
    if offsets != (0..budget).collect::<Vec<_>>() {
        issues.push(format!(
            "{} outputs in shared memory, expected offsets 0..{budget}",
            offsets.len()
        ));
    }
}

fn check_staging(kernel: &KernelText, issues: &mut Vec<String>) {
    let staged = ["READ_SPINOR_SHARED(", "WRITE_SPINOR_SHARED(", "__syncthreads();"];
    let present: Vec<&str> = staged
        .iter()
        .copied()
        .filter(|p| kernel.text.contains(p))
        .collect();
    if kernel.variant.arch.stages_inputs() {
        if present.len() != staged.len() {
            issues.push(format!("input staging incomplete: only {present:?}"));
        }
    } else if !present.is_empty() {
        issues.push(format!("unexpected input staging: {present:?}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tmc_algebra::Adjoint;
    use tmc_codegen::{render_variant, Arch, Variant};

    fn rendered(arch: Arch, adjoint: Adjoint) -> KernelText {
        let variant = Variant::new(arch, adjoint);
        KernelText {
            origin: variant.file_name(),
            variant,
            text: render_variant(&variant).unwrap_or_default(),
        }
    }

    #[test]
    fn rendered_layouts_conform() {
        let kernels: Vec<_> = Variant::all()
            .into_iter()
            .map(|v| rendered(v.arch, v.adjoint))
            .collect();
        let report = validate(&kernels);
        assert!(report.all_passed(), "{:#?}", report.results);
    }

    #[test]
    fn wrong_architecture_is_flagged() {
        let mut kernel = rendered(Arch::Current, Adjoint::Plain);
        kernel.variant = Variant::new(Arch::Legacy, Adjoint::Plain);
        let report = validate(&[kernel]);
        assert!(!report.all_passed());
        let details = &report.results[0].details;
        assert!(details.iter().any(|d| d.starts_with("SHARED_STRIDE")));
        assert!(details.iter().any(|d| d.starts_with("unexpected input staging")));
    }
}

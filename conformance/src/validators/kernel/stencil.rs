//! Stencil structure validator.
//!
//! Re-parses the projector dump each hopping term carries as a comment and
//! compares it entry by entry with the live algebra, then checks the
//! temporal identity-gauge fast paths and the spinor read per direction.

use std::sync::OnceLock;

use regex::Regex;
use tmc_algebra::{Coefficient, Direction, Projector};
use tmc_codegen::stencil::{spinor_read, GAUGE_FIXED_CONDITION};

use super::KernelText;
use crate::report::{ConformanceReport, TestResult};

const VALIDATOR: &str = "kernel/stencil";

/// A projector dump: the name line followed by four row comments.
fn dump_pattern() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?m)^\s*// Projector (P[0-3][+-])\n\s*// (.+)\n\s*// (.+)\n\s*// (.+)\n\s*// (.+)$",
        )
        .ok()
    })
    .as_ref()
}

/// One parsed dump.
struct Dump {
    name: String,
    rows: Vec<Vec<Coefficient>>,
}

fn parse_dumps(text: &str) -> Result<Vec<Dump>, String> {
    let re = dump_pattern().ok_or("projector dump pattern failed to compile")?;
    re.captures_iter(text)
        .map(|caps| -> Result<Dump, String> {
            let name = caps[1].to_string();
            let rows = (2..=5)
                .map(|i| {
                    caps[i]
                        .split_whitespace()
                        .map(|lit| {
                            lit.parse::<Coefficient>()
                                .map_err(|e| format!("{name}: {e}"))
                        })
                        .collect::<Result<Vec<_>, _>>()
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Dump { name, rows })
        })
        .collect()
}

/// Validates the eight hopping terms of every kernel.
pub fn validate(kernels: &[KernelText]) -> ConformanceReport {
    let mut report = ConformanceReport::new();
    for kernel in kernels {
        let mut issues = Vec::new();
        match parse_dumps(&kernel.text) {
            Ok(dumps) => check_dumps(kernel, &dumps, &mut issues),
            Err(e) => issues.push(e),
        }
        check_reads(kernel, &mut issues);

        let fast_paths = kernel
            .text
            .matches(&format!("if ({GAUGE_FIXED_CONDITION})"))
            .count();
        if fast_paths != 2 {
            issues.push(format!("{fast_paths} gauge-fixed fast paths, expected 2"));
        }

        report.push(TestResult::from_issues(
            VALIDATOR,
            format!("{}: 8 hopping terms match the projector algebra", kernel.origin),
            format!("{}: hopping terms disagree with the projector algebra", kernel.origin),
            issues,
        ));
    }
    report
}

fn check_dumps(kernel: &KernelText, dumps: &[Dump], issues: &mut Vec<String>) {
    if dumps.len() != Direction::ALL.len() {
        issues.push(format!("{} projector dumps, expected 8", dumps.len()));
        return;
    }
    for (d, dump) in Direction::ALL.into_iter().zip(dumps) {
        let expected = Projector::applied(d, kernel.variant.adjoint);
        if dump.name != expected.name() {
            issues.push(format!(
                "direction {}: dump names {}, expected {}",
                d.index(),
                dump.name,
                expected.name()
            ));
            continue;
        }
        let matches = dump.rows.len() == 4
            && dump.rows.iter().enumerate().all(|(r, row)| {
                row.len() == 4 && row.iter().enumerate().all(|(c, v)| *v == expected.entry(r, c))
            });
        if !matches {
            issues.push(format!(
                "direction {}: {} entries differ from the algebra",
                d.index(),
                dump.name
            ));
        }
    }
}

/// The interior spinor reads must appear in direction order and match each
/// projector's support. Temporal hops read twice (fast path and general
/// path). Staged directions read from shared memory instead, so for staging
/// architectures the global reads need only form a subsequence.
fn check_reads(kernel: &KernelText, issues: &mut Vec<String>) {
    let found: Vec<&str> = kernel
        .text
        .lines()
        .filter_map(|l| {
            let l = l.trim();
            l.strip_suffix("(SPINORTEX, param.sp_stride, sp_idx, sp_idx);")
        })
        .collect();
    let expected: Vec<&str> = Direction::ALL
        .into_iter()
        .flat_map(|d| {
            let read = spinor_read(Projector::applied(d, kernel.variant.adjoint).support());
            let copies = if d.is_temporal() { 2 } else { 1 };
            std::iter::repeat(read).take(copies)
        })
        .collect();

    // Every found read must be consumed by the expected sequence, in order.
    let mut remaining = expected.iter();
    let ordered = found
        .iter()
        .all(|read| remaining.any(|want| want == read));
    if !ordered {
        issues.push(format!("spinor reads {found:?} do not follow {expected:?}"));
    }
    if !kernel.variant.arch.stages_inputs() && found != expected {
        issues.push(format!("spinor reads {found:?}, expected {expected:?}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tmc_algebra::Adjoint;
    use tmc_codegen::{render_variant, Arch, Variant};

    fn kernel(variant: Variant) -> KernelText {
        KernelText {
            origin: variant.file_name(),
            variant,
            text: render_variant(&variant).unwrap_or_default(),
        }
    }

    #[test]
    fn rendered_stencils_conform() {
        let kernels: Vec<_> = Variant::all().into_iter().map(kernel).collect();
        let report = validate(&kernels);
        assert!(report.all_passed(), "{:#?}", report.results);
    }

    #[test]
    fn dumps_parse_back_to_projectors() {
        let k = kernel(Variant::new(Arch::Mid, Adjoint::Plain));
        let dumps = parse_dumps(&k.text).unwrap_or_default();
        assert_eq!(dumps.len(), 8);
        assert_eq!(dumps[6].name, "P3-");
        assert_eq!(dumps[6].rows[2][2], Coefficient::new(2.0, 0.0));
    }

    #[test]
    fn mislabelled_adjoint_is_caught() {
        let mut k = kernel(Variant::new(Arch::Legacy, Adjoint::Plain));
        k.variant.adjoint = Adjoint::Dagger;
        let report = validate(&[k]);
        assert!(!report.all_passed());
    }
}

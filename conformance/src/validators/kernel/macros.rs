//! Macro hygiene validator.
//!
//! Kernels are pasted into several precision instantiations of the same
//! translation unit, so every macro a kernel defines must be undefined exactly
//! once before the file ends. Component names must also fall into exactly one
//! naming family, with the expected population per family.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use regex::Regex;

use super::{directive_names, KernelText};
use crate::report::{ConformanceReport, TestResult};

const VALIDATOR: &str = "kernel/macros";

/// Naming families of kernel components.
const FAMILIES: [(&str, &str); 5] = [
    ("spinor", r"^i[0-3][0-2]_(re|im)$"),
    ("output", r"^o[0-3][0-2]_(re|im)$"),
    ("accumulator", r"^acc[0-3][0-2]_(re|im)$"),
    ("gauge", r"^gT?[0-2][0-2]_(re|im)$"),
    ("clover", r"^c(inv)?[0-3][0-2]_[0-3][0-2]_(re|im)$"),
];

fn families() -> &'static [(&'static str, Regex)] {
    static COMPILED: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    COMPILED.get_or_init(|| {
        FAMILIES
            .iter()
            .filter_map(|(name, pattern)| Regex::new(pattern).ok().map(|re| (*name, re)))
            .collect()
    })
}

/// Expected number of distinct names per family.
fn expected_population(kernel: &KernelText) -> BTreeMap<&'static str, usize> {
    let arch = kernel.variant.arch;
    let shared_outputs = if arch.stages_inputs() {
        0
    } else {
        arch.shared_floats().min(24)
    };
    let accumulators = if kernel.variant.has_accumulators() { 24 } else { 0 };
    BTreeMap::from([
        ("spinor", 24),
        ("output", shared_outputs),
        ("accumulator", accumulators),
        ("gauge", 36),
        // Per kind: 36 stored, 30 mirrored, 66 second-block aliases.
        ("clover", 2 * 132),
    ])
}

/// Validates define/undef symmetry and naming families.
pub fn validate(kernels: &[KernelText]) -> ConformanceReport {
    let mut report = ConformanceReport::new();
    for kernel in kernels {
        check_symmetry(kernel, &mut report);
        check_families(kernel, &mut report);
    }
    report
}

fn check_symmetry(kernel: &KernelText, report: &mut ConformanceReport) {
    let defined: BTreeSet<&str> = directive_names(&kernel.text, "#define ").collect();
    let mut undefined: BTreeMap<&str, usize> = BTreeMap::new();
    for name in directive_names(&kernel.text, "#undef ") {
        *undefined.entry(name).or_default() += 1;
    }

    let mut issues = Vec::new();
    for name in &defined {
        match undefined.get(name) {
            None => issues.push(format!("{name}: never undefined")),
            Some(1) => {}
            Some(n) => issues.push(format!("{name}: undefined {n} times")),
        }
    }
    for name in undefined.keys().filter(|n| !defined.contains(*n)) {
        issues.push(format!("{name}: undefined but never defined"));
    }

    report.push(TestResult::from_issues(
        VALIDATOR,
        format!(
            "{}: all {} macros undefined exactly once",
            kernel.origin,
            defined.len()
        ),
        format!("{}: #define/#undef mismatch", kernel.origin),
        issues,
    ));
}

fn check_families(kernel: &KernelText, report: &mut ConformanceReport) {
    let defined: BTreeSet<&str> = directive_names(&kernel.text, "#define ").collect();
    let mut population: BTreeMap<&str, usize> = BTreeMap::new();
    let mut issues = Vec::new();

    for name in &defined {
        let matches: Vec<&str> = families()
            .iter()
            .filter(|(_, re)| re.is_match(name))
            .map(|(family, _)| *family)
            .collect();
        match matches.as_slice() {
            [] => {}
            [family] => *population.entry(*family).or_default() += 1,
            several => issues.push(format!("{name}: claimed by {}", several.join(", "))),
        }
    }

    for (family, expected) in expected_population(kernel) {
        let found = population.get(family).copied().unwrap_or(0);
        if found != expected {
            issues.push(format!("{family}: {found} names, expected {expected}"));
        }
    }

    report.push(TestResult::from_issues(
        VALIDATOR,
        format!("{}: naming families are disjoint and complete", kernel.origin),
        format!("{}: naming family mismatch", kernel.origin),
        issues,
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use tmc_algebra::Adjoint;
    use tmc_codegen::{Arch, Variant};

    fn kernel(text: &str) -> KernelText {
        KernelText {
            origin: "test".into(),
            variant: Variant::new(Arch::Mid, Adjoint::Plain),
            text: text.into(),
        }
    }

    #[test]
    fn detects_missing_and_repeated_undefs() {
        let k = kernel("#define A 1\n#define B 2\n#undef B\n#undef B\n#undef C\n");
        let mut report = ConformanceReport::new();
        check_symmetry(&k, &mut report);
        let result = &report.results[0];
        assert!(result.is_failure());
        assert_eq!(
            result.details,
            vec![
                "A: never undefined".to_string(),
                "B: undefined 2 times".to_string(),
                "C: undefined but never defined".to_string(),
            ]
        );
    }

    #[test]
    fn families_are_disjoint() {
        for name in ["i00_re", "o32_im", "acc11_re", "gT21_im", "cinv30_21_re", "c00_00_re"] {
            let hits = families().iter().filter(|(_, re)| re.is_match(name)).count();
            assert_eq!(hits, 1, "{name}");
        }
        assert_eq!(families().len(), FAMILIES.len());
    }

    #[test]
    fn rendered_kernels_conform() {
        let mut sources = ConformanceReport::new();
        let kernels = super::super::rendered(&mut sources);
        let report = validate(&kernels);
        assert!(report.all_passed(), "{:#?}", report.results);
    }
}

//! End-to-end scenarios over fully rendered kernels.
//!
//! Each test renders complete variants and checks properties of the text a
//! downstream compiler would see.

use std::collections::BTreeSet;

use tmc_algebra::Adjoint;
use tmc_codegen::emit::defined_macros;
use tmc_codegen::layout::clover_primaries;
use tmc_codegen::naming::CloverKind;
use tmc_codegen::{generate, kernel, render_variant, Arch, Variant};

fn render(arch: Arch, adjoint: Adjoint) -> String {
    render_variant(&Variant::new(arch, adjoint)).unwrap()
}

/// Value of `#define <name> <value>` lines, in order of appearance.
fn define_values<'a>(text: &'a str, name: &str) -> Vec<&'a str> {
    let prefix = format!("#define {name} ");
    text.lines()
        .filter_map(|l| l.strip_prefix(prefix.as_str()))
        .collect()
}

// ============================================================================
// Shared Memory Layout
// ============================================================================

#[test]
fn current_plain_uses_fermi_strides() {
    let text = render(Arch::Current, Adjoint::Plain);
    let strides = define_values(&text, "SHARED_STRIDE");
    assert_eq!(
        strides,
        vec![
            "16 // to avoid bank conflicts on Fermi",
            "32 // to avoid bank conflicts on Fermi"
        ]
    );
    assert!(text.contains("WRITE_SPINOR_SHARED(threadIdx.x, threadIdx.y, threadIdx.z, i);"));
    assert!(text.contains("__syncthreads();"));
}

#[test]
fn legacy_dagger_never_stages_inputs() {
    let text = render(Arch::Legacy, Adjoint::Dagger);
    assert!(!text.contains("READ_SPINOR_SHARED"));
    assert!(!text.contains("WRITE_SPINOR_SHARED"));
    assert!(!text.contains("__syncthreads"));

    let shared_outputs = text
        .lines()
        .filter(|l| l.starts_with("#define o") && l.contains("s["))
        .count();
    assert_eq!(shared_outputs, 19);
}

#[test]
fn mid_has_no_shared_memory_at_all() {
    let text = render(Arch::Mid, Adjoint::Plain);
    assert!(!text.contains("SHARED_STRIDE"));
    assert!(!text.contains("s_data"));
    assert!(text.contains("#define DSLASH_SHARED_FLOATS_PER_THREAD 0\n"));
}

// ============================================================================
// Stencil Structure
// ============================================================================

#[test]
fn eight_directions_each_guarded_and_dumped() {
    for v in Variant::all() {
        let text = render_variant(&v).unwrap();
        assert_eq!(text.matches("// Projector P").count(), 8, "{v}");
        assert_eq!(text.matches("(kernel_type == EXTERIOR_KERNEL_").count(), 8, "{v}");
        assert_eq!(text.matches("RECONSTRUCT_GAUGE_MATRIX(").count(), 8, "{v}");
    }
}

#[test]
fn temporal_directions_keep_gauge_fixed_fast_path() {
    for v in Variant::all() {
        let text = render_variant(&v).unwrap();
        assert_eq!(
            text.matches("if (gauge_fixed && ga_idx < X4X3X2X1hmX3X2X1h) {").count(),
            2,
            "{v}"
        );
        assert_eq!(text.matches("// identity gauge matrix").count(), 2, "{v}");
    }
}

#[test]
fn dagger_swaps_projector_signs() {
    let plain = render(Arch::Mid, Adjoint::Plain);
    let dagger = render(Arch::Mid, Adjoint::Dagger);
    let names = |text: &str| -> Vec<String> {
        text.lines()
            .filter_map(|l| l.trim().strip_prefix("// Projector "))
            .map(str::to_string)
            .collect()
    };
    assert_eq!(names(&plain), ["P0-", "P0+", "P1-", "P1+", "P2-", "P2+", "P3-", "P3+"]);
    assert_eq!(names(&dagger), ["P0+", "P0-", "P1+", "P1-", "P2+", "P2-", "P3+", "P3-"]);
}

// ============================================================================
// Macro Hygiene
// ============================================================================

#[test]
fn every_define_is_undefined_exactly_once() {
    for v in Variant::all() {
        let text = render_variant(&v).unwrap();
        let defined: BTreeSet<&str> = text
            .lines()
            .filter_map(|l| l.strip_prefix("#define "))
            .filter_map(|rest| rest.split_whitespace().next())
            .collect();
        for name in &defined {
            let undefs = text
                .lines()
                .filter(|l| l.strip_prefix("#undef ") == Some(*name))
                .count();
            assert_eq!(undefs, 1, "{v}: {name}");
        }
        let undefined = text.lines().filter(|l| l.starts_with("#undef ")).count();
        assert_eq!(undefined, defined.len(), "{v}");
    }
}

#[test]
fn macro_families_do_not_collide() {
    let v = Variant::new(Arch::Legacy, Adjoint::Plain);
    let names = defined_macros(&kernel(&v).unwrap());
    let family = |name: &str| -> &'static str {
        if name.starts_with("cinv") || name.starts_with('c') && name.contains('_') {
            "clover"
        } else if name.starts_with("acc") {
            "accumulator"
        } else if name.starts_with('g') {
            "gauge"
        } else if name.starts_with('i') || name.starts_with('o') {
            "spinor"
        } else {
            "other"
        }
    };
    let unique: BTreeSet<&String> = names.iter().collect();
    assert_eq!(unique.len(), names.len());
    assert!(names.iter().any(|n| family(n) == "clover"));
    assert!(names.iter().any(|n| family(n) == "accumulator"));
    assert!(names.iter().any(|n| family(n) == "gauge"));
    assert!(names.iter().any(|n| family(n) == "spinor"));
}

// ============================================================================
// Clover Layout
// ============================================================================

#[test]
fn second_chiral_block_only_aliases() {
    let text = render(Arch::Current, Adjoint::Plain);
    for kind in CloverKind::ALL {
        let primaries = clover_primaries(kind);
        assert_eq!(primaries.len(), 36);
        let prefix = format!("#define {}", kind.prefix());
        for line in text.lines().filter(|l| l.starts_with(&prefix)) {
            let mut parts = line.split_whitespace().skip(1);
            let (Some(name), Some(value)) = (parts.next(), parts.next()) else {
                continue;
            };
            let block_two = name[kind.prefix().len()..].starts_with(['2', '3']);
            if block_two {
                assert!(!value.starts_with('C'), "{line}");
            }
        }
    }
}

#[test]
fn clover_diagonal_has_no_imaginary_part() {
    let text = render(Arch::Mid, Adjoint::Dagger);
    assert!(text.contains("#define c00_00_re C0.x\n"));
    assert!(!text.contains("#define c00_00_im"));
    assert!(!text.contains("#define c20_20_im"));
    assert!(text.contains("#define c20_20_re c00_00_re\n"));
    assert!(text.contains("#define cinv00_01_re (+cinv01_00_re)\n"));
    assert!(text.contains("#define cinv00_01_im (-cinv01_00_im)\n"));
}

// ============================================================================
// Driver
// ============================================================================

#[test]
fn generate_writes_requested_architectures() {
    let out = std::env::temp_dir().join(format!("tmc-codegen-test-{}", std::process::id()));
    let report = generate(&out, &[Arch::Legacy]).unwrap();

    let names: Vec<&str> = report.files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["tmc_dslash_g80_core.h", "tmc_dslash_dagger_g80_core.h"]);
    for file in &report.files {
        let written = std::fs::read_to_string(out.join(&file.name)).unwrap();
        assert_eq!(written.lines().count(), file.line_count);
        assert!(file.define_count > 0);
    }

    let manifest = serde_json::to_value(&report).unwrap();
    assert_eq!(manifest["files"][1]["arch"], "legacy");
    assert_eq!(manifest["files"][1]["dagger"], true);

    std::fs::remove_dir_all(&out).unwrap();
}

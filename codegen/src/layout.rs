//! Storage layout of the kernel's named components.
//!
//! Each table binds the symbolic names of [`crate::naming`] to packed vector
//! lanes, shared memory or registers, for both storage precisions.

use crate::emit::Fragment;
use crate::naming::{
    accumulator, clover, gauge, packed, spinor_in, spinor_out, spinor_scalar, ChiralIndex,
    CloverKind, LinkForm, Part, Precision,
};
use crate::variant::Variant;

/// Where an output spinor scalar lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStorage {
    /// `s[offset*SHARED_STRIDE]` in the thread's shared-memory slice.
    Shared {
        /// Scalar offset within the slice.
        offset: usize,
    },
    /// A `VOLATILE spinorFloat` register.
    Register,
}

/// Storage of output component (spin, color, part).
///
/// Staging architectures keep shared memory for inputs, so their outputs are
/// always registers. Elsewhere the first `shared_floats` scalars go to shared
/// memory.
#[must_use]
pub fn output_storage(variant: &Variant, spin: usize, color: usize, part: Part) -> OutputStorage {
    let offset = spinor_scalar(spin, color, part);
    if !variant.arch.stages_inputs() && offset < variant.arch.shared_floats() {
        OutputStorage::Shared { offset }
    } else {
        OutputStorage::Register
    }
}

fn spinor_components() -> impl Iterator<Item = (usize, usize)> {
    (0..4).flat_map(|s| (0..3).map(move |c| (s, c)))
}

fn spinor_lanes(precision: Precision, base: &str, name: fn(usize, usize, Part) -> String) -> Vec<Fragment> {
    let mut out = Vec::new();
    for (s, c) in spinor_components() {
        for part in Part::BOTH {
            out.push(Fragment::define(
                name(s, c, part),
                packed(base, spinor_scalar(s, c, part), precision),
            ));
        }
    }
    out
}

/// Input spinor (and accumulator) bindings for both precisions.
#[must_use]
pub fn input_spinor_table(variant: &Variant) -> Vec<Fragment> {
    let branch = |precision: Precision| {
        let mut out = vec![Fragment::define("spinorFloat", precision.scalar_type())];
        if variant.arch.stages_inputs() {
            let suffix = precision.shared_io_suffix();
            out.push(Fragment::define(
                "WRITE_SPINOR_SHARED",
                format!("WRITE_SPINOR_SHARED_{suffix}"),
            ));
            out.push(Fragment::define(
                "READ_SPINOR_SHARED",
                format!("READ_SPINOR_SHARED_{suffix}"),
            ));
        }
        out.extend(spinor_lanes(precision, "I", spinor_in));
        if variant.has_accumulators() {
            out.extend(spinor_lanes(precision, "accum", accumulator));
        }
        out
    };

    vec![
        Fragment::comment("input spinor"),
        Fragment::ifdef_else(
            "SPINOR_DOUBLE",
            branch(Precision::Double),
            branch(Precision::Single),
        ),
        Fragment::Blank,
    ]
}

/// Gauge link bindings and the conjugate-transpose aliases.
#[must_use]
pub fn gauge_table() -> Vec<Fragment> {
    let lanes = |precision: Precision| {
        let mut out = Vec::new();
        for m in 0..3 {
            for n in 0..3 {
                for part in Part::BOTH {
                    out.push(Fragment::define(
                        gauge(LinkForm::Direct, m, n, part),
                        packed("G", 2 * (3 * m + n) + part.offset(), precision),
                    ));
                }
            }
        }
        out.push(Fragment::Blank);
        out
    };

    let mut out = vec![
        Fragment::comment("gauge link"),
        Fragment::ifdef_else(
            "GAUGE_FLOAT2",
            lanes(Precision::Double),
            lanes(Precision::Single),
        ),
        Fragment::Blank,
        Fragment::comment("conjugated gauge link"),
    ];
    for m in 0..3 {
        for n in 0..3 {
            out.push(Fragment::define(
                gauge(LinkForm::Adjoint, m, n, Part::Re),
                format!("(+{})", gauge(LinkForm::Direct, n, m, Part::Re)),
            ));
            out.push(Fragment::define(
                gauge(LinkForm::Adjoint, m, n, Part::Im),
                format!("(-{})", gauge(LinkForm::Direct, n, m, Part::Im)),
            ));
        }
    }
    out.push(Fragment::Blank);
    out
}

/// Names of the stored (primary) entries of the first chiral block, in
/// storage order: the six real diagonal entries, then the fifteen complex
/// entries below the diagonal, column by column.
#[must_use]
pub fn clover_primaries(kind: CloverKind) -> Vec<String> {
    let mut names: Vec<String> = ChiralIndex::all()
        .into_iter()
        .map(|m| clover(kind, 0, m, m, Part::Re))
        .collect();
    for n in ChiralIndex::all() {
        for m in ChiralIndex::all().into_iter().filter(|m| *m > n) {
            for part in Part::BOTH {
                names.push(clover(kind, 0, m, n, part));
            }
        }
    }
    names
}

fn clover_block(kind: CloverKind) -> Vec<Fragment> {
    let lanes = |precision: Precision| {
        clover_primaries(kind)
            .into_iter()
            .enumerate()
            .map(|(i, name)| Fragment::define(name, packed("C", i, precision)))
            .collect::<Vec<_>>()
    };

    let mut out = vec![
        Fragment::comment(format!("first chiral block of {}", kind.label())),
        Fragment::ifdef_else(
            "CLOVER_DOUBLE",
            lanes(Precision::Double),
            lanes(Precision::Single),
        ),
        Fragment::Blank,
    ];

    // Upper triangle mirrors the stored lower triangle.
    for n in ChiralIndex::all() {
        for m in ChiralIndex::all().into_iter().filter(|m| *m < n) {
            out.push(Fragment::define(
                clover(kind, 0, m, n, Part::Re),
                format!("(+{})", clover(kind, 0, n, m, Part::Re)),
            ));
            out.push(Fragment::define(
                clover(kind, 0, m, n, Part::Im),
                format!("(-{})", clover(kind, 0, n, m, Part::Im)),
            ));
        }
    }
    out.push(Fragment::Blank);

    out.push(Fragment::comment(format!(
        "second chiral block of {} (reuses C0,...,C9)",
        kind.label()
    )));
    for n in ChiralIndex::all() {
        for m in ChiralIndex::all() {
            out.push(Fragment::define(
                clover(kind, 1, m, n, Part::Re),
                clover(kind, 0, m, n, Part::Re),
            ));
            if m != n {
                out.push(Fragment::define(
                    clover(kind, 1, m, n, Part::Im),
                    clover(kind, 0, m, n, Part::Im),
                ));
            }
        }
    }
    out.push(Fragment::Blank);
    out
}

/// Scratch vector registers the clover reads are assigned into.
#[must_use]
pub fn clover_scratch(variant: &Variant) -> Vec<Fragment> {
    if variant.pack_only {
        return Vec::new();
    }
    let decls = |precision: Precision| {
        let count = 36 / precision.width();
        (0..count)
            .map(|i| Fragment::line(format!("{} C{i};", precision.vector_type())))
            .collect::<Vec<_>>()
    };
    let mut single = decls(Precision::Single);
    single.push(Fragment::Blank);
    single.push(Fragment::if_expr("(DD_PREC==2)", vec![Fragment::line("float K;")]));
    single.push(Fragment::Blank);

    let scratch = vec![
        Fragment::comment("declare C## here and use ASSN below instead of READ"),
        Fragment::ifdef_else("CLOVER_DOUBLE", decls(Precision::Double), single),
    ];
    if variant.is_dagger() {
        vec![
            Fragment::ifndef("CLOVER_TWIST_INV_DSLASH", scratch),
            Fragment::Blank,
        ]
    } else {
        let mut out = scratch;
        out.push(Fragment::Blank);
        out
    }
}

/// Clover term and inverse bindings, followed by the scratch declarations.
#[must_use]
pub fn clover_table(variant: &Variant) -> Vec<Fragment> {
    let mut out = Vec::new();
    for kind in CloverKind::ALL {
        out.extend(clover_block(kind));
    }
    out.extend(clover_scratch(variant));
    out
}

/// Output spinor placement.
#[must_use]
pub fn output_table(variant: &Variant) -> Vec<Fragment> {
    let mut out = vec![Fragment::comment("output spinor")];
    for (s, c) in spinor_components() {
        for part in Part::BOTH {
            let name = spinor_out(s, c, part);
            out.push(match output_storage(variant, s, c, part) {
                OutputStorage::Shared { offset } => {
                    Fragment::define(name, format!("s[{offset}*SHARED_STRIDE]"))
                }
                OutputStorage::Register => Fragment::line(format!("VOLATILE spinorFloat {name};")),
            });
        }
    }
    out.push(Fragment::Blank);
    out
}

/// `SHARED_STRIDE` for architectures that use shared memory.
#[must_use]
pub fn shared_stride_table(variant: &Variant) -> Vec<Fragment> {
    let arch = variant.arch;
    if arch.shared_floats() == 0 {
        return Vec::new();
    }
    let define = |precision: Precision| -> Vec<Fragment> {
        arch.shared_stride(precision)
            .map(|stride| {
                Fragment::define(
                    "SHARED_STRIDE",
                    format!("{stride:>2} // {}", arch.stride_note()),
                )
            })
            .into_iter()
            .collect()
    };
    vec![
        Fragment::ifdef_else(
            "SPINOR_DOUBLE",
            define(Precision::Double),
            define(Precision::Single),
        ),
        Fragment::Blank,
    ]
}

/// The shared-memory declaration and, when outputs live there, the
/// per-thread base pointer `s`.
#[must_use]
pub fn shared_base(variant: &Variant) -> Vec<Fragment> {
    if variant.arch.shared_floats() == 0 {
        return Vec::new();
    }
    let mut out = vec![Fragment::line("extern __shared__ char s_data[];"), Fragment::Blank];
    if !variant.arch.stages_inputs() {
        out.push(Fragment::line(
            "VOLATILE spinorFloat *s = (spinorFloat*)s_data + DSLASH_SHARED_FLOATS_PER_THREAD*SHARED_STRIDE*(threadIdx.x/SHARED_STRIDE)",
        ));
        out.push(Fragment::line("                                  + (threadIdx.x % SHARED_STRIDE);"));
        out.push(Fragment::Blank);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::defined_macros;
    use crate::variant::Arch;
    use tmc_algebra::Adjoint;

    #[test]
    fn legacy_outputs_fill_the_shared_budget() {
        let v = Variant::new(Arch::Legacy, Adjoint::Plain);
        let shared = spinor_components()
            .flat_map(|(s, c)| Part::BOTH.map(|p| output_storage(&v, s, c, p)))
            .filter(|st| matches!(st, OutputStorage::Shared { .. }))
            .count();
        assert_eq!(shared, 19);
        assert_eq!(output_storage(&v, 3, 0, Part::Re), OutputStorage::Shared { offset: 18 });
        assert_eq!(output_storage(&v, 3, 0, Part::Im), OutputStorage::Register);
    }

    #[test]
    fn staged_outputs_are_registers() {
        let v = Variant::new(Arch::Current, Adjoint::Plain);
        assert!(defined_macros(&output_table(&v)).is_empty());
        assert_eq!(output_storage(&v, 0, 0, Part::Re), OutputStorage::Register);
    }

    #[test]
    fn clover_has_six_real_and_fifteen_complex_primaries() {
        let primaries = clover_primaries(CloverKind::Direct);
        assert_eq!(primaries.len(), 6 + 2 * 15);
        assert_eq!(primaries[0], "c00_00_re");
        assert_eq!(primaries[6], "c01_00_re");
        assert_eq!(primaries[7], "c01_00_im");
        assert_eq!(primaries.last().map(String::as_str), Some("c12_11_im"));
    }

    #[test]
    fn gauge_aliases_transpose_and_conjugate() {
        let table = gauge_table();
        assert!(table.contains(&Fragment::define("gT01_re", "(+g10_re)")));
        assert!(table.contains(&Fragment::define("gT01_im", "(-g10_im)")));
    }

    #[test]
    fn pack_only_skips_accumulators_and_scratch() {
        let mut v = Variant::new(Arch::Mid, Adjoint::Dagger);
        v.pack_only = true;
        assert!(clover_scratch(&v).is_empty());
        let names = defined_macros(&input_spinor_table(&v));
        assert!(!names.iter().any(|n| n.starts_with("acc")));
    }

    #[test]
    fn mid_has_no_shared_memory() {
        let v = Variant::new(Arch::Mid, Adjoint::Plain);
        assert!(shared_stride_table(&v).is_empty());
        assert!(shared_base(&v).is_empty());
    }
}

//! Kernel epilog: completion check, clover twist, xpay, write-back and the
//! `#undef` block.

use crate::emit::{Fragment, Guard};
use crate::naming::{accumulator, spinor_out, Part};
use crate::variant::Variant;

/// `(case label, axis, last coordinate)` of the fall-through completeness
/// chain. Each kernel type also checks every axis below it.
const COMPLETION_CHAIN: [(&str, usize, &str); 4] = [
    ("INTERIOR_KERNEL", 3, "X4m1"),
    ("EXTERIOR_KERNEL_T", 2, "X3m1"),
    ("EXTERIOR_KERNEL_Z", 1, "X2m1"),
    ("EXTERIOR_KERNEL_Y", 0, "X1m1"),
];

fn completion_check(variant: &Variant) -> Vec<Fragment> {
    let guard = if variant.twist {
        Guard::Defined("MULTI_GPU".to_string())
    } else {
        Guard::Expr("defined MULTI_GPU && (defined DSLASH_XPAY || defined DSLASH_CLOVER)".to_string())
    };

    let mut check = vec![
        Fragment::Blank,
        Fragment::line("int incomplete = 0; // Have all 8 contributions been computed for this site?"),
        Fragment::Blank,
        Fragment::line("switch(kernel_type) { // intentional fall-through"),
        Fragment::Blank,
    ];
    for (label, k, extent) in COMPLETION_CHAIN {
        check.push(Fragment::line(format!("case {label}:")));
        check.push(Fragment::line(format!(
            "  incomplete = incomplete || (param.commDim[{k}] && (coord[{k}]==0 || coord[{k}]=={extent}));"
        )));
    }
    check.extend([
        Fragment::line("}"),
        Fragment::Blank,
        Fragment::line("if (!incomplete)"),
    ]);

    vec![Fragment::Conditional {
        guard,
        then: check,
        otherwise: None,
    }]
}

fn precision_scalar(name: &str, double: &str, single: &str) -> Fragment {
    Fragment::ifdef_else(
        "SPINOR_DOUBLE",
        vec![Fragment::line(format!("spinorFloat {name} = {double};"))],
        vec![Fragment::line(format!("spinorFloat {name} = {single};"))],
    )
}

fn xpay() -> Vec<Fragment> {
    let mut out = Vec::new();
    for s in 0..4 {
        for c in 0..3 {
            for part in Part::BOTH {
                let o = spinor_out(s, c, part);
                out.push(Fragment::line(format!(
                    "{o} = b*{o} + {};",
                    accumulator(s, c, part)
                )));
            }
        }
    }
    out
}

/// `(1 + i·a·γ5·A)^{-1}` applied to the output, from the stored inverse or
/// recomputed on the fly.
fn twist_inverse(a: &str) -> Fragment {
    Fragment::ifndef_else(
        "DYNAMIC_CLOVER",
        vec![Fragment::line(format!("APPLY_CLOVER_TWIST_INV(c, cinv, {a}, o);"))],
        vec![Fragment::line(format!("APPLY_CLOVER_TWIST_DYN_INV(c, {a}, o);"))],
    )
}

fn plain_twist(variant: &Variant) -> Vec<Fragment> {
    let mut with_xpay = vec![
        precision_scalar("b", "param.b", "param.b_f"),
        Fragment::line("READ_ACCUM(ACCUMTEX, param.sp_stride)"),
        Fragment::Blank,
    ];
    let mut twist_first = vec![
        Fragment::line("//perform invert twist first:"),
        twist_inverse("a"),
    ];
    twist_first.extend(xpay());
    let mut twist_accum = vec![Fragment::line("APPLY_CLOVER_TWIST(c, a, acc);")];
    twist_accum.extend(xpay());
    with_xpay.push(Fragment::ifndef_else("CLOVER_TWIST_XPAY", twist_first, twist_accum));

    let mut out = vec![precision_scalar("a", "param.a", "param.a_f")];
    if variant.has_accumulators() {
        out.push(Fragment::ifdef_else(
            "DSLASH_XPAY",
            with_xpay,
            vec![twist_inverse("a")],
        ));
    } else {
        out.push(twist_inverse("a"));
    }
    out
}

fn dagger_twist(variant: &Variant) -> Vec<Fragment> {
    let mut with_xpay = vec![
        precision_scalar("b", "param.b", "param.b_f"),
        Fragment::line("READ_ACCUM(ACCUMTEX, param.sp_stride)"),
        Fragment::Blank,
        Fragment::ifndef(
            "CLOVER_TWIST_INV_DSLASH",
            vec![Fragment::ifndef_else(
                "CLOVER_TWIST_XPAY",
                vec![
                    Fragment::line("//perform invert twist first:"),
                    twist_inverse("-a"),
                ],
                vec![Fragment::line("APPLY_CLOVER_TWIST(c, -a, acc);")],
            )],
        ),
    ];
    with_xpay.extend(xpay());
    let without_xpay = vec![Fragment::ifndef("CLOVER_TWIST_INV_DSLASH", vec![twist_inverse("-a")])];

    let mut out = vec![Fragment::if_expr(
        "!defined(CLOVER_TWIST_INV_DSLASH)",
        vec![precision_scalar("a", "param.a", "param.a_f")],
    )];
    if variant.has_accumulators() {
        out.push(Fragment::ifdef_else("DSLASH_XPAY", with_xpay, without_xpay));
    } else {
        out.extend(without_xpay);
    }
    out
}

/// Undefines every macro the prolog defined, one block per prolog section.
fn undefine(macro_groups: &[Vec<String>]) -> Vec<Fragment> {
    let mut out = vec![Fragment::comment("undefine to prevent warning when precision is changed")];
    for group in macro_groups {
        out.extend(group.iter().cloned().map(Fragment::Undef));
        out.push(Fragment::Blank);
    }
    out
}

/// Builds the epilog of `variant`, undefining `macro_groups`.
#[must_use]
pub fn epilog(variant: &Variant, macro_groups: &[Vec<String>]) -> Vec<Fragment> {
    let mut out = completion_check(variant);
    let twist = if variant.is_dagger() {
        dagger_twist(variant)
    } else {
        plain_twist(variant)
    };
    out.extend([
        Fragment::Scope(twist),
        Fragment::Blank,
        Fragment::Blank,
        Fragment::comment("write spinor field back to device memory"),
        Fragment::line("WRITE_SPINOR(param.sp_stride);"),
        Fragment::Blank,
    ]);
    out.extend(undefine(macro_groups));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::KernelFile;
    use crate::variant::Arch;
    use tmc_algebra::Adjoint;

    fn render(variant: &Variant) -> String {
        let mut f = KernelFile::new("test");
        f.render_all(&epilog(variant, &[vec!["spinorFloat".to_string()]]));
        f.finish()
    }

    #[test]
    fn completion_chain_falls_through_t_z_y_x() {
        let text = render(&Variant::new(Arch::Current, Adjoint::Plain));
        let t = text.find("param.commDim[3]").unwrap_or(usize::MAX);
        let x = text.find("param.commDim[0]").unwrap_or(0);
        assert!(t < x);
        assert!(text.contains("#ifdef MULTI_GPU\n\nint incomplete = 0;"));
        assert!(text.contains("if (!incomplete)\n#endif // MULTI_GPU\n{\n"));
    }

    #[test]
    fn plain_twist_uses_positive_mass() {
        let text = render(&Variant::new(Arch::Mid, Adjoint::Plain));
        assert!(text.contains("  APPLY_CLOVER_TWIST_INV(c, cinv, a, o);"));
        assert!(text.contains("  APPLY_CLOVER_TWIST(c, a, acc);"));
        assert!(text.contains("  o00_re = b*o00_re + acc00_re;"));
        assert!(!text.contains("-a"));
    }

    #[test]
    fn dagger_twist_negates_mass_and_honours_inverse_dslash() {
        let text = render(&Variant::new(Arch::Mid, Adjoint::Dagger));
        assert!(text.contains("#if !defined(CLOVER_TWIST_INV_DSLASH)\n"));
        assert!(text.contains("  APPLY_CLOVER_TWIST_INV(c, cinv, -a, o);"));
        assert!(text.contains("  APPLY_CLOVER_TWIST_DYN_INV(c, -a, o);"));
        assert!(text.contains("  APPLY_CLOVER_TWIST(c, -a, acc);"));
    }

    #[test]
    fn pack_only_has_no_xpay() {
        let mut v = Variant::new(Arch::Legacy, Adjoint::Plain);
        v.pack_only = true;
        let text = render(&v);
        assert!(!text.contains("DSLASH_XPAY"));
        assert!(!text.contains("acc00_re"));
    }

    #[test]
    fn write_back_precedes_undefs() {
        let text = render(&Variant::new(Arch::Legacy, Adjoint::Dagger));
        let write = text.find("WRITE_SPINOR(param.sp_stride);").unwrap_or(usize::MAX);
        let undef = text.find("#undef spinorFloat").unwrap_or(0);
        assert!(write < undef);
    }
}

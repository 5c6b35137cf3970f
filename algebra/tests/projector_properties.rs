//! Property-based tests for coefficient literals and the projector family.
//!
//! Uses proptest for the literal round-trip; the projector identities are
//! checked exhaustively since the family is finite.

use proptest::prelude::*;
use tmc_algebra::gamma::{combine, gamma, IDENTITY};
use tmc_algebra::{Adjoint, Coefficient, Direction, Projector, ProjectorSupport};

fn small_part() -> impl Strategy<Value = f64> {
    prop::sample::select(vec![0.0, 1.0, -1.0, 2.0, -2.0, 0.5, -0.5])
}

// =============================================================================
// Literal Properties
// =============================================================================

proptest! {
    /// Formatting then parsing reproduces the coefficient.
    #[test]
    fn prop_literal_round_trip(re in small_part(), im in small_part()) {
        let c = Coefficient::new(re, im);
        let parsed: Coefficient = c.to_string().parse().unwrap();
        prop_assert_eq!(parsed, c);
    }

    /// No literal ever carries a doubled sign.
    #[test]
    fn prop_literal_has_no_double_sign(re in small_part(), im in small_part()) {
        let literal = Coefficient::new(re, im).to_string();
        prop_assert!(!literal.contains("+-"), "{}", literal);
        prop_assert!(!literal.contains("-+"), "{}", literal);
        prop_assert!(!literal.contains("--"), "{}", literal);
    }

    /// Re-formatting a parsed literal is stable.
    #[test]
    fn prop_literal_is_canonical(re in -2000i32..2000, im in -2000i32..2000) {
        let c = Coefficient::new(f64::from(re) / 2.0, f64::from(im) / 2.0);
        let literal = c.to_string();
        let again = literal.parse::<Coefficient>().unwrap().to_string();
        prop_assert_eq!(again, literal);
    }
}

// =============================================================================
// Projector Family
// =============================================================================

#[test]
fn projectors_are_identity_plus_or_minus_gamma() {
    for d in Direction::ALL {
        let sign = if d.is_forward() { -1.0 } else { 1.0 };
        let expected = combine(&IDENTITY, sign, gamma(d.axis()));
        assert_eq!(Projector::for_direction(d).matrix(), &expected);
    }
}

#[test]
fn dependent_rows_vanish_after_reduction() {
    for p in Projector::family() {
        if p.support() == ProjectorSupport::LowerOnly {
            // Rows 0 and 1 are the zero rows.
            assert_eq!(p.row_nonzeros(0) + p.row_nonzeros(1), 0);
            continue;
        }
        for row in [2, 3] {
            let rel = p.row_relation(row).unwrap();
            let zero_after_reduction = (0..4)
                .all(|col| (p.entry(row, col) - rel.scale * p.entry(rel.source, col)).is_zero());
            assert!(zero_after_reduction, "{} row {row}", p.name());
        }
    }
}

#[test]
fn dagger_support_matches_partner_support() {
    for d in Direction::ALL {
        let dagger = Projector::applied(d, Adjoint::Dagger).support();
        let partner = Projector::applied(d.partner(), Adjoint::Plain).support();
        assert_eq!(dagger, partner, "direction {}", d.index());
        if !d.is_temporal() {
            assert_eq!(dagger, ProjectorSupport::Both);
        }
    }
}

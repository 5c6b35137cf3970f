//! Projector family validator.
//!
//! Checks the eight direction projectors the generator reduces:
//! - each equals `identity ± gamma` for its axis and has rank 2
//! - rows 2 and 3 reduce to multiples of rows 0 and 1
//! - every half-row term carries a supported weight
//! - the dagger support of a direction equals the plain support of its partner

use tmc_algebra::gamma::{combine, gamma, IDENTITY};
use tmc_algebra::{Adjoint, Direction, Projector};

use crate::report::{ConformanceReport, TestResult};

const VALIDATOR: &str = "algebra/projectors";

/// Validates the live projector family.
pub fn validate() -> ConformanceReport {
    let mut report = ConformanceReport::new();
    let family = Projector::family();

    let mut issues = Vec::new();
    for d in Direction::ALL {
        let p = &family[d.index()];
        let sign = if d.is_forward() { -1.0 } else { 1.0 };
        if p.matrix() != &combine(&IDENTITY, sign, gamma(d.axis())) {
            issues.push(format!("{}: not identity {} gamma", p.name(), p.sign().symbol()));
        }
        let rank = p.rank();
        if rank != 2 {
            issues.push(format!("{}: rank {rank}", p.name()));
        }
    }
    report.push(TestResult::from_issues(
        VALIDATOR,
        "All 8 projectors are identity ± gamma with rank 2",
        "Projector family is malformed",
        issues,
    ));

    let mut issues = Vec::new();
    for p in family {
        for row in [2, 3] {
            if let Err(e) = p.row_relation(row) {
                issues.push(format!("{}: {e}", p.name()));
            }
        }
        for half in [0, 1] {
            if let Err(e) = p.half_terms(half) {
                issues.push(format!("{} half {half}: {e}", p.name()));
            }
        }
    }
    report.push(TestResult::from_issues(
        VALIDATOR,
        "Dependent rows reduce and all term weights are in {±1, ±2, ±i, ±2i}",
        "Projector rows do not reduce",
        issues,
    ));

    let mut issues = Vec::new();
    for d in Direction::ALL {
        let dagger = Projector::applied(d, Adjoint::Dagger).support();
        let partner = Projector::applied(d.partner(), Adjoint::Plain).support();
        if dagger != partner {
            issues.push(format!(
                "direction {}: dagger {dagger:?}, partner {partner:?}",
                d.index()
            ));
        }
    }
    report.push(TestResult::from_issues(
        VALIDATOR,
        "Dagger load classes mirror the parity partners",
        "Dagger load classes differ from parity partners",
        issues,
    ));

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_family_conforms() {
        let report = validate();
        assert_eq!(report.results.len(), 3);
        assert!(report.all_passed(), "{:#?}", report.results);
    }
}

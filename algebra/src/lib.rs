//! Chiral projector algebra for the twisted-mass-clover Dslash generator.
//!
//! The `tmc-algebra` crate holds everything the kernel generator needs to know
//! about the Dirac structure of the stencil: the four gamma matrices, the eight
//! direction projectors `identity ± gamma`, their row relations (each projector
//! has rank 2), and the reduction of projector rows into sparse signed term
//! lists.
//!
//! # Entry Point
//!
//! ```
//! use tmc_algebra::{Direction, Projector};
//!
//! let family = Projector::family();
//! assert_eq!(family.len(), 8);
//! assert_eq!(family[0], Projector::for_direction(Direction::ALL[0]));
//! assert_eq!(family[0].rank(), 2);
//! ```
//!
//! # Literals
//!
//! ```
//! use tmc_algebra::Coefficient;
//!
//! assert_eq!(Coefficient::new(1.0, -1.0).to_string(), "1-i");
//! let parsed: Coefficient = "-2i".parse().unwrap();
//! assert_eq!(parsed, Coefficient::new(0.0, -2.0));
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

pub mod complex;
pub mod direction;
pub mod error;
pub mod gamma;
pub mod projector;

pub use complex::{Coefficient, Weight};
pub use direction::{Adjoint, Axis, Direction, Sign};
pub use error::AlgebraError;
pub use projector::{Projector, ProjectorSupport, RowRelation, Term};

impl Projector {
    /// The eight direction projectors, indexed by direction:
    /// `[I-γx, I+γx, I-γy, I+γy, I-γz, I+γz, I-γt, I+γt]`.
    #[must_use]
    pub fn family() -> &'static [Projector; 8] {
        static FAMILY: std::sync::OnceLock<[Projector; 8]> = std::sync::OnceLock::new();
        FAMILY.get_or_init(|| Direction::ALL.map(Projector::for_direction))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_order_alternates_sign() {
        for (i, p) in Projector::family().iter().enumerate() {
            let expected = if i % 2 == 0 { Sign::Minus } else { Sign::Plus };
            assert_eq!(p.sign(), expected);
            assert_eq!(p.axis(), Axis::ALL[i / 2]);
        }
    }

    #[test]
    fn all_projectors_reduce() {
        for p in Projector::family() {
            for row in [2, 3] {
                assert!(p.row_relation(row).is_ok(), "{} row {row}", p.name());
            }
        }
    }
}

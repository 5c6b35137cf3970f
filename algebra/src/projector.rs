//! Chiral projectors `identity ± gamma` and their symbolic reduction.
//!
//! Every projector of the family has rank 2: rows 2 and 3 are multiples of
//! rows 0 and 1 (or rows 0 and 1 vanish entirely for the temporal axis). The
//! kernels exploit this by transporting only two half-spinor rows per
//! direction and reconstructing the dependent rows from the row relations.

use crate::complex::{Coefficient, Weight};
use crate::direction::{Adjoint, Axis, Direction, Sign};
use crate::error::AlgebraError;
use crate::gamma::{combine, gamma, Matrix4, IDENTITY};

/// Which half-rows of a projector carry nonzero entries.
///
/// Selects the spinor load: only the upper spin components, only the lower
/// ones, or the full spinor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectorSupport {
    /// Rows 2 and 3 are zero.
    UpperOnly,
    /// Rows 0 and 1 are zero.
    LowerOnly,
    /// Both halves are populated.
    Both,
}

/// `row[row] = scale · row[source]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowRelation {
    /// The dependent row (2 or 3).
    pub row: usize,
    /// The independent row it is derived from (0 or 1).
    pub source: usize,
    /// The proportionality factor.
    pub scale: Coefficient,
}

/// One nonzero entry of a projector row, applied to spin component `spin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Term {
    /// Spin component the weight multiplies.
    pub spin: usize,
    /// The weight.
    pub weight: Weight,
}

/// A direction projector `identity + sign·gamma_axis`.
#[derive(Debug, Clone, PartialEq)]
pub struct Projector {
    axis: Axis,
    sign: Sign,
    matrix: Matrix4,
}

impl Projector {
    /// Builds `identity + sign·gamma(axis)`.
    #[must_use]
    pub fn build(axis: Axis, sign: Sign) -> Self {
        Self {
            axis,
            sign,
            matrix: combine(&IDENTITY, sign.factor(), gamma(axis)),
        }
    }

    /// The projector belonging to `direction`.
    #[must_use]
    pub fn for_direction(direction: Direction) -> Self {
        Self::build(direction.axis(), direction.projector_sign())
    }

    /// The projector applied when hopping along `direction` for the given
    /// adjoint.
    #[must_use]
    pub fn applied(direction: Direction, adjoint: Adjoint) -> Self {
        Self::for_direction(direction.projector_direction(adjoint))
    }

    /// The axis of the gamma matrix.
    #[must_use]
    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// The sign of the gamma matrix.
    #[must_use]
    pub fn sign(&self) -> Sign {
        self.sign
    }

    /// The full matrix.
    #[must_use]
    pub fn matrix(&self) -> &Matrix4 {
        &self.matrix
    }

    /// Entry `(row, col)`.
    #[must_use]
    pub fn entry(&self, row: usize, col: usize) -> Coefficient {
        self.matrix[row][col]
    }

    /// Short name, e.g. `P0-` for `identity - gamma_x`.
    #[must_use]
    pub fn name(&self) -> String {
        format!("P{}{}", self.axis.index(), self.sign.symbol())
    }

    /// Each row as space-separated coefficient literals.
    #[must_use]
    pub fn row_literals(&self) -> Vec<String> {
        self.matrix
            .iter()
            .map(|row| {
                row.iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect()
    }

    /// Number of nonzero entries in `row`.
    #[must_use]
    pub fn row_nonzeros(&self, row: usize) -> usize {
        self.matrix[row].iter().filter(|c| !c.is_zero()).count()
    }

    /// Classifies which half-rows are structurally nonzero.
    #[must_use]
    pub fn support(&self) -> ProjectorSupport {
        let upper = self.row_nonzeros(0) + self.row_nonzeros(1);
        let lower = self.row_nonzeros(2) + self.row_nonzeros(3);
        if upper == 0 {
            ProjectorSupport::LowerOnly
        } else if lower == 0 {
            ProjectorSupport::UpperOnly
        } else {
            ProjectorSupport::Both
        }
    }

    /// Expresses dependent row 2 or 3 as a multiple of row 0 or row 1.
    ///
    /// A zero in column 0 ties the row to row 1, a zero in column 1 ties it
    /// to row 0. For projectors whose upper half is populated the relation is
    /// verified entry by entry. Lower-only projectors return a zero scale:
    /// their lower rows are transported directly and nothing is derived.
    ///
    /// # Errors
    ///
    /// Returns [`AlgebraError::RowOutOfRange`] for rows other than 2 and 3 and
    /// [`AlgebraError::MalformedProjector`] if no relation exists.
    pub fn row_relation(&self, row: usize) -> Result<RowRelation, AlgebraError> {
        if row != 2 && row != 3 {
            return Err(AlgebraError::RowOutOfRange { row });
        }
        let malformed = || AlgebraError::MalformedProjector {
            projector: self.name(),
            row,
        };

        let relation = if self.entry(row, 0).is_zero() {
            RowRelation {
                row,
                source: 1,
                scale: self.entry(row, 1),
            }
        } else if self.entry(row, 1).is_zero() {
            RowRelation {
                row,
                source: 0,
                scale: self.entry(row, 0),
            }
        } else {
            return Err(malformed());
        };

        if self.support() != ProjectorSupport::LowerOnly {
            let holds = (0..4).all(|col| {
                self.entry(row, col) == relation.scale * self.entry(relation.source, col)
            });
            if !holds {
                return Err(malformed());
            }
        }
        Ok(relation)
    }

    /// Rank over the complex numbers.
    #[must_use]
    pub fn rank(&self) -> usize {
        let mut m = self.matrix;
        let mut rank = 0;
        for col in 0..4 {
            let Some(pivot) = (rank..4).find(|&r| !m[r][col].is_zero()) else {
                continue;
            };
            m.swap(rank, pivot);
            let inv = Coefficient(m[rank][col].0.inv());
            for r in 0..4 {
                if r != rank && !m[r][col].is_zero() {
                    let factor = m[r][col] * inv;
                    for c in 0..4 {
                        m[r][c] = m[r][c] - factor * m[rank][c];
                    }
                }
            }
            rank += 1;
        }
        rank
    }

    /// The sparse term list for half-spinor row `half` (0 or 1).
    ///
    /// For lower-only projectors the terms of row `half + 2` are folded in,
    /// since the upper rows contribute nothing.
    ///
    /// # Errors
    ///
    /// Returns [`AlgebraError::RowOutOfRange`] if `half > 1` and
    /// [`AlgebraError::UnsupportedWeight`] for coefficients outside
    /// {±1, ±2, ±i, ±2i}.
    pub fn half_terms(&self, half: usize) -> Result<Vec<Term>, AlgebraError> {
        if half > 1 {
            return Err(AlgebraError::RowOutOfRange { row: half });
        }
        let mut rows = vec![half];
        if self.support() == ProjectorSupport::LowerOnly {
            rows.push(half + 2);
        }

        let mut terms = Vec::new();
        for row in rows {
            for spin in 0..4 {
                if let Some(weight) = Weight::from_coefficient(self.entry(row, spin))? {
                    terms.push(Term { spin, weight });
                }
            }
        }
        Ok(terms)
    }
}

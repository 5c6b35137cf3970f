//! Invariant violations raised while reducing projector algebra.
//!
//! None of these can occur for the eight direction projectors; they exist so a
//! broken matrix table aborts generation instead of emitting wrong kernels.

use thiserror::Error;

/// A fatal error in the projector algebra.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlgebraError {
    /// Neither column 0 nor column 1 of a dependent row is zero, so the row
    /// cannot be expressed as a multiple of row 0 or row 1.
    #[error("projector {projector} is malformed: row {row} is not a multiple of row 0 or row 1")]
    MalformedProjector {
        /// Projector name, e.g. `P0-`.
        projector: String,
        /// The dependent row that failed to reduce.
        row: usize,
    },

    /// A row index outside the range the operation accepts.
    #[error("row {row} is out of range for this operation")]
    RowOutOfRange {
        /// The offending row index.
        row: usize,
    },

    /// A coefficient in a term position that is not ±1, ±2, ±i or ±2i.
    #[error("coefficient {literal} cannot be expressed as a sparse term weight")]
    UnsupportedWeight {
        /// Source literal of the coefficient.
        literal: String,
    },

    /// A string that is not a complex literal produced by the formatter.
    #[error("invalid complex literal: {0:?}")]
    InvalidLiteral(String),
}

//! Generation errors.

use thiserror::Error;
use tmc_algebra::AlgebraError;

/// A violated configuration invariant. Every variant is fatal: no partial
/// kernel is ever written.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GenError {
    /// The variant has no kernel prolog (the `dslash` flag is off).
    #[error("variant {variant} has no kernel prolog: only dslash kernels can be generated")]
    UndefinedProlog {
        /// File name of the offending variant.
        variant: String,
    },

    /// The assembled kernel does not undefine exactly what it defines.
    #[error(
        "macro asymmetry in {variant}: {} never undefined, {} undefined without a definition, {} undefined twice",
        missing.len(),
        stray.len(),
        repeated.len()
    )]
    MacroAsymmetry {
        /// File name of the offending variant.
        variant: String,
        /// Defined but never undefined.
        missing: Vec<String>,
        /// Undefined but never defined.
        stray: Vec<String>,
        /// Undefined more than once.
        repeated: Vec<String>,
    },

    /// A kernel file name does not follow the `tmc_dslash[_dagger]_<arch>_core.h`
    /// convention.
    #[error("not a kernel file name: {0}")]
    UnknownFileName(String),

    /// An architecture label other than `g80`, `gt200` or `fermi`.
    #[error("unknown architecture: {0}")]
    UnknownArch(String),

    /// The projector algebra rejected a direction.
    #[error(transparent)]
    Algebra(#[from] AlgebraError),
}

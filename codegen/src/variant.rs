//! Target architectures and kernel variants.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tmc_algebra::Adjoint;

use crate::error::GenError;
use crate::naming::Precision;

/// GPU generation a kernel is tuned for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    /// Compute capability below 1.2 (`g80`).
    Legacy,
    /// Compute capability 1.2 to 1.3 (`gt200`).
    Mid,
    /// Compute capability 2.0 and above (`fermi`).
    Current,
}

impl Arch {
    /// All architectures, newest first.
    pub const ALL: [Arch; 3] = [Arch::Current, Arch::Mid, Arch::Legacy];

    /// Label used in file names.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Arch::Legacy => "g80",
            Arch::Mid => "gt200",
            Arch::Current => "fermi",
        }
    }

    /// Per-thread scalars of shared memory the kernel may use.
    #[must_use]
    pub fn shared_floats(self) -> usize {
        match self {
            Arch::Legacy => 19,
            Arch::Mid => 0,
            Arch::Current => 24,
        }
    }

    /// Whether input spinors are staged through shared memory so that
    /// neighbouring threads can reuse them.
    #[must_use]
    pub fn stages_inputs(self) -> bool {
        matches!(self, Arch::Current)
    }

    /// Shared-memory stride for the given precision, if the architecture
    /// uses shared memory at all.
    #[must_use]
    pub fn shared_stride(self, precision: Precision) -> Option<usize> {
        match (self, precision) {
            (Arch::Mid, _) => None,
            (Arch::Legacy, Precision::Double) => Some(8),
            (Arch::Legacy, Precision::Single) => Some(16),
            (Arch::Current, Precision::Double) => Some(16),
            (Arch::Current, Precision::Single) => Some(32),
        }
    }

    /// Trailing comment of the `SHARED_STRIDE` definitions.
    #[must_use]
    pub fn stride_note(self) -> &'static str {
        match self {
            Arch::Current => "to avoid bank conflicts on Fermi",
            Arch::Legacy | Arch::Mid => "to avoid bank conflicts on G80 and GT200",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Arch {
    type Err = GenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Arch::ALL
            .into_iter()
            .find(|arch| arch.label() == s)
            .ok_or_else(|| GenError::UnknownArch(s.to_string()))
    }
}

/// One kernel to generate. Passed by value to every assembler; nothing about
/// the variant lives in process-wide state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Variant {
    /// Target architecture.
    pub arch: Arch,
    /// Plain or dagger operator.
    pub adjoint: Adjoint,
    /// Whether this is a dslash kernel (the only kind with a prolog).
    pub dslash: bool,
    /// Whether the twisted-mass term is applied in the epilog.
    pub twist: bool,
    /// Whether the kernel only packs faces and never accumulates.
    pub pack_only: bool,
}

impl Variant {
    /// The twisted-clover dslash kernel for `arch`.
    #[must_use]
    pub fn new(arch: Arch, adjoint: Adjoint) -> Self {
        Self {
            arch,
            adjoint,
            dslash: true,
            twist: true,
            pack_only: false,
        }
    }

    /// Every generated variant: each architecture, plain before dagger.
    #[must_use]
    pub fn all() -> Vec<Variant> {
        Self::for_arches(&Arch::ALL)
    }

    /// Plain and dagger variants of the given architectures.
    #[must_use]
    pub fn for_arches(arches: &[Arch]) -> Vec<Variant> {
        arches
            .iter()
            .flat_map(|&arch| Adjoint::ALL.map(|adjoint| Variant::new(arch, adjoint)))
            .collect()
    }

    /// Whether this is the dagger operator.
    #[must_use]
    pub fn is_dagger(&self) -> bool {
        self.adjoint.is_dagger()
    }

    /// Whether the xpay accumulator is read.
    #[must_use]
    pub fn has_accumulators(&self) -> bool {
        self.dslash && !self.pack_only
    }

    /// Output file name, e.g. `tmc_dslash_dagger_fermi_core.h`.
    #[must_use]
    pub fn file_name(&self) -> String {
        let dagger = if self.is_dagger() { "dagger_" } else { "" };
        format!("tmc_dslash_{dagger}{}_core.h", self.arch.label())
    }

    /// Recovers the variant from a generated file name.
    ///
    /// # Errors
    ///
    /// Returns [`GenError::UnknownFileName`] if the name does not follow the
    /// kernel naming convention, or [`GenError::UnknownArch`] if the
    /// architecture label is unknown.
    pub fn from_file_name(name: &str) -> Result<Self, GenError> {
        let stem = name
            .strip_prefix("tmc_dslash_")
            .and_then(|rest| rest.strip_suffix("_core.h"))
            .ok_or_else(|| GenError::UnknownFileName(name.to_string()))?;
        let (adjoint, label) = match stem.strip_prefix("dagger_") {
            Some(label) => (Adjoint::Dagger, label),
            None => (Adjoint::Plain, stem),
        };
        Ok(Variant::new(label.parse()?, adjoint))
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn file_names_round_trip() {
        for v in Variant::all() {
            assert_eq!(Variant::from_file_name(&v.file_name()).unwrap(), v);
        }
        assert_eq!(
            Variant::new(Arch::Legacy, Adjoint::Dagger).file_name(),
            "tmc_dslash_dagger_g80_core.h"
        );
    }

    #[test]
    fn rejects_foreign_names() {
        assert!(matches!(
            Variant::from_file_name("wilson_dslash_fermi_core.h"),
            Err(GenError::UnknownFileName(_))
        ));
        assert!(matches!(
            Variant::from_file_name("tmc_dslash_kepler_core.h"),
            Err(GenError::UnknownArch(_))
        ));
    }

    #[test]
    fn arch_properties() {
        assert_eq!(Arch::Current.shared_stride(Precision::Single), Some(32));
        assert_eq!(Arch::Legacy.shared_stride(Precision::Double), Some(8));
        assert_eq!(Arch::Mid.shared_stride(Precision::Double), None);
        assert!(Arch::Current.stages_inputs());
        assert!(!Arch::Legacy.stages_inputs());
        assert_eq!("gt200".parse::<Arch>().unwrap(), Arch::Mid);
    }

    #[test]
    fn six_variants_by_default() {
        let all = Variant::all();
        assert_eq!(all.len(), 6);
        assert_eq!(all[0].file_name(), "tmc_dslash_fermi_core.h");
        assert_eq!(all[1].file_name(), "tmc_dslash_dagger_fermi_core.h");
    }
}

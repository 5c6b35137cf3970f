//! Twisted-mass-clover Dslash kernel generator.
//!
//! Assembles fully unrolled kernel bodies for every supported architecture
//! and both operator adjoints, and writes them as
//! `tmc_dslash[_dagger]_<arch>_core.h`. Each kernel is built as a
//! [`emit::Fragment`] tree (prolog, eight hopping terms, epilog), checked for
//! `#define`/`#undef` symmetry, and rendered to text.
//!
//! ```
//! use tmc_algebra::Adjoint;
//! use tmc_codegen::{render_variant, Arch, Variant};
//!
//! let text = render_variant(&Variant::new(Arch::Current, Adjoint::Plain)).unwrap();
//! assert!(text.contains("// *** CUDA DSLASH ***"));
//! assert!(text.contains("#define SHARED_STRIDE 32"));
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

pub mod emit;
pub mod epilog;
pub mod error;
pub mod layout;
pub mod naming;
pub mod prolog;
pub mod stencil;
pub mod variant;

use std::path::Path;

use anyhow::Result;
use log::info;
use serde::Serialize;
use tmc_algebra::Direction;

use emit::{defined_macros, Fragment, KernelFile, MacroBalance};

pub use error::GenError;
pub use variant::{Arch, Variant};

/// One written kernel file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedFile {
    /// File name relative to the output directory.
    pub name: String,
    /// Target architecture.
    pub arch: Arch,
    /// Whether this is the dagger operator.
    pub dagger: bool,
    /// Distinct macros the kernel defines (and undefines).
    pub define_count: usize,
    /// Rendered line count.
    pub line_count: usize,
}

/// Report of what was generated.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    /// Files written, in generation order.
    pub files: Vec<GeneratedFile>,
}

impl GenerationReport {
    /// Total rendered lines across all files.
    #[must_use]
    pub fn total_lines(&self) -> usize {
        self.files.iter().map(|f| f.line_count).sum()
    }
}

/// The complete fragment tree of one kernel.
///
/// # Errors
///
/// Returns [`GenError::UndefinedProlog`] for non-dslash variants,
/// [`GenError::Algebra`] if a projector cannot be reduced, and
/// [`GenError::MacroAsymmetry`] if the epilog does not undefine exactly what
/// the prolog defined.
pub fn kernel(variant: &Variant) -> Result<Vec<Fragment>, GenError> {
    let prolog = prolog::prolog(variant)?;
    let mut fragments = prolog.fragments;
    for direction in Direction::ALL {
        fragments.extend(stencil::direction_fragment(variant, direction)?);
    }
    fragments.extend(epilog::epilog(variant, &prolog.macro_groups));

    let balance = MacroBalance::of(&fragments);
    if !balance.is_balanced() {
        return Err(GenError::MacroAsymmetry {
            variant: variant.file_name(),
            missing: balance.missing,
            stray: balance.stray,
            repeated: balance.repeated,
        });
    }
    Ok(fragments)
}

/// Renders one kernel to text.
///
/// # Errors
///
/// Propagates any [`kernel`] error.
pub fn render_variant(variant: &Variant) -> Result<String, GenError> {
    let fragments = kernel(variant)?;
    let mut f = KernelFile::new(&format!(
        "{} generated by tmc-gen; do not edit",
        variant.file_name()
    ));
    f.render_all(&fragments);
    Ok(f.finish())
}

/// Generates plain and dagger kernels for each of `arches` into `out_dir`.
///
/// Stops at the first failure; files written before it are left in place.
///
/// # Errors
///
/// Returns an error if a kernel cannot be assembled or a file cannot be
/// written.
pub fn generate(out_dir: &Path, arches: &[Arch]) -> Result<GenerationReport> {
    let mut report = GenerationReport::default();

    for variant in Variant::for_arches(arches) {
        let fragments = kernel(&variant)?;
        let define_count = defined_macros(&fragments).len();

        let name = variant.file_name();
        let mut f = KernelFile::new(&format!("{name} generated by tmc-gen; do not edit"));
        f.render_all(&fragments);
        let content = f.finish();

        emit::write_file(&out_dir.join(&name), &content)?;
        let line_count = content.lines().count();
        info!("wrote {name} ({define_count} macros, {line_count} lines)");

        report.files.push(GeneratedFile {
            name,
            arch: variant.arch,
            dagger: variant.is_dagger(),
            define_count,
            line_count,
        });
    }

    Ok(report)
}

//! Kernel prolog: banner, naming tables, shared-memory setup and the
//! per-thread site coordinates.

use crate::emit::{defined_macros, Fragment};
use crate::error::GenError;
use crate::layout;
use crate::naming::{spinor_in, spinor_out, Part};
use crate::variant::Variant;

/// The assembled prolog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prolog {
    /// Prolog text.
    pub fragments: Vec<Fragment>,
    /// Macros defined by each section, in definition order. The epilog
    /// undefines them group by group.
    pub macro_groups: Vec<Vec<String>>,
}

impl Prolog {
    fn section(&mut self, fragments: Vec<Fragment>) {
        let names = defined_macros(&fragments);
        if !names.is_empty() {
            self.macro_groups.push(names);
        }
        self.fragments.extend(fragments);
    }
}

fn banner(variant: &Variant) -> Vec<Fragment> {
    let title = if variant.is_dagger() {
        "*** CUDA DSLASH DAGGER ***"
    } else {
        "*** CUDA DSLASH ***"
    };
    vec![
        Fragment::comment(title),
        Fragment::Blank,
        Fragment::define(
            "DSLASH_SHARED_FLOATS_PER_THREAD",
            variant.arch.shared_floats().to_string(),
        ),
        Fragment::Blank,
        Fragment::if_expr_else(
            "((CUDA_VERSION >= 4010) && (__COMPUTE_CAPABILITY__ >= 200)) // NVVM compiler",
            vec![Fragment::define("VOLATILE", "")],
            vec![Fragment::define("VOLATILE", "volatile")],
        ),
        Fragment::Blank,
    ]
}

fn includes() -> Vec<Fragment> {
    let mut out: Vec<Fragment> = ["read_gauge.h", "io_spinor.h", "read_clover.h", "tmc_core.h"]
        .into_iter()
        .map(|h| Fragment::Directive(format!("#include \"{h}\"")))
        .collect();
    out.extend([
        Fragment::Blank,
        Fragment::line("int coord[5];"),
        Fragment::line("int X;"),
        Fragment::Blank,
        Fragment::line("int sid;"),
        Fragment::Blank,
    ]);
    out
}

fn thread_index() -> [Fragment; 2] {
    [
        Fragment::line("sid = blockIdx.x*blockDim.x + threadIdx.x;"),
        Fragment::line("if (sid >= param.threads) return;"),
    ]
}

fn interior_site(variant: &Variant) -> Vec<Fragment> {
    let mut out = Vec::new();
    if variant.arch.stages_inputs() {
        out.extend([
            Fragment::comment("Assume even dimensions"),
            Fragment::line("coordsFromIndex3D<EVEN_X>(X, coord, sid, param);"),
            Fragment::Blank,
            Fragment::comment(
                "only need to check Y and Z dims currently since X and T set to match exactly",
            ),
            Fragment::line("if (coord[1] >= param.X[1]) return;"),
            Fragment::line("if (coord[2] >= param.X[2]) return;"),
        ]);
    } else {
        out.extend(thread_index());
        out.extend([
            Fragment::Blank,
            Fragment::comment("Assume even dimensions"),
            Fragment::line("coordsFromIndex<4,QUDA_4D_PC,EVEN_X>(X, coord, sid, param);"),
        ]);
    }
    out.push(Fragment::Blank);
    out.extend(per_component(|s, c| {
        format!(
            "{} = 0;  {} = 0;",
            spinor_out(s, c, Part::Re),
            spinor_out(s, c, Part::Im)
        )
    }));
    out
}

fn exterior_site() -> Vec<Fragment> {
    let mut out = Vec::from(thread_index());
    out.extend([
        Fragment::Blank,
        Fragment::line("const int face_volume = (param.threads >> 1);           // volume of one face"),
        Fragment::line("const int face_num = (sid >= face_volume);              // is this thread updating face 0 or 1"),
        Fragment::line("face_idx = sid - face_num*face_volume;        // index into the respective face"),
        Fragment::Blank,
        Fragment::comment("ghostOffset is scaled to include body (includes stride) and number of FloatN arrays (SPINOR_HOP)"),
        Fragment::comment("face_idx not sid since faces are spin projected and share the same volume index (modulo UP/DOWN reading)"),
        Fragment::line("coordsFromFaceIndex<4,QUDA_4D_PC,kernel_type,1>(X, sid, coord, face_idx, face_num, param);"),
        Fragment::Blank,
        Fragment::line("READ_INTERMEDIATE_SPINOR(INTERTEX, param.sp_stride, sid, sid);"),
        Fragment::Blank,
    ]);
    out.extend(per_component(|s, c| {
        format!(
            "{} = {};  {} = {};",
            spinor_out(s, c, Part::Re),
            spinor_in(s, c, Part::Re),
            spinor_out(s, c, Part::Im),
            spinor_in(s, c, Part::Im)
        )
    }));
    out
}

fn per_component(line: impl Fn(usize, usize) -> String) -> Vec<Fragment> {
    (0..4)
        .flat_map(|s| (0..3).map(move |c| (s, c)))
        .map(|(s, c)| Fragment::line(line(s, c)))
        .collect()
}

/// Site coordinates and output initialization. Interior threads start from
/// zero; exterior threads resume from the interior kernel's partial result.
fn site(variant: &Variant) -> Vec<Fragment> {
    vec![
        Fragment::ifdef("MULTI_GPU", vec![Fragment::line("int face_idx;")]),
        Fragment::GuardedBranch {
            guard: "MULTI_GPU".to_string(),
            cond: "kernel_type == INTERIOR_KERNEL".to_string(),
            then: interior_site(variant),
            otherwise: exterior_site(),
        },
        Fragment::Blank,
        Fragment::Blank,
    ]
}

/// Builds the prolog of `variant`.
///
/// # Errors
///
/// Returns [`GenError::UndefinedProlog`] if the variant is not a dslash
/// kernel.
pub fn prolog(variant: &Variant) -> Result<Prolog, GenError> {
    if !variant.dslash {
        return Err(GenError::UndefinedProlog {
            variant: variant.file_name(),
        });
    }

    let mut p = Prolog {
        fragments: Vec::new(),
        macro_groups: Vec::new(),
    };
    p.section(banner(variant));
    p.section(layout::input_spinor_table(variant));
    p.section(layout::gauge_table());
    p.section(layout::clover_table(variant));
    p.section(layout::output_table(variant));
    p.section(layout::shared_stride_table(variant));
    p.section(layout::shared_base(variant));
    p.section(includes());
    p.section(site(variant));
    Ok(p)
}

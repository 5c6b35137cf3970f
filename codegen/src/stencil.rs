//! Per-direction hopping term.
//!
//! For one of the eight directions this assembles the neighbour gather, the
//! spin projection onto two half-spinor rows, the gauge transport and the
//! reconstruction of the dependent rows, all wrapped in the multi-GPU
//! kernel-type guard.

use log::debug;
use tmc_algebra::{Axis, Direction, Projector, ProjectorSupport, RowRelation, Term, Weight};

use crate::emit::Fragment;
use crate::error::GenError;
use crate::naming::{gauge, projected, spinor_in, spinor_out, transported, LinkForm, Part};
use crate::variant::Variant;

const BOUNDARY: [&str; 8] = [
    "coord[0]==X1m1",
    "coord[0]==0",
    "coord[1]==X2m1",
    "coord[1]==0",
    "coord[2]==X3m1",
    "coord[2]==0",
    "coord[3]==X4m1",
    "coord[3]==0",
];

const INTERIOR: [&str; 8] = [
    "coord[0]<X1m1",
    "coord[0]>0",
    "coord[1]<X2m1",
    "coord[1]>0",
    "coord[2]<X3m1",
    "coord[2]>0",
    "coord[3]<X4m1",
    "coord[3]>0",
];

/// Neighbour index away from the boundary.
const NEIGHBOUR: [&str; 8] = [
    "X+1",
    "X-1",
    "X+X1",
    "X-X1",
    "X+X2X1",
    "X-X2X1",
    "X+X3X2X1",
    "X-X3X2X1",
];

/// Neighbour index across the periodic boundary.
const WRAPPED: [&str; 8] = [
    "X-X1m1",
    "X+X1m1",
    "X-X2X1mX1",
    "X+X2X1mX1",
    "X-X3X2X1mX2X1",
    "X+X3X2X1mX2X1",
    "X-X4X3X2X1mX3X2X1",
    "X+X4X3X2X1mX3X2X1",
];

/// Condition selecting the identity-gauge fast path of temporal hops.
pub const GAUGE_FIXED_CONDITION: &str = "gauge_fixed && ga_idx < X4X3X2X1hmX3X2X1h";

/// `+`, `-`, `+2*` or `-2*`.
fn signed(w: i8) -> &'static str {
    match w {
        1 => "+",
        -1 => "-",
        2 => "+2*",
        _ => "-2*",
    }
}

/// The spinor read matching a projector's support.
#[must_use]
pub fn spinor_read(support: ProjectorSupport) -> &'static str {
    match support {
        ProjectorSupport::LowerOnly => "READ_SPINOR_DOWN",
        ProjectorSupport::UpperOnly => "READ_SPINOR_UP",
        ProjectorSupport::Both => "READ_SPINOR",
    }
}

/// The multi-GPU guard deciding whether this thread handles `direction`.
fn kernel_type_guard(direction: Direction) -> Fragment {
    let d = direction.index();
    let axis = direction.axis();
    Fragment::ifdef(
        "MULTI_GPU",
        vec![
            Fragment::line(format!(
                "if ( (kernel_type == INTERIOR_KERNEL && (!param.ghostDim[{}] || {})) ||",
                axis.index(),
                INTERIOR[d]
            )),
            Fragment::line(format!(
                "     (kernel_type == EXTERIOR_KERNEL_{} && {}) )",
                axis.label(),
                BOUNDARY[d]
            )),
        ],
    )
}

fn projector_dump(projector: &Projector) -> Vec<Fragment> {
    let mut out = vec![Fragment::comment(format!("Projector {}", projector.name()))];
    out.extend(projector.row_literals().iter().map(Fragment::comment));
    out.push(Fragment::Blank);
    out
}

fn neighbour_index(direction: Direction) -> Vec<Fragment> {
    let d = direction.index();
    let hop = format!("({} ? {} : {}) >> 1", BOUNDARY[d], WRAPPED[d], NEIGHBOUR[d]);
    let ghost = (d + 1) % 2;
    vec![
        Fragment::ifdef_else(
            "MULTI_GPU",
            vec![
                Fragment::line(format!(
                    "const int sp_idx = (kernel_type == INTERIOR_KERNEL) ? {hop} :"
                )),
                Fragment::line(format!(
                    "  face_idx + param.ghostOffset[static_cast<int>(kernel_type)][{ghost}];"
                )),
                Fragment::if_expr(
                    "(DD_PREC==2) // half precision",
                    vec![Fragment::line(format!(
                        "const int sp_norm_idx = face_idx + param.ghostNormOffset[static_cast<int>(kernel_type)][{ghost}];"
                    ))],
                ),
            ],
            vec![Fragment::line(format!("const int sp_idx = {hop};"))],
        ),
        Fragment::Blank,
    ]
}

fn gauge_index(direction: Direction) -> Vec<Fragment> {
    let index = if direction.is_forward() {
        Fragment::line("const int ga_idx = sid;")
    } else {
        Fragment::ifdef_else(
            "MULTI_GPU",
            vec![Fragment::line(
                "const int ga_idx = ((kernel_type == INTERIOR_KERNEL) ? sp_idx : Vh+face_idx);",
            )],
            vec![Fragment::line("const int ga_idx = sp_idx;")],
        )
    };
    vec![index, Fragment::Blank]
}

fn declare_halves() -> Vec<Fragment> {
    let mut out = Vec::new();
    for half in 0..2 {
        for c in 0..3 {
            out.push(Fragment::line(format!(
                "spinorFloat {}, {};",
                projected(half, c, Part::Re),
                projected(half, c, Part::Im)
            )));
        }
    }
    out.push(Fragment::Blank);
    out
}

fn load_spinor(support: ProjectorSupport) -> Vec<Fragment> {
    vec![
        Fragment::comment("read spinor from device memory"),
        Fragment::line(format!(
            "{}(SPINORTEX, param.sp_stride, sp_idx, sp_idx);",
            spinor_read(support)
        )),
        Fragment::Blank,
    ]
}

/// `a = P·i` for both half rows, one assignment per real scalar.
fn project(projector: &Projector) -> Result<Vec<Fragment>, GenError> {
    let mut out = vec![Fragment::comment("project spinor into half spinors")];
    for half in 0..2 {
        let terms = projector.half_terms(half)?;
        for c in 0..3 {
            let (re, im) = projected_sums(&terms, c);
            out.push(Fragment::line(format!("{} = {re};", projected(half, c, Part::Re))));
            out.push(Fragment::line(format!("{} = {im};", projected(half, c, Part::Im))));
        }
    }
    Ok(out)
}

fn projected_sums(terms: &[Term], color: usize) -> (String, String) {
    let mut re = String::new();
    let mut im = String::new();
    for term in terms {
        let s = term.spin;
        match term.weight {
            Weight::Real(w) => {
                re += &format!("{}{}", signed(w), spinor_in(s, color, Part::Re));
                im += &format!("{}{}", signed(w), spinor_in(s, color, Part::Im));
            }
            Weight::Imaginary(w) => {
                re += &format!("{}{}", signed(-w), spinor_in(s, color, Part::Im));
                im += &format!("{}{}", signed(w), spinor_in(s, color, Part::Re));
            }
        }
    }
    (re, im)
}

/// How a staging architecture obtains the neighbour spinor for an interior
/// hop.
enum Staging {
    /// Read from global memory and publish to shared memory.
    Publish,
    /// Always read the neighbour's published copy.
    Shared { lines: [&'static str; 2] },
    /// Read from global memory at the block edge, else from shared memory.
    Edge {
        cond: &'static str,
        lines: [&'static str; 3],
    },
    /// Not staged.
    Global,
}

fn staging(direction: Direction) -> Staging {
    match direction.index() {
        0 => Staging::Publish,
        1 => Staging::Shared {
            lines: [
                "int tx = (threadIdx.x > 0) ? threadIdx.x-1 : blockDim.x-1;",
                "__syncthreads();",
            ],
        },
        2 => Staging::Edge {
            cond: "threadIdx.y == blockDim.y-1 && blockDim.y < X2",
            lines: [
                "int tx = (threadIdx.x + blockDim.x - ((coord[0]+1)&1) ) % blockDim.x;",
                "int ty = (threadIdx.y < blockDim.y - 1) ? threadIdx.y + 1 : 0;",
                "READ_SPINOR_SHARED(tx, ty, threadIdx.z);",
            ],
        },
        3 => Staging::Edge {
            cond: "threadIdx.y == 0 && blockDim.y < X2",
            lines: [
                "int tx = (threadIdx.x + blockDim.x - ((coord[0]+1)&1)) % blockDim.x;",
                "int ty = (threadIdx.y > 0) ? threadIdx.y - 1 : blockDim.y - 1;",
                "READ_SPINOR_SHARED(tx, ty, threadIdx.z);",
            ],
        },
        4 => Staging::Edge {
            cond: "threadIdx.z == blockDim.z-1 && blockDim.z < X3",
            lines: [
                "int tx = (threadIdx.x + blockDim.x - ((coord[0]+1)&1) ) % blockDim.x;",
                "int tz = (threadIdx.z < blockDim.z - 1) ? threadIdx.z + 1 : 0;",
                "READ_SPINOR_SHARED(tx, threadIdx.y, tz);",
            ],
        },
        5 => Staging::Edge {
            cond: "threadIdx.z == 0 && blockDim.z < X3",
            lines: [
                "int tx = (threadIdx.x + blockDim.x - ((coord[0]+1)&1)) % blockDim.x;",
                "int tz = (threadIdx.z > 0) ? threadIdx.z - 1 : blockDim.z - 1;",
                "READ_SPINOR_SHARED(tx, threadIdx.y, tz);",
            ],
        },
        _ => Staging::Global,
    }
}

fn from_shared(lines: &[&str]) -> Vec<Fragment> {
    let mut out = vec![Fragment::comment("load spinor from shared memory")];
    out.extend(lines.iter().map(|l| Fragment::line(*l)));
    out.push(Fragment::Blank);
    out
}

/// Gather and project for an interior hop.
fn interior_prep(
    variant: &Variant,
    direction: Direction,
    support: ProjectorSupport,
    projection: Vec<Fragment>,
) -> Vec<Fragment> {
    let global = load_spinor(support);
    let staging = if variant.arch.stages_inputs() {
        staging(direction)
    } else {
        Staging::Global
    };

    match staging {
        Staging::Global => [global, projection].concat(),
        Staging::Publish => {
            let publish = vec![
                Fragment::comment("store spinor into shared memory"),
                Fragment::line("WRITE_SPINOR_SHARED(threadIdx.x, threadIdx.y, threadIdx.z, i);"),
                Fragment::Blank,
            ];
            [global, publish, projection].concat()
        }
        Staging::Shared { lines } => {
            let mut read = from_shared(&lines);
            read.insert(
                read.len() - 1,
                Fragment::line("READ_SPINOR_SHARED(tx, threadIdx.y, threadIdx.z);"),
            );
            [read, projection].concat()
        }
        Staging::Edge { cond, lines } => vec![Fragment::If {
            cond: cond.to_string(),
            then: [global, projection.clone()].concat(),
            otherwise: Some([from_shared(&lines), projection].concat()),
        }],
    }
}

/// Ghost half-spinor read for an exterior hop. Temporal ghosts carry the
/// projection scale that was left out when the face was packed.
fn exterior_prep(direction: Direction) -> Vec<Fragment> {
    let temporal = direction.axis() == Axis::T;
    let mut out = vec![Fragment::line(
        "const int sp_stride_pad = ghostFace[static_cast<int>(kernel_type)];",
    )];
    if temporal {
        out.push(Fragment::line("const int t_proj_scale = TPROJSCALE;"));
    }
    out.push(Fragment::Blank);
    out.push(Fragment::comment("read half spinor from device memory"));
    out.push(Fragment::line(
        "READ_HALF_SPINOR(GHOSTSPINORTEX, sp_stride_pad, sp_idx, sp_norm_idx);",
    ));
    out.push(Fragment::Blank);

    let scale = if temporal { "t_proj_scale*" } else { "" };
    for half in 0..2 {
        for c in 0..3 {
            out.push(Fragment::line(format!(
                "{} = {scale}{};  {} = {scale}{};",
                projected(half, c, Part::Re),
                spinor_in(half, c, Part::Re),
                projected(half, c, Part::Im),
                spinor_in(half, c, Part::Im),
            )));
        }
    }
    out.push(Fragment::Blank);
    out
}

fn prepare_halves(
    variant: &Variant,
    direction: Direction,
    projector: &Projector,
) -> Result<Vec<Fragment>, GenError> {
    let support = projector.support();
    let projection = project(projector)?;
    let mut interior = interior_prep(variant, direction, support, projection);
    interior.push(Fragment::Blank);
    Ok(vec![
        Fragment::GuardedBranch {
            guard: "MULTI_GPU".to_string(),
            cond: "kernel_type == INTERIOR_KERNEL".to_string(),
            then: interior,
            otherwise: exterior_prep(direction),
        },
        Fragment::Blank,
    ])
}

fn load_gauge(direction: Direction) -> Vec<Fragment> {
    let d = direction.index();
    vec![
        Fragment::comment("read gauge matrix from device memory"),
        Fragment::line(format!(
            "READ_GAUGE_MATRIX(G, GAUGE{}TEX, {d}, ga_idx, ga_stride);",
            d % 2
        )),
        Fragment::Blank,
        Fragment::comment("reconstruct gauge matrix"),
        Fragment::line(format!("RECONSTRUCT_GAUGE_MATRIX({d});")),
        Fragment::Blank,
    ]
}

/// `A = U·a` (or `U†·a` for backward hops), fully unrolled.
fn multiply(direction: Direction) -> Vec<Fragment> {
    let form = LinkForm::for_direction(direction);
    let mut out = Vec::new();
    for m in 0..3 {
        out.push(Fragment::comment(format!("multiply row {m}")));
        for half in 0..2 {
            let re = transported(half, m, Part::Re);
            let im = transported(half, m, Part::Im);
            out.push(Fragment::line(format!("spinorFloat {re} = 0;")));
            for c in 0..3 {
                let (g_re, g_im) = (gauge(form, m, c, Part::Re), gauge(form, m, c, Part::Im));
                let (a_re, a_im) = (projected(half, c, Part::Re), projected(half, c, Part::Im));
                out.push(Fragment::line(format!("{re} += {g_re} * {a_re};")));
                out.push(Fragment::line(format!("{re} -= {g_im} * {a_im};")));
            }
            out.push(Fragment::line(format!("spinorFloat {im} = 0;")));
            for c in 0..3 {
                let (g_re, g_im) = (gauge(form, m, c, Part::Re), gauge(form, m, c, Part::Im));
                let (a_re, a_im) = (projected(half, c, Part::Re), projected(half, c, Part::Im));
                out.push(Fragment::line(format!("{im} += {g_re} * {a_im};")));
                out.push(Fragment::line(format!("{im} += {g_im} * {a_re};")));
            }
        }
        out.push(Fragment::Blank);
    }
    out
}

fn identity_gauge() -> Vec<Fragment> {
    let mut out = vec![Fragment::comment("identity gauge matrix")];
    for m in 0..3 {
        for half in 0..2 {
            out.push(Fragment::line(format!(
                "spinorFloat {} = {}; spinorFloat {} = {};",
                transported(half, m, Part::Re),
                projected(half, m, Part::Re),
                transported(half, m, Part::Im),
                projected(half, m, Part::Im),
            )));
        }
    }
    out.push(Fragment::Blank);
    out
}

/// Accumulates the transported rows into the output, deriving rows 2 and 3
/// from their relation to rows 0 and 1.
fn reconstruct(projector: &Projector) -> Result<Vec<Fragment>, GenError> {
    let lower_only = projector.support() == ProjectorSupport::LowerOnly;
    let relations: Vec<RowRelation> = [2, 3]
        .into_iter()
        .map(|row| projector.row_relation(row))
        .collect::<Result<_, _>>()?;

    let mut out = Vec::new();
    for m in 0..3 {
        for half in 0..2 {
            let target = if lower_only { half + 2 } else { half };
            for part in Part::BOTH {
                out.push(Fragment::line(format!(
                    "{} += {};",
                    spinor_out(target, m, part),
                    transported(half, m, part)
                )));
            }
        }
        for rel in &relations {
            let Some(weight) = Weight::from_coefficient(rel.scale)? else {
                continue;
            };
            let (o_re, o_im) = (spinor_out(rel.row, m, Part::Re), spinor_out(rel.row, m, Part::Im));
            let (t_re, t_im) = (
                transported(rel.source, m, Part::Re),
                transported(rel.source, m, Part::Im),
            );
            match weight {
                Weight::Real(w) => {
                    out.push(Fragment::line(format!("{o_re} {}= {t_re};", signed(w))));
                    out.push(Fragment::line(format!("{o_im} {}= {t_im};", signed(w))));
                }
                Weight::Imaginary(w) => {
                    out.push(Fragment::line(format!("{o_re} {}= {t_im};", signed(-w))));
                    out.push(Fragment::line(format!("{o_im} {}= {t_re};", signed(w))));
                }
            }
        }
        out.push(Fragment::Blank);
    }
    Ok(out)
}

/// The complete hopping term for `direction`.
///
/// # Errors
///
/// Returns [`GenError::Algebra`] if the applied projector cannot be reduced
/// to row relations or carries a weight outside {±1, ±2, ±i, ±2i}.
pub fn direction_fragment(variant: &Variant, direction: Direction) -> Result<Vec<Fragment>, GenError> {
    let projector = Projector::applied(direction, variant.adjoint);
    let support = projector.support();
    debug!(
        "{}: direction {} uses {} ({support:?})",
        variant.file_name(),
        direction.index(),
        projector.name()
    );

    let mut body = projector_dump(&projector);
    body.extend(neighbour_index(direction));
    body.extend(gauge_index(direction));

    let prep = [declare_halves(), prepare_halves(variant, direction, &projector)?].concat();
    let accumulate = reconstruct(&projector)?;

    if direction.is_temporal() {
        body.push(Fragment::If {
            cond: GAUGE_FIXED_CONDITION.to_string(),
            then: [prep.clone(), identity_gauge(), accumulate.clone()].concat(),
            otherwise: Some([prep, load_gauge(direction), multiply(direction), accumulate].concat()),
        });
    } else {
        body.extend(prep);
        body.extend(load_gauge(direction));
        body.extend(multiply(direction));
        body.extend(accumulate);
    }

    Ok(vec![
        kernel_type_guard(direction),
        Fragment::Scope(body),
        Fragment::Blank,
        Fragment::Blank,
    ])
}
